//! Chapter Composer
//!
//! Writes one chapter for one abstraction. Chapter k sees the summaries of
//! chapters 1..k as "already covered" context, so composition order matters.

use std::fmt::Write;
use tracing::{info, instrument};

use super::helpers::{Generated, StageCall, run_stage};
use crate::ai::{SharedProvider, strip_wrapping_fence};
use crate::constants::context::{CHAPTER_FILE_CHARS, CHAPTER_TRUNCATION_MARKER};
use crate::constants::prompts;
use crate::types::{Abstraction, Chapter, ChapterSummary, Corpus, Result, TutorError, truncate_chars};

const PRIOR_CHAPTERS_HEADER: &str = "PREVIOUSLY COVERED CONCEPTS (for reference, don't repeat):";

pub struct ChapterComposer {
    provider: SharedProvider,
}

impl ChapterComposer {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, fields(chapter = number, abstraction = %abstraction.name))]
    pub async fn compose(
        &self,
        abstraction: &Abstraction,
        corpus: &Corpus,
        prior: &[ChapterSummary],
        project_name: &str,
        number: usize,
    ) -> Result<Generated<Chapter>> {
        if abstraction.name.trim().is_empty() {
            return Err(TutorError::InputValidation(
                "abstraction name is required".to_string(),
            ));
        }

        let label = format!("chapter {number}");
        let call = StageCall {
            label: &label,
            prompt: build_prompt(abstraction, corpus, prior, project_name),
            system: prompts::CHAPTER_WRITER,
        };

        let generated = run_stage(&self.provider, call, |raw| {
            Ok(Chapter {
                number,
                title: abstraction.name.clone(),
                content: strip_wrapping_fence(raw),
            })
        })
        .await?;

        info!(
            "Chapter {}: {} ({} chars)",
            number,
            abstraction.name,
            generated.value.content.len()
        );
        Ok(generated)
    }
}

pub fn build_prompt(
    abstraction: &Abstraction,
    corpus: &Corpus,
    prior: &[ChapterSummary],
    project_name: &str,
) -> String {
    let mut files = String::from("Related code files:\n\n");
    for file in corpus.select(&abstraction.file_indices) {
        let content = truncate_chars(&file.content, CHAPTER_FILE_CHARS, CHAPTER_TRUNCATION_MARKER);
        let _ = write!(files, "### File: {}\n```\n{}\n```\n\n", file.path, content);
    }

    let mut covered = String::new();
    if !prior.is_empty() {
        let _ = writeln!(covered, "{PRIOR_CHAPTERS_HEADER}");
        for summary in prior {
            let _ = writeln!(covered, "- {}: {}", summary.name, summary.summary);
        }
    }

    let name = &abstraction.name;
    let description = &abstraction.description;

    format!(
        r#"You are writing one chapter of a tutorial for the "{project_name}" project.

AUDIENCE: developers who are new to this codebase and want to get productive quickly.

ABSTRACTION TO EXPLAIN:
Name: {name}
Description: {description}

{files}
{covered}
Write a beginner-friendly chapter about this abstraction:
1. use clear, simple language
2. include code examples taken from the files above
3. use analogies where they help
4. explain why the abstraction exists, not only what it does
5. break complex ideas into small steps

Use exactly this markdown structure:
# {name}

[Short introduction: what is this and why does it matter?]

## What It Does

[The purpose of the abstraction]

## Key Code

[Relevant snippets with explanations]

## How It Works

[Step-by-step walkthrough of the mechanism]

## Key Takeaways

- [Point 1]
- [Point 2]
- [Point 3]

Return only the markdown, without commentary and without wrapping it in a code fence.
"#
    )
}

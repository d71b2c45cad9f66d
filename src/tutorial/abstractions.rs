//! Abstraction Extractor
//!
//! Corpus → bounded list of named concepts, each anchored to corpus files.

use serde::Deserialize;
use std::fmt::Write;
use tracing::{info, instrument, warn};

use super::helpers::{Generated, StageCall, run_stage};
use crate::ai::{IndexRef, SharedProvider, parse_structured, resolve_index};
use crate::constants::context::{ABSTRACTION_FILE_CHARS, ABSTRACTION_TRUNCATION_MARKER};
use crate::constants::prompts;
use crate::types::{Abstraction, Corpus, Result, TutorError, truncate_chars};

#[derive(Debug, Deserialize)]
struct RawAbstraction {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    files: Vec<IndexRef>,
}

pub struct AbstractionExtractor {
    provider: SharedProvider,
}

impl AbstractionExtractor {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, fields(files = corpus.len(), max = max_abstractions))]
    pub async fn extract(
        &self,
        corpus: &Corpus,
        project_name: &str,
        max_abstractions: usize,
    ) -> Result<Generated<Vec<Abstraction>>> {
        if corpus.is_empty() {
            return Err(TutorError::InputValidation(
                "no files provided".to_string(),
            ));
        }

        let call = StageCall {
            label: "abstractions",
            prompt: build_prompt(corpus, project_name),
            system: prompts::ANALYST,
        };

        let generated = run_stage(&self.provider, call, |raw| {
            parse_response(raw, corpus.len(), max_abstractions)
        })
        .await?;

        info!("Identified {} abstractions", generated.value.len());
        Ok(generated)
    }
}

pub fn build_prompt(corpus: &Corpus, project_name: &str) -> String {
    let mut files = String::new();
    let mut listing = String::new();

    for file in corpus.files() {
        let sample = truncate_chars(
            &file.content,
            ABSTRACTION_FILE_CHARS,
            ABSTRACTION_TRUNCATION_MARKER,
        );
        let _ = writeln!(files, "--- File Index {}: {} ---\n{}\n", file.index, file.path, sample);
        let _ = writeln!(listing, "- {} # {}", file.index, file.path);
    }

    format!(
        r#"You are analyzing the codebase of the project "{project_name}".

FILES:
{files}
FILE LISTING (for reference):
{listing}
Identify the core abstractions of this codebase: the handful of concepts a
newcomer must understand first.

For each abstraction give:
- name: a short, clear name
- description: a beginner-friendly explanation in one or two sentences
- files: the INDICES of the related files from the listing above

Answer with YAML only:
```yaml
- name: "CoreConcept"
  description: "What this concept represents and why it matters"
  files: [0, 3]
- name: "AnotherConcept"
  description: "Another key concept"
  files: [1, 2]
```
"#
    )
}

/// Validate the generator's abstraction list against the corpus
///
/// Excess entries beyond `max_abstractions` are dropped before file
/// references are checked. Indices are reassigned by position.
pub fn parse_response(
    raw: &str,
    corpus_len: usize,
    max_abstractions: usize,
) -> Result<Vec<Abstraction>> {
    let mut entries: Vec<RawAbstraction> = parse_structured(raw, "abstraction list")?;

    if entries.is_empty() {
        return Err(TutorError::InputValidation(
            "no abstractions identified".to_string(),
        ));
    }

    if entries.len() > max_abstractions {
        warn!(
            "Generator returned {} abstractions, keeping the first {}",
            entries.len(),
            max_abstractions
        );
        entries.truncate(max_abstractions);
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if entry.name.trim().is_empty() {
                return Err(TutorError::InputValidation(format!(
                    "abstraction {} has an empty name",
                    index
                )));
            }

            let context = format!("abstraction '{}'", entry.name);
            let file_indices = entry
                .files
                .iter()
                .map(|r| resolve_index(r, corpus_len, &context))
                .collect::<Result<Vec<_>>>()?;

            Ok(Abstraction {
                index,
                name: entry.name,
                description: entry.description,
                file_indices,
            })
        })
        .collect()
}

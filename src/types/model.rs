//! Tutorial data model
//!
//! Everything downstream of the corpus refers to files and abstractions by
//! index. Indices are always positions in the owning list, so a value that
//! passed validation can be used to index directly.

use serde::{Deserialize, Serialize};

use crate::constants::context::{SUMMARY_CHARS, SUMMARY_TRUNCATION_MARKER};
use crate::types::utils::truncate_chars;

// =============================================================================
// Corpus
// =============================================================================

/// One file of the analyzed repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub index: usize,
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    pub content: String,
}

/// Ordered, immutable set of source files for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    files: Vec<SourceFile>,
}

impl Corpus {
    /// Build from `(path, content)` pairs; indices follow input order.
    pub fn from_entries<I, P, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let files = entries
            .into_iter()
            .enumerate()
            .map(|(index, (path, content))| SourceFile {
                index,
                path: path.into(),
                content: content.into(),
            })
            .collect();
        Self { files }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn get(&self, index: usize) -> Option<&SourceFile> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files referenced by `indices`, skipping any that do not exist
    pub fn select<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a SourceFile> {
        indices.iter().filter_map(|&i| self.files.get(i))
    }
}

// =============================================================================
// Abstractions & Relationships
// =============================================================================

/// A named concept anchored to a set of corpus files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abstraction {
    /// Position in the abstraction list
    pub index: usize,
    pub name: String,
    pub description: String,
    pub file_indices: Vec<usize>,
}

/// Directed labeled edge between two abstractions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: usize,
    pub to: usize,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub summary: String,
    pub edges: Vec<Relationship>,
}

// =============================================================================
// Chapters
// =============================================================================

/// Teaching order: a permutation of every abstraction index
///
/// Only constructed by the sequencer after its completeness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterPlan(Vec<usize>);

impl ChapterPlan {
    pub(crate) fn new_unchecked(order: Vec<usize>) -> Self {
        Self(order)
    }

    pub fn order(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based position in the tutorial
    pub number: usize,
    pub title: String,
    pub content: String,
}

/// Lossy projection of a finished chapter, used as continuity context only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub name: String,
    pub summary: String,
}

impl ChapterSummary {
    pub fn from_chapter(chapter: &Chapter) -> Self {
        let summary = truncate_chars(&chapter.content, SUMMARY_CHARS, SUMMARY_TRUNCATION_MARKER)
            .replace('#', "")
            .trim()
            .to_string();

        Self {
            name: chapter.title.clone(),
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_indices_follow_input_order() {
        let corpus = Corpus::from_entries([("a.rs", "fn a() {}"), ("b.rs", "fn b() {}")]);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(1).unwrap().path, "b.rs");
        assert_eq!(corpus.get(1).unwrap().index, 1);
        assert!(corpus.get(2).is_none());
    }

    #[test]
    fn test_corpus_select_skips_missing() {
        let corpus = Corpus::from_entries([("a.rs", ""), ("b.rs", "")]);
        let indices = [1, 5, 0];
        let paths: Vec<_> = corpus.select(&indices).map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b.rs", "a.rs"]);
    }

    #[test]
    fn test_summary_strips_headings() {
        let chapter = Chapter {
            number: 1,
            title: "Parser".to_string(),
            content: "# Parser\n\n## What It Does\nTurns tokens into trees.".to_string(),
        };

        let summary = ChapterSummary::from_chapter(&chapter);
        assert_eq!(summary.name, "Parser");
        assert!(!summary.summary.contains('#'));
        assert!(summary.summary.starts_with("Parser"));
        assert!(!summary.summary.ends_with("..."));
    }

    #[test]
    fn test_summary_truncates_long_content() {
        let chapter = Chapter {
            number: 2,
            title: "Lexer".to_string(),
            content: "x".repeat(500),
        };

        let summary = ChapterSummary::from_chapter(&chapter);
        assert_eq!(summary.summary.len(), SUMMARY_CHARS + 3);
        assert!(summary.summary.ends_with("..."));
    }
}

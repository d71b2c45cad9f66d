//! Chapter emission
//!
//! The pipeline hands finished chapters to a [`ChapterSink`] only after every
//! chapter composed successfully.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::{Chapter, Result};

/// Destination for a finished tutorial
#[async_trait]
pub trait ChapterSink: Send + Sync {
    /// Write chapters in order, returning where each one went
    async fn emit(&self, chapters: &[Chapter]) -> Result<Vec<PathBuf>>;
}

/// Writes `NN_<title>.md` files into one directory
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    output_dir: PathBuf,
}

impl MarkdownWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `01_node_abstraction.md` for chapter 1 titled "Node Abstraction!"
    pub fn file_name(sequence: usize, title: &str) -> String {
        let stem = sanitize_filename(title);
        let stem = if stem.is_empty() { "chapter" } else { stem.as_str() };
        format!("{:02}_{}.md", sequence, stem)
    }
}

#[async_trait]
impl ChapterSink for MarkdownWriter {
    async fn emit(&self, chapters: &[Chapter]) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut written = Vec::with_capacity(chapters.len());
        for (position, chapter) in chapters.iter().enumerate() {
            let path = self
                .output_dir
                .join(Self::file_name(position + 1, &chapter.title));
            if let Err(e) = tokio::fs::write(&path, &chapter.content).await {
                remove_partial(&written).await;
                return Err(e.into());
            }
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        info!(
            "Wrote {} chapters to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }
}

/// A failed emission leaves no chapter files behind
async fn remove_partial(written: &[PathBuf]) {
    for path in written {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Could not remove partial chapter {}: {}", path.display(), e);
        }
    }
}

/// Lowercase, map everything outside `[a-z0-9]` to `_`, collapse runs of
/// `_` and trim them from both ends.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_filename("Node Abstraction!"), "node_abstraction");
        assert_eq!(sanitize_filename("__A--B__"), "a_b");
        assert_eq!(sanitize_filename("HTTP/2 Server"), "http_2_server");
        assert_eq!(sanitize_filename("Café"), "caf");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(MarkdownWriter::file_name(1, "Node Abstraction!"), "01_node_abstraction.md");
        assert_eq!(MarkdownWriter::file_name(12, "Lexer"), "12_lexer.md");
        assert_eq!(MarkdownWriter::file_name(3, "!!!"), "03_chapter.md");
    }

    #[tokio::test]
    async fn test_emit_creates_directory_and_files() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested/tutorial");
        let writer = MarkdownWriter::new(&output);

        let chapters = vec![
            Chapter {
                number: 1,
                title: "Parser".into(),
                content: "# Parser".into(),
            },
            Chapter {
                number: 2,
                title: "Lexer".into(),
                content: "# Lexer".into(),
            },
        ];

        let written = writer.emit(&chapters).await.unwrap();
        assert_eq!(
            written,
            vec![output.join("01_parser.md"), output.join("02_lexer.md")]
        );
        assert_eq!(
            std::fs::read_to_string(&written[1]).unwrap(),
            "# Lexer"
        );
    }

    #[tokio::test]
    async fn test_failed_write_removes_earlier_chapters() {
        let dir = TempDir::new().unwrap();
        let writer = MarkdownWriter::new(dir.path());
        // A directory at the second chapter's path makes its write fail
        std::fs::create_dir(dir.path().join("02_lexer.md")).unwrap();

        let chapters = vec![
            Chapter {
                number: 1,
                title: "Parser".into(),
                content: "# Parser".into(),
            },
            Chapter {
                number: 2,
                title: "Lexer".into(),
                content: "# Lexer".into(),
            },
            Chapter {
                number: 3,
                title: "Emitter".into(),
                content: "# Emitter".into(),
            },
        ];

        assert!(writer.emit(&chapters).await.is_err());
        assert!(!dir.path().join("01_parser.md").exists());
        assert!(!dir.path().join("03_emitter.md").exists());
    }

    proptest! {
        #[test]
        fn sanitized_names_are_clean(name in "\\PC{0,40}") {
            let clean = sanitize_filename(&name);
            prop_assert!(clean.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!clean.contains("__"));
            prop_assert!(!clean.starts_with('_') && !clean.ends_with('_'));
        }

        #[test]
        fn sanitizing_is_idempotent(name in "[A-Za-z0-9 _!-]{0,30}") {
            let once = sanitize_filename(&name);
            prop_assert_eq!(sanitize_filename(&once), once.clone());
        }
    }
}

use ignore::{DirEntry, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::corpus::{
    DEFAULT_EXCLUDE, DEFAULT_INCLUDE, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES,
};
use crate::types::{Corpus, Result, TutorError};

/// Source of the indexed corpus for a run
pub trait CorpusProvider: Send + Sync {
    /// Ordered `(path, content)` list; fails on an empty or unreadable root
    fn load_corpus(&self) -> Result<Corpus>;
}

/// Directory walker producing the run corpus
///
/// Patterns are matched against the `/`-separated path relative to the
/// root, with `*` crossing directory boundaries (so `*.go` matches
/// `cmd/main.go` and `vendor/*` excludes the whole tree). Excludes win over
/// includes; an empty include list admits every file.
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
    max_file_size: u64,
    max_files: usize,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            include: DEFAULT_INCLUDE.iter().map(|p| p.to_string()).collect(),
            exclude: DEFAULT_EXCLUDE.iter().map(|p| p.to_string()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Stop walking after this many files (0 = unlimited)
    pub fn with_max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if self.root.as_os_str().is_empty() {
            return Err(TutorError::InputValidation(
                "repository path is required".to_string(),
            ));
        }

        let metadata = std::fs::metadata(&self.root)?;
        if !metadata.is_dir() {
            return Err(TutorError::InputValidation(format!(
                "repository path is not a directory: {}",
                self.root.display()
            )));
        }

        let include = compile_patterns(&self.include, "include")?;
        let exclude = compile_patterns(&self.exclude, "exclude")?;

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();

        for entry in walker.filter_map(usable_entry) {
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Some(relative) = relative_path(&self.root, path) else {
                continue;
            };

            if exclude.iter().any(|p| p.matches(&relative)) {
                continue;
            }

            if !include.is_empty() && !include.iter().any(|p| p.matches(&relative)) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %relative, "Skipping file without metadata: {}", e);
                    continue;
                }
            };
            if self.max_file_size > 0 && metadata.len() > self.max_file_size {
                debug!(path = %relative, size = metadata.len(), "Skipping oversized file");
                continue;
            }

            if self.max_files > 0 && files.len() >= self.max_files {
                debug!(max_files = self.max_files, "File limit reached, stopping walk");
                break;
            }

            match std::fs::read(path) {
                Ok(bytes) => files.push(ScannedFile {
                    path: relative,
                    size: metadata.len(),
                    content: String::from_utf8_lossy(&bytes).into_owned(),
                }),
                Err(e) => warn!(path = %relative, "Skipping unreadable file: {}", e),
            }
        }

        Ok(files)
    }
}

impl CorpusProvider for FileScanner {
    fn load_corpus(&self) -> Result<Corpus> {
        let files = self.scan()?;
        let bytes: u64 = files.iter().map(|f| f.size).sum();
        debug!(files = files.len(), bytes, "Corpus collected");
        Ok(Corpus::from_entries(
            files.into_iter().map(|f| (f.path, f.content)),
        ))
    }
}

/// Walk entries that could not be read are logged and dropped
fn usable_entry(entry: std::result::Result<DirEntry, ignore::Error>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Skipping unreadable entry: {}", e);
            None
        }
    }
}

fn compile_patterns(patterns: &[String], kind: &str) -> Result<Vec<glob::Pattern>> {
    patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| {
                TutorError::InputValidation(format!("invalid {} pattern {}: {}", kind, p, e))
            })
        })
        .collect()
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Relative, `/`-separated
    pub path: String,
    pub size: u64,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", "package main");
        write(dir.path(), "main_test.go", "package main // test");
        write(dir.path(), "cmd/server/server.go", "package server");
        write(dir.path(), "vendor/lib/lib.go", "package lib");
        write(dir.path(), "web/app.min.js", "minified");
        write(dir.path(), "web/app.js", "console.log(1)");
        write(dir.path(), "README.md", "# Demo");
        write(dir.path(), "data.bin", "\x00\x01");
        dir
    }

    #[test]
    fn test_default_patterns() {
        let dir = sample_repo();
        let files = FileScanner::new(dir.path()).scan().unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(
            paths,
            vec!["README.md", "cmd/server/server.go", "main.go", "web/app.js"]
        );
    }

    #[test]
    fn test_corpus_indices_and_content() {
        let dir = sample_repo();
        let corpus = FileScanner::new(dir.path()).load_corpus().unwrap();

        assert_eq!(corpus.len(), 4);
        let main = corpus.get(2).unwrap();
        assert_eq!(main.index, 2);
        assert_eq!(main.path, "main.go");
        assert_eq!(main.content, "package main");
    }

    #[test]
    fn test_max_files_stops_walk() {
        let dir = sample_repo();
        let files = FileScanner::new(dir.path()).with_max_files(2).scan().unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_max_file_size() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "small.rs", "fn a() {}");
        write(dir.path(), "big.rs", &"x".repeat(2048));

        let files = FileScanner::new(dir.path())
            .with_max_file_size(1024)
            .scan()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "small.rs");
    }

    #[test]
    fn test_empty_include_admits_everything() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "hello");
        write(dir.path(), "Makefile", "all:");

        let files = FileScanner::new(dir.path())
            .with_include(vec![])
            .with_exclude(vec![])
            .scan()
            .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_empty_root_rejected() {
        let err = FileScanner::new("").scan().unwrap_err();
        assert!(matches!(err, TutorError::InputValidation(_)));
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FileScanner::new(dir.path().join("nope")).scan().unwrap_err();
        assert!(matches!(err, TutorError::Io(_)));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let dir = TempDir::new().unwrap();
        let err = FileScanner::new(dir.path())
            .with_include(vec!["[".to_string()])
            .scan()
            .unwrap_err();
        assert!(matches!(err, TutorError::InputValidation(_)));
    }

    #[test]
    fn test_walk_errors_are_dropped() {
        let err = ignore::Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(usable_entry(Err(err)).is_none());
    }

    #[test]
    fn test_scanned_sizes_match_content() {
        let dir = sample_repo();
        let files = FileScanner::new(dir.path()).scan().unwrap();

        assert!(files.iter().all(|f| f.size == f.content.len() as u64));
    }
}

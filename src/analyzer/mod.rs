//! Repository Analyzer Module
//!
//! Builds the indexed corpus a tutorial run works from.

pub mod scanner;

pub use scanner::{CorpusProvider, FileScanner};

//! codetutor - Beginner Tutorials Generated From Source Code
//!
//! Reads a repository, asks a text generator to identify its core
//! abstractions and how they relate, picks a teaching order, and writes one
//! markdown chapter per abstraction.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use codetutor::{FileScanner, MarkdownWriter, PipelineOptions, TutorialPipeline};
//! use codetutor::ai::{ProviderConfig, create_provider};
//!
//! let provider = create_provider(&ProviderConfig::default())?;
//! let pipeline = TutorialPipeline::new(
//!     provider,
//!     Arc::new(FileScanner::new("path/to/repo")),
//!     Arc::new(MarkdownWriter::new("tutorial")),
//!     PipelineOptions::new("repo"),
//! );
//! let output = pipeline.run().await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: generator backends, structured-response and reference validation
//! - [`analyzer`]: corpus collection from a repository
//! - [`config`]: layered configuration
//! - [`tutorial`]: the staged pipeline, checkpoints and chapter emission

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod tutorial;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::{FailureKind, Result, TutorError};

pub use ai::{LlmProvider, LlmResponse, SharedProvider, create_provider};
pub use analyzer::{CorpusProvider, FileScanner};
pub use tutorial::{
    ChapterSink, MarkdownWriter, PipelineCheckpoint, PipelineOptions, PipelineStage,
    PipelineState, TutorialOutput, TutorialPipeline,
};

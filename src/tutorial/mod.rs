//! Tutorial Generation Pipeline
//!
//! Turns a source corpus into an ordered set of beginner chapters:
//!
//! 1. **Abstractions**: name the core concepts, anchored to files
//! 2. **Relationships**: directed labeled graph plus a project summary
//! 3. **Sequence**: a teaching order covering every abstraction once
//! 4. **Chapters**: one chapter per abstraction, composed in order
//! 5. **Emission**: numbered markdown files, only after all chapters succeed
//!
//! Each stage makes one generator call and validates the structured answer
//! before the next stage starts. [`PipelineCheckpoint`] records every
//! validated output so a failed run can be replayed from where it stopped.

pub mod abstractions;
pub mod chapters;
pub mod checkpoint;
pub mod emit;
pub mod helpers;
pub mod ordering;
pub mod pipeline;
pub mod relationships;

#[cfg(test)]
pub(crate) mod testing;

pub use abstractions::AbstractionExtractor;
pub use chapters::ChapterComposer;
pub use checkpoint::{PipelineCheckpoint, PipelineStage, PipelineState};
pub use emit::{ChapterSink, MarkdownWriter, sanitize_filename};
pub use helpers::Generated;
pub use ordering::Sequencer;
pub use pipeline::{PipelineOptions, TutorialOutput, TutorialPipeline, derive_project_name};
pub use relationships::RelationshipExtractor;

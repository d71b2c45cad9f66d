//! AI Response Validation
//!
//! Turns semi-structured generator output into values the pipeline can use
//! deterministically:
//! - `structured`: fenced YAML extraction and typed parsing
//! - `reference`: index references (`3` or `"3 # Name"`) with bounds checks
//!
//! ## Design Philosophy
//! - Fail fast on structural errors; never guess at malformed content
//! - Keep the raw response on every parse failure for diagnostics

mod reference;
mod structured;

pub use reference::{IndexRef, resolve_index};
pub use structured::{extract_block, parse_structured, strip_wrapping_fence};

//! AI Integration Layer
//!
//! Generator backends and the validation applied to what they return.

pub mod provider;
pub mod validation;

pub use provider::{
    LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider, ProviderConfig, ResponseMetadata,
    ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
pub use validation::{
    IndexRef, extract_block, parse_structured, resolve_index, strip_wrapping_fence,
};

//! Stage Helper Functions
//!
//! Every analysis stage follows the same execution pattern:
//! 1. Build prompt -> 2. Call generator once -> 3. Parse/validate -> 4. Log result
//!
//! `run_stage` owns steps 2-4 so stage modules only supply the prompt and
//! the parser.

use tracing::debug;

use crate::ai::{SharedProvider, TokenUsage};
use crate::types::Result;

/// One generator invocation for a stage
pub struct StageCall<'a> {
    /// Stage label for logging (e.g., "abstractions", "chapter 3")
    pub label: &'a str,
    pub prompt: String,
    pub system: &'a str,
}

/// Parsed stage output with the tokens it cost
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub value: T,
    pub usage: TokenUsage,
}

/// Call the generator once and parse its raw text.
///
/// Parsing failures are returned as-is; there is no retry here.
pub async fn run_stage<T, F>(
    provider: &SharedProvider,
    call: StageCall<'_>,
    parse: F,
) -> Result<Generated<T>>
where
    F: FnOnce(&str) -> Result<T>,
{
    debug!(
        stage = call.label,
        provider = provider.name(),
        model = provider.model(),
        prompt_chars = call.prompt.len(),
        "Invoking generator"
    );

    let response = provider.generate(&call.prompt, Some(call.system)).await?;

    debug!(
        stage = call.label,
        response_chars = response.content.len(),
        tokens = response.usage.total(),
        elapsed_ms = response.timing.total_ms,
        "Generator responded"
    );

    let value = parse(&response.content)?;

    Ok(Generated {
        value,
        usage: response.usage,
    })
}

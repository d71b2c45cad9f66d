//! Structured Response Extraction
//!
//! Generators are asked to answer with a fenced YAML block but often wrap it
//! in prose. Extraction picks, in order:
//!
//! 1. the first fenced block whose info string is one of the expected tags
//! 2. the first untagged fenced block
//! 3. the whole text
//!
//! A fence that is never closed runs to the end of the text. Nothing beyond
//! fence stripping is repaired; malformed content is reported with the raw
//! response attached.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::constants::tutorial::STRUCTURED_TAGS;
use crate::types::{Result, TutorError};

const FENCE: &str = "```";

/// Info strings of a fence that wraps a whole markdown answer
const WRAPPING_TAGS: &[&str] = &["", "markdown", "md"];

/// A fenced block found in generator output
#[derive(Debug, Clone, PartialEq, Eq)]
struct FencedBlock<'a> {
    info: &'a str,
    body: String,
}

fn fence_info(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix(FENCE).map(str::trim)
}

fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<(&str, Vec<&str>)> = None;

    for line in text.lines() {
        match (open.take(), fence_info(line)) {
            (None, Some(info)) => open = Some((info, Vec::new())),
            (None, None) => {}
            (Some((info, body)), Some(_)) => blocks.push(FencedBlock {
                info,
                body: body.join("\n"),
            }),
            (Some((info, mut body)), None) => {
                body.push(line);
                open = Some((info, body));
            }
        }
    }

    if let Some((info, body)) = open {
        blocks.push(FencedBlock {
            info,
            body: body.join("\n"),
        });
    }

    blocks
}

/// Isolate the structured payload of a generator response
pub fn extract_block(text: &str, tags: &[&str]) -> String {
    let blocks = fenced_blocks(text);

    let tagged = blocks.iter().find(|b| {
        let tag = b.info.split_whitespace().next().unwrap_or_default();
        tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    });

    if let Some(block) = tagged.or_else(|| blocks.iter().find(|b| b.info.is_empty())) {
        return block.body.clone();
    }

    text.to_string()
}

/// Extract the YAML payload and deserialize it as `T`
///
/// `expected` names the document shape in error messages.
pub fn parse_structured<T: DeserializeOwned>(text: &str, expected: &str) -> Result<T> {
    let payload = extract_block(text, STRUCTURED_TAGS);
    debug!(
        expected,
        payload_chars = payload.len(),
        "Parsing structured response"
    );

    if payload.trim().is_empty() {
        return Err(TutorError::response_parse(
            expected,
            "structured block is empty",
            text,
        ));
    }

    serde_yaml::from_str(&payload)
        .map_err(|e| TutorError::response_parse(expected, e.to_string(), text))
}

/// Remove a fence wrapping the whole answer
///
/// Only an untagged or `markdown`/`md` fence counts as wrapping, and only
/// when the text also ends with a closing fence line. Anything else, such as
/// an answer that opens with a real code block, is only trimmed.
pub fn strip_wrapping_fence(text: &str) -> String {
    let trimmed = text.trim();

    let Some((first, rest)) = trimmed.split_once('\n') else {
        return trimmed.to_string();
    };

    let wraps = fence_info(first)
        .is_some_and(|info| WRAPPING_TAGS.iter().any(|t| t.eq_ignore_ascii_case(info)));
    if !wraps {
        return trimmed.to_string();
    }

    match rest.trim_end().rsplit_once('\n') {
        Some((body, last)) if last.trim() == FENCE => body.trim().to_string(),
        None if rest.trim() == FENCE => String::new(),
        _ => trimmed.to_string(),
    }
}

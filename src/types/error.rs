//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Failure Kinds
//!
//! Every pipeline failure falls into one of five kinds (see [`FailureKind`]):
//!
//! - **InputValidation**: empty corpus, empty abstraction name, missing config
//! - **GeneratorFailure**: backend/transport error or empty-choices response
//! - **ResponseParseFailure**: structured block absent or malformed
//! - **ReferenceOutOfBounds**: an index outside its valid range
//! - **PlanIncomplete**: duplicate or missing entries in the chapter plan
//!
//! Provider-side errors additionally carry an [`ErrorCategory`] so callers
//! (or an external retry substrate) can tell auth failures from rate limits.

use std::time::Duration;
use thiserror::Error;

use crate::tutorial::PipelineStage;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider error categories for routing and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry same provider
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Provider unavailable
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Provider answered but without any usable choice
    EmptyResponse,
    /// Temporary server issues - retry same provider
    Transient,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::EmptyResponse => write!(f, "EMPTY_RESPONSE"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is worth replaying the stage for
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::EmptyResponse
        )
    }

    /// Get recommended retry delay for this category
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(30),
            Self::Network => Duration::from_secs(5),
            Self::Transient => Duration::from_secs(2),
            _ => Duration::from_millis(500),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Generator backend error with category, provider and retry hint
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// Suggested wait time before retry (if applicable)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    /// Get recommended retry delay
    pub fn recommended_delay(&self) -> Duration {
        self.retry_after
            .unwrap_or_else(|| self.category.recommended_delay())
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw transport failures onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify HTTP status code directly
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
                    .retry_after(Duration::from_secs(5))
            }
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a reqwest transport error (no HTTP status available)
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let message = err.to_string();
        if err.is_timeout() || err.is_connect() {
            LlmError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5))
        } else if err.is_decode() {
            LlmError::with_provider(ErrorCategory::Transient, message, provider)
        } else if let Some(status) = err.status() {
            Self::classify_http_status(status.as_u16(), &message, provider)
        } else {
            LlmError::with_provider(ErrorCategory::Unknown, message, provider)
        }
    }
}

// =============================================================================
// Failure Kind
// =============================================================================

/// Pipeline-level classification of a [`TutorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InputValidation,
    GeneratorFailure,
    ResponseParseFailure,
    ReferenceOutOfBounds,
    PlanIncomplete,
    /// Configuration or filesystem problem outside the pipeline contract
    Environment,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputValidation => write!(f, "INPUT_VALIDATION"),
            Self::GeneratorFailure => write!(f, "GENERATOR_FAILURE"),
            Self::ResponseParseFailure => write!(f, "RESPONSE_PARSE_FAILURE"),
            Self::ReferenceOutOfBounds => write!(f, "REFERENCE_OUT_OF_BOUNDS"),
            Self::PlanIncomplete => write!(f, "PLAN_INCOMPLETE"),
            Self::Environment => write!(f, "ENVIRONMENT"),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum TutorError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Generator Errors
    // -------------------------------------------------------------------------
    #[error("LLM error: {0}")]
    Llm(LlmError),

    // -------------------------------------------------------------------------
    // Contract Errors
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Structured block absent or malformed; `raw` is the full generator text
    #[error("Failed to parse {expected} from response: {message}\nResponse: {raw}")]
    ResponseParse {
        expected: String,
        message: String,
        raw: String,
    },

    /// A reference that is neither an integer nor an `"<int> # comment"` string
    #[error("Invalid reference {value:?}: {reason}")]
    InvalidReference { value: String, reason: String },

    #[error("Index {value} out of bounds (0..{bound}) in {context}")]
    ReferenceOutOfBounds {
        context: String,
        value: i64,
        bound: usize,
    },

    #[error("Duplicate index {index} in chapter order at position {position}")]
    DuplicatePlanEntry { index: usize, position: usize },

    #[error("Missing abstractions in chapter order: {missing:?}")]
    PlanIncomplete { missing: Vec<usize> },

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    /// Terminal failure of a run: which stage failed and why
    #[error("Stage '{stage}' failed")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<TutorError>,
    },
}

impl From<LlmError> for TutorError {
    fn from(err: LlmError) -> Self {
        TutorError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl TutorError {
    /// Create a parse error that keeps the offending raw response
    pub fn response_parse(
        expected: impl Into<String>,
        message: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self::ResponseParse {
            expected: expected.into(),
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn out_of_bounds(context: impl Into<String>, value: i64, bound: usize) -> Self {
        Self::ReferenceOutOfBounds {
            context: context.into(),
            value,
            bound,
        }
    }

    /// Attribute this error to a pipeline stage (idempotent)
    pub fn in_stage(self, stage: PipelineStage) -> Self {
        match self {
            Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage the error was attributed to, if any
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, skipping stage attribution
    pub fn root(&self) -> &TutorError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self.root() {
            Self::InputValidation(_) => FailureKind::InputValidation,
            Self::Llm(_) => FailureKind::GeneratorFailure,
            Self::ResponseParse { .. } | Self::InvalidReference { .. } | Self::Json(_) => {
                FailureKind::ResponseParseFailure
            }
            Self::ReferenceOutOfBounds { .. } => FailureKind::ReferenceOutOfBounds,
            Self::DuplicatePlanEntry { .. } | Self::PlanIncomplete { .. } => {
                FailureKind::PlanIncomplete
            }
            Self::Io(_) | Self::Config(_) | Self::Stage { .. } => FailureKind::Environment,
        }
    }

    /// Whether replaying the failed stage could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        match self.root() {
            Self::Llm(e) => e.is_retryable(),
            // A fresh generation may come back well-formed
            Self::ResponseParse { .. }
            | Self::InvalidReference { .. }
            | Self::ReferenceOutOfBounds { .. }
            | Self::DuplicatePlanEntry { .. }
            | Self::PlanIncomplete { .. } => true,
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

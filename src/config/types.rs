//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/codetutor/) and project (.codetutor/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::ProviderConfig;
use crate::constants::{corpus, llm, tutorial};
use crate::types::{Result, TutorError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Generator backend settings
    pub llm: LlmConfig,

    /// Corpus collection settings
    pub analysis: AnalysisConfig,

    /// Tutorial output settings
    pub tutorial: TutorialConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            analysis: AnalysisConfig::default(),
            tutorial: TutorialConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `TutorError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(TutorError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(TutorError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(TutorError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.tutorial.max_abstractions == 0 {
            return Err(TutorError::Config(
                "tutorial max_abstractions must be greater than 0".to_string(),
            ));
        }

        if self.tutorial.output_dir.as_os_str().is_empty() {
            return Err(TutorError::Config(
                "tutorial output_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend: "openrouter", "openai" or "ollama"
    pub provider: String,

    /// Model override; each backend has its own default
    pub model: Option<String>,

    pub timeout_secs: u64,

    pub temperature: f32,

    pub max_tokens: usize,

    /// Custom endpoint
    pub api_base: Option<String>,

    /// Prefer the backend's environment variable over storing keys in files
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            model: None,
            timeout_secs: llm::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
            api_base: None,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl LlmConfig {
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

// =============================================================================
// Analysis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Glob patterns a file must match (empty = every file)
    pub include: Vec<String>,

    /// Glob patterns that drop a file, checked before `include`
    pub exclude: Vec<String>,

    /// Bytes; larger files are skipped
    pub max_file_size: u64,

    /// Stop collecting after this many files
    pub max_files: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include: corpus::DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
            exclude: corpus::DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            max_file_size: corpus::DEFAULT_MAX_FILE_SIZE,
            max_files: corpus::DEFAULT_MAX_FILES,
        }
    }
}

// =============================================================================
// Tutorial Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialConfig {
    /// Project name (defaults to the repository directory name)
    pub project_name: Option<String>,

    /// Where chapter files are written
    pub output_dir: PathBuf,

    /// Ceiling on abstractions kept from extraction
    pub max_abstractions: usize,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            output_dir: PathBuf::from(tutorial::DEFAULT_OUTPUT_DIR),
            max_abstractions: tutorial::DEFAULT_MAX_ABSTRACTIONS,
        }
    }
}

//! OpenAI-compatible Chat Completions Provider
//!
//! Serves both OpenAI and OpenRouter, which share the same wire format.
//! Returns the first choice's message text verbatim; parsing is left to the
//! pipeline stages.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, TokenUsage,
};
use crate::constants::llm;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, TutorError};

/// OpenAI-compatible provider with secure API key handling
pub struct OpenAiProvider {
    /// Never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    provider_name: &'static str,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("provider", &self.provider_name)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Per-backend defaults for the shared wire format
struct Flavor {
    name: &'static str,
    key_env: &'static str,
    api_base: &'static str,
    model: &'static str,
}

const OPENAI: Flavor = Flavor {
    name: "openai",
    key_env: "OPENAI_API_KEY",
    api_base: llm::OPENAI_API_BASE,
    model: llm::OPENAI_DEFAULT_MODEL,
};

const OPENROUTER: Flavor = Flavor {
    name: "openrouter",
    key_env: "OPENROUTER_API_KEY",
    api_base: llm::OPENROUTER_API_BASE,
    model: llm::OPENROUTER_DEFAULT_MODEL,
};

impl OpenAiProvider {
    /// OpenAI endpoint, key from config or `OPENAI_API_KEY`
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Self::with_flavor(config, &OPENAI)
    }

    /// OpenRouter endpoint, key from config or `OPENROUTER_API_KEY`
    ///
    /// The model falls back to `LLM_MODEL` before the built-in default.
    pub fn openrouter(config: ProviderConfig) -> Result<Self> {
        Self::with_flavor(config, &OPENROUTER)
    }

    fn with_flavor(config: ProviderConfig, flavor: &Flavor) -> Result<Self> {
        let api_key_str = config
            .api_key
            .or_else(|| std::env::var(flavor.key_env).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TutorError::Config(format!(
                    "{} API key not found. Set {} env var or provide in config",
                    flavor.name, flavor.key_env
                ))
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| flavor.api_base.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = config
            .model
            .or_else(|| std::env::var(llm::MODEL_ENV).ok())
            .unwrap_or_else(|| flavor.model.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                LlmError::with_provider(
                    ErrorCategory::Unknown,
                    format!("Failed to create HTTP client: {}", e),
                    flavor.name,
                )
            })?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            provider_name: flavor.name,
            client,
        })
    }

    fn build_request(&self, prompt: &str, system: Option<&str>) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }
}

/// First choice's text; a missing choice is a backend failure
fn first_choice_text(body: ChatCompletionResponse, provider: &str) -> Result<String> {
    let choice = body.choices.into_iter().next().ok_or_else(|| {
        LlmError::with_provider(
            ErrorCategory::EmptyResponse,
            "no response choices returned from LLM",
            provider,
        )
    })?;
    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<LlmResponse> {
        info!(
            "Generating with {} (model: {}, temperature: {})",
            self.provider_name, self.model, self.temperature
        );

        let start_time = Instant::now();
        let request = self.build_request(prompt, system);
        let url = format!("{}/chat/completions", self.api_base);

        debug!(prompt_chars = prompt.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, self.provider_name))?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("API error ({}): {}", status, body),
                self.provider_name,
            )
            .into());
        }

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::Transient,
                format!("Failed to decode response: {}", e),
                self.provider_name,
            )
        })?;

        let usage = response_body
            .usage
            .as_ref()
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = first_choice_text(response_body, self.provider_name)?;
        debug!(
            response_chars = content.len(),
            tokens = usage.total(),
            "Received chat completion"
        );

        Ok(LlmResponse::with_metrics(
            content,
            usage,
            ResponseTiming::from_duration(elapsed),
            ResponseMetadata {
                model: self.model.clone(),
                provider: self.provider_name.to_string(),
            },
        ))
    }

    fn name(&self) -> &str {
        self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("{} API is available", self.provider_name);
                Ok(true)
            }
            Ok(resp) => {
                warn!("{} API check failed: {}", self.provider_name, resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("{} API check failed: {}", self.provider_name, e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

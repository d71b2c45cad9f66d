//! Deterministic generator stub for stage and pipeline tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::ai::{LlmProvider, LlmResponse, SharedProvider, TokenUsage};
use crate::types::{ErrorCategory, LlmError, Result};

/// A prompt the stub received
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub system: Option<String>,
}

/// Answers each call with the next scripted response, in order
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
    healthy: AtomicBool,
}

impl ScriptedProvider {
    pub fn new<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
        })
    }

    /// Queue a backend failure after the scripted responses
    pub fn then_fail(self: Arc<Self>, category: ErrorCategory, message: &str) -> Arc<Self> {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(LlmError::with_provider(category, message, "scripted").into()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// What `health_check` reports from now on
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    pub fn shared(self: &Arc<Self>) -> SharedProvider {
        self.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<LlmResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
        });

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => {
                let mut response = LlmResponse::content_only(content);
                response.usage = TokenUsage::from_openai(10, 5);
                Ok(response)
            }
            Some(Err(e)) => Err(e),
            None => Err(LlmError::with_provider(
                ErrorCategory::EmptyResponse,
                "no response choices returned from LLM",
                "scripted",
            )
            .into()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}

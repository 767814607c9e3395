//! A scripted language model for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::errors::LlmError;
use super::handle::{LanguageModel, ModelHandle, SamplingParams};

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub struct RecordedPrompt {
    pub prompt: String,
    pub schema: serde_json::Value,
    pub sampling: SamplingParams,
}

/// Replays queued responses in order and records every prompt it receives.
/// An exhausted queue answers with `LlmError::EmptyResponse`.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<RecordedPrompt>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for r in responses {
            model.push_response(r);
        }
        model
    }

    pub fn push_response(&self, text: impl Into<String>) {
        if let Ok(mut q) = self.responses.lock() {
            q.push_back(Ok(text.into()));
        }
    }

    /// Queue a request failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        if let Ok(mut q) = self.responses.lock() {
            q.push_back(Err(message.into()));
        }
    }

    /// A handle sharing this model's script and call log.
    pub fn handle(&self) -> ModelHandle {
        ModelHandle::ready(Arc::new(self.clone()))
    }

    pub fn calls(&self) -> Vec<RecordedPrompt> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        sampling: &SamplingParams,
    ) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedPrompt {
                prompt: prompt.to_string(),
                schema: schema.clone(),
                sampling: *sampling,
            });
        }
        let next = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Request(message)),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

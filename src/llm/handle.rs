//! The language model contract and the explicitly owned model handle.

use async_trait::async_trait;
use std::sync::Arc;

use super::errors::LlmError;

/// Decoding parameters for one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Greedy decoding: the same prompt always yields the same text.
    pub deterministic: bool,
}

impl SamplingParams {
    /// Intent routing: short, greedy output.
    pub const ROUTING: SamplingParams = SamplingParams {
        max_tokens: 256,
        temperature: 0.1,
        deterministic: true,
    };

    /// Topic suggestion.
    pub const TOPIC_SUGGESTION: SamplingParams = SamplingParams {
        max_tokens: 1024,
        temperature: 0.3,
        deterministic: false,
    };

    /// Multi-paper summaries.
    pub const SUMMARY: SamplingParams = SamplingParams {
        max_tokens: 1024,
        temperature: 0.3,
        deterministic: true,
    };
}

/// A text generator that can be constrained to a JSON schema.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Generate text for `prompt`, restricted to documents matching `schema`.
    async fn generate(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        sampling: &SamplingParams,
    ) -> Result<String, LlmError>;
}

/// Owned handle to the model, created once at startup and passed to every
/// component that needs inference.
#[derive(Clone, Default)]
pub enum ModelHandle {
    /// No model configured; every generation fails with `LlmError::Uninitialized`.
    #[default]
    Uninitialized,
    Ready(Arc<dyn LanguageModel>),
}

impl ModelHandle {
    pub fn ready(model: Arc<dyn LanguageModel>) -> Self {
        Self::Ready(model)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The model, or `LlmError::Uninitialized`.
    pub fn get(&self) -> Result<&Arc<dyn LanguageModel>, LlmError> {
        match self {
            Self::Ready(model) => Ok(model),
            Self::Uninitialized => Err(LlmError::Uninitialized),
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        sampling: &SamplingParams,
    ) -> Result<String, LlmError> {
        self.get()?.generate(prompt, schema, sampling).await
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("ModelHandle::Uninitialized"),
            Self::Ready(model) => write!(f, "ModelHandle::Ready({})", model.model_name()),
        }
    }
}

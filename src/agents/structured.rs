//! Render-prompt, constrain, parse: the shared shape of every LLM call.

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{ModelHandle, SamplingParams};

/// Outcome of a schema-constrained generation.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutput {
    /// The model produced valid JSON.
    Parsed(Value),
    /// The model produced text that is not JSON; the text is kept.
    Undecodable { message: String, raw: String },
    /// The model call itself failed.
    Failed { message: String },
}

/// A sub-agent failure, with the undecodable text when there was one.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFailure {
    pub message: String,
    pub raw_response: Option<String>,
}

impl AgentFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw_response: None,
        }
    }
}

impl StructuredOutput {
    /// Collapse into a `Result`, prefixing failure messages with `context`.
    pub fn into_result(self, context: &str) -> Result<Value, AgentFailure> {
        match self {
            Self::Parsed(value) => Ok(value),
            Self::Undecodable { message, raw } => Err(AgentFailure {
                message: format!("Failed to parse LLM response: {message}"),
                raw_response: Some(raw),
            }),
            Self::Failed { message } => Err(AgentFailure::new(format!("{context}: {message}"))),
        }
    }
}

/// Generate once under `schema` and decode the text as JSON.
pub async fn generate_structured(
    model: &ModelHandle,
    prompt: &str,
    schema: &Value,
    sampling: &SamplingParams,
) -> StructuredOutput {
    debug!("Structured generation prompt:\n{}", prompt);

    let text = match model.generate(prompt, schema, sampling).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Model call failed: {}", e);
            return StructuredOutput::Failed {
                message: e.to_string(),
            };
        }
    };

    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => StructuredOutput::Parsed(value),
        Err(e) => {
            warn!("Model returned undecodable output: {}", e);
            StructuredOutput::Undecodable {
                message: e.to_string(),
                raw: text,
            }
        }
    }
}

/// Cut `text` to at most `max_chars` characters, appending `suffix` when cut.
pub fn truncate_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &text[..idx], suffix),
        None => text.to_string(),
    }
}

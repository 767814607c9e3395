//! Schema-constrained generation over an OpenAI-compatible chat API.
//!
//! The request carries a `json_schema` response format so that servers which
//! support guided decoding only emit documents matching the schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::errors::LlmError;
use super::handle::{LanguageModel, SamplingParams};

/// Seed sent with deterministic requests.
const DETERMINISTIC_SEED: u64 = 42;

/// Inference client for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    http: reqwest::Client,
}

// -- OpenAI-compatible request/response types --------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    r#type: &'a str,
    json_schema: JsonSchemaPayload<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaPayload<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl InferenceClient {
    /// Create a new inference client.
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs,
            http,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            LlmError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl LanguageModel for InferenceClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        sampling: &SamplingParams,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let (temperature, seed) = if sampling.deterministic {
            (0.0, Some(DETERMINISTIC_SEED))
        } else {
            (sampling.temperature, None)
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![MessagePayload {
                role: "user",
                content: prompt,
            }],
            max_tokens: sampling.max_tokens,
            temperature,
            seed,
            response_format: ResponseFormat {
                r#type: "json_schema",
                json_schema: JsonSchemaPayload {
                    name: "response",
                    schema,
                    strict: true,
                },
            },
        };

        debug!(
            "Inference request to model {} ({} prompt chars, max_tokens={})",
            self.model,
            prompt.len(),
            sampling.max_tokens
        );

        let mut builder = self.http.post(&url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = resp.json().await.map_err(|e| self.map_send_error(e))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

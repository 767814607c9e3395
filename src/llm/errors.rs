//! Language model error types.

use thiserror::Error;

/// Errors from a language model call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No model was configured at startup.
    #[error("LLM is not initialized; configure [llm] in organizer.toml")]
    Uninitialized,

    /// The request could not be sent or the body could not be read.
    #[error("inference request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("inference failed ({status}): {body}")]
    Status { status: u16, body: String },

    /// The endpoint did not answer within the configured bound.
    #[error("inference timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The endpoint answered without any generated text.
    #[error("inference returned no content")]
    EmptyResponse,
}

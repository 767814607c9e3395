//! Tool invocation error types.

use thiserror::Error;

/// Errors from discovering or calling tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No provider offers a tool with this name.
    #[error("Tool not available: {name}")]
    NotAvailable { name: String },

    /// The provider process could not be started.
    #[error("failed to spawn tool provider: {0}")]
    Spawn(String),

    /// The channel to the provider broke or carried garbage.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a protocol-level error.
    #[error("server error {code}: {message}")]
    Server { code: i64, message: String },

    /// No answer within the configured bound.
    #[error("{tool} timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },

    /// The tool ran and reported an error.
    #[error("{tool} failed: {reason}")]
    Execution { tool: String, reason: String },

    /// Discovery found nothing to route to.
    #[error("no tools discovered from any provider")]
    NoToolsDiscovered,
}

impl ToolError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn execution(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Execution {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(format!("invalid JSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolError::NotAvailable {
            name: "add_topic".into(),
        };
        assert_eq!(err.to_string(), "Tool not available: add_topic");

        let err = ToolError::Timeout {
            tool: "fetch_arxiv_paper".into(),
            timeout_ms: 1500,
        };
        assert!(err.to_string().contains("1500ms"));
    }

    #[test]
    fn test_json_error_becomes_transport() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        assert!(matches!(ToolError::from(json_err), ToolError::Transport(_)));
    }
}

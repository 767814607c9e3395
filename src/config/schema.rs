//! Configuration schema for organizer.toml.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::providers::BuiltinServer;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    /// Path to the SQLite database. Empty means `<home>/research.db`.
    pub db_path: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,

    /// Upper bound for a single tool call round trip.
    pub tool_call_timeout_secs: u64,

    /// Language model endpoint.
    pub llm: LlmConfig,

    /// ArXiv export API.
    pub arxiv: ArxivConfig,

    /// Tool providers discovered at startup, in registration order.
    pub providers: Vec<ProviderConfig>,
}

/// OpenAI-compatible inference endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// When false the model handle stays uninitialized and only fixed
    /// commands are understood.
    pub enabled: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

/// How a tool provider is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// A built-in server hosted in a child process of this binary.
    Builtin,
    /// An arbitrary command speaking the stdio tool protocol.
    Stdio,
    /// A built-in server running inside this process.
    InProcess,
}

/// One entry of the `[[providers]]` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<BuiltinServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl ProviderConfig {
    /// A built-in server spawned as `research-organizer serve <server>`.
    pub fn builtin(server: BuiltinServer) -> Self {
        Self {
            name: server.provider_name().to_string(),
            kind: ProviderKind::Builtin,
            server: Some(server),
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            db_path: String::new(),
            log_level: "warn".into(),
            tool_call_timeout_secs: 30,
            llm: LlmConfig::default(),
            arxiv: ArxivConfig::default(),
            providers: BuiltinServer::ALL
                .iter()
                .map(|s| ProviderConfig::builtin(*s))
                .collect(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "http://localhost:8000".into(),
            api_key: String::new(),
            model: "qwen2.5-7b-instruct".into(),
            timeout_secs: 120,
        }
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_url: "http://export.arxiv.org/api/query".into(),
            timeout_secs: 10,
        }
    }
}

impl OrganizerConfig {
    /// Resolve a path that may contain `~` to an absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        shellexpand::tilde(path).into_owned()
    }

    /// Resolved database path, defaulting to `<home>/research.db`.
    pub fn resolved_db_path(&self, home_dir: &Path) -> PathBuf {
        if self.db_path.trim().is_empty() {
            home_dir.join("research.db")
        } else {
            PathBuf::from(self.resolve_path(&self.db_path))
        }
    }

    /// Whether the model endpoint is usable at all.
    pub fn llm_configured(&self) -> bool {
        self.llm.enabled && !self.llm.api_url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_providers_are_builtin_servers() {
        let config = OrganizerConfig::default();
        assert_eq!(config.providers.len(), 4);
        assert!(config
            .providers
            .iter()
            .all(|p| p.kind == ProviderKind::Builtin && p.server.is_some()));
    }

    #[test]
    fn test_resolved_db_path_defaults_to_home() {
        let config = OrganizerConfig::default();
        let home = Path::new("/tmp/organizer-home");
        assert_eq!(config.resolved_db_path(home), home.join("research.db"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: OrganizerConfig = toml::from_str(
            r#"
            tool_call_timeout_secs = 5

            [llm]
            model = "local-model"

            [[providers]]
            name = "external-db"
            kind = "stdio"
            command = "python"
            args = ["-m", "mcp_tools.db"]
            "#,
        )
        .unwrap();

        assert_eq!(config.tool_call_timeout_secs, 5);
        assert_eq!(config.llm.model, "local-model");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].kind, ProviderKind::Stdio);
        assert_eq!(config.providers[0].args, vec!["-m", "mcp_tools.db"]);
    }
}

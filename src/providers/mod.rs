//! Built-in tool providers and provider construction from configuration.

pub mod arxiv;
pub mod db;
pub mod summary;
pub mod topics;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::arxiv::ArxivClient;
use crate::config::{ArxivConfig, OrganizerConfig, ProviderConfig, ProviderKind};
use crate::llm::ModelHandle;
use crate::mcp::StdioProvider;
use crate::state::Database;
use crate::tools::{LocalProvider, Tool, ToolError, ToolProvider};

/// The tool servers shipped with this binary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinServer {
    /// Topic and paper storage.
    Db,
    /// ArXiv metadata fetching.
    Arxiv,
    /// LLM topic suggestion.
    Topics,
    /// LLM topic summaries.
    Summary,
}

impl BuiltinServer {
    pub const ALL: [BuiltinServer; 4] = [
        BuiltinServer::Db,
        BuiltinServer::Arxiv,
        BuiltinServer::Topics,
        BuiltinServer::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Db => "db",
            Self::Arxiv => "arxiv",
            Self::Topics => "topics",
            Self::Summary => "summary",
        }
    }

    /// Provider name used in logs, listings and the protocol handshake.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Db => "research-db",
            Self::Arxiv => "research-arxiv",
            Self::Topics => "research-topics",
            Self::Summary => "research-summary",
        }
    }
}

impl fmt::Display for BuiltinServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared state for the built-in tools. The database is opened on first use
/// so that providers which never touch it never create the file.
pub struct ProviderContext {
    db_path: PathBuf,
    db: OnceCell<Arc<Mutex<Database>>>,
    arxiv: ArxivConfig,
    model: ModelHandle,
}

impl ProviderContext {
    pub fn new(db_path: PathBuf, arxiv: ArxivConfig, model: ModelHandle) -> Self {
        Self {
            db_path,
            db: OnceCell::new(),
            arxiv,
            model,
        }
    }

    /// A context around an already-open database.
    pub fn with_database(db: Database, arxiv: ArxivConfig, model: ModelHandle) -> Self {
        Self {
            db_path: PathBuf::new(),
            db: OnceCell::new_with(Some(Arc::new(Mutex::new(db)))),
            arxiv,
            model,
        }
    }

    pub fn from_config(config: &OrganizerConfig, home: &Path, model: ModelHandle) -> Self {
        Self::new(config.resolved_db_path(home), config.arxiv.clone(), model)
    }

    pub async fn database(&self) -> Result<Arc<Mutex<Database>>, ToolError> {
        self.db
            .get_or_try_init(|| async {
                info!("Opening database at {}", self.db_path.display());
                Database::open(&self.db_path)
                    .map(|db| Arc::new(Mutex::new(db)))
                    .map_err(|e| ToolError::execution("database", format!("{e:#}")))
            })
            .await
            .cloned()
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn arxiv_config(&self) -> &ArxivConfig {
        &self.arxiv
    }
}

/// The in-process provider for one built-in server.
pub fn builtin_provider(server: BuiltinServer, ctx: Arc<ProviderContext>) -> Result<LocalProvider> {
    let tools: Vec<Arc<dyn Tool>> = match server {
        BuiltinServer::Db => db::tools(ctx),
        BuiltinServer::Arxiv => {
            let client = ArxivClient::new(&ctx.arxiv_config().api_url, ctx.arxiv_config().timeout_secs)
                .context("Failed to build ArXiv client")?;
            vec![Arc::new(arxiv::FetchArxivPaper::new(client))]
        }
        BuiltinServer::Topics => vec![Arc::new(topics::ExtractTopics::new(ctx))],
        BuiltinServer::Summary => vec![Arc::new(summary::SummarizeTopic::new(ctx))],
    };
    Ok(LocalProvider::new(server.provider_name(), tools))
}

/// Build every configured provider. Entries that cannot be constructed are
/// skipped with a warning, like providers that fail discovery.
pub fn build_providers(
    config: &OrganizerConfig,
    home: &Path,
    ctx: Arc<ProviderContext>,
) -> Vec<Arc<dyn ToolProvider>> {
    let mut providers: Vec<Arc<dyn ToolProvider>> = Vec::new();
    for entry in &config.providers {
        match build_provider(entry, home, Arc::clone(&ctx)) {
            Ok(provider) => providers.push(provider),
            Err(e) => warn!("Skipping provider '{}': {:#}", entry.name, e),
        }
    }
    providers
}

fn build_provider(
    entry: &ProviderConfig,
    home: &Path,
    ctx: Arc<ProviderContext>,
) -> Result<Arc<dyn ToolProvider>> {
    match entry.kind {
        ProviderKind::Builtin => {
            let server = entry.server.context("builtin provider needs `server`")?;
            let exe = std::env::current_exe().context("Cannot locate own executable")?;
            let args = vec![
                "--home".to_string(),
                home.display().to_string(),
                "serve".to_string(),
                server.as_str().to_string(),
            ];
            Ok(Arc::new(
                StdioProvider::new(&entry.name, exe.display().to_string(), args)
                    .with_env(entry.env.clone()),
            ))
        }
        ProviderKind::Stdio => {
            let command = entry
                .command
                .as_deref()
                .context("stdio provider needs `command`")?;
            Ok(Arc::new(
                StdioProvider::new(&entry.name, command, entry.args.clone())
                    .with_env(entry.env.clone()),
            ))
        }
        ProviderKind::InProcess => {
            let server = entry.server.context("in_process provider needs `server`")?;
            Ok(Arc::new(builtin_provider(server, ctx)?))
        }
    }
}

// ---------------------------------------------------------------------------
// Argument and payload helpers shared by the built-in tools
// ---------------------------------------------------------------------------

pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub(crate) fn missing_argument(key: &str) -> Value {
    json!({"success": false, "message": format!("Missing argument: {key}")})
}

pub(crate) fn failure(message: impl Into<String>) -> Value {
    json!({"success": false, "message": message.into()})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_server_names() {
        assert_eq!(BuiltinServer::Db.provider_name(), "research-db");
        assert_eq!(BuiltinServer::Summary.to_string(), "summary");
        let parsed: BuiltinServer = serde_json::from_str("\"topics\"").unwrap();
        assert_eq!(parsed, BuiltinServer::Topics);
    }

    #[tokio::test]
    async fn test_in_process_provider_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = OrganizerConfig::default();
        config.providers = vec![ProviderConfig {
            kind: ProviderKind::InProcess,
            ..ProviderConfig::builtin(BuiltinServer::Db)
        }];
        let ctx = Arc::new(ProviderContext::from_config(
            &config,
            dir.path(),
            ModelHandle::Uninitialized,
        ));

        let providers = build_providers(&config, dir.path(), ctx);
        assert_eq!(providers.len(), 1);
        let tools = providers[0].list_tools().await.unwrap();
        assert_eq!(tools.len(), 8);
        assert!(!dir.path().join("research.db").exists());

        providers[0]
            .call_tool("add_topic", json!({"name": "nlp"}))
            .await
            .unwrap();
        assert!(dir.path().join("research.db").exists());
    }

    #[test]
    fn test_misconfigured_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = OrganizerConfig::default();
        config.providers = vec![ProviderConfig {
            kind: ProviderKind::Stdio,
            command: None,
            ..ProviderConfig::builtin(BuiltinServer::Db)
        }];
        let ctx = Arc::new(ProviderContext::from_config(
            &config,
            dir.path(),
            ModelHandle::Uninitialized,
        ));
        assert!(build_providers(&config, dir.path(), ctx).is_empty());
    }
}

//! Client side: a session over a transport, and a provider backed by a
//! child process.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use super::transport::LineTransport;
use super::types::*;
use crate::tools::{ToolDescriptor, ToolError, ToolProvider};

/// How long a provider process gets to exit after its stdin closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct ListToolsResult {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

/// An initialized protocol session.
pub struct McpSession<R, W> {
    transport: LineTransport<R, W>,
}

impl<R, W> McpSession<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Run the `initialize` handshake.
    pub async fn initialize(reader: R, writer: W) -> Result<Self, ToolError> {
        let mut transport = LineTransport::new(reader, writer);
        let server = transport
            .request(
                METHOD_INITIALIZE,
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                })),
            )
            .await?;
        debug!(
            "Connected to tool server {}",
            server["serverInfo"]["name"].as_str().unwrap_or("(unnamed)")
        );
        transport.notify(METHOD_INITIALIZED, None).await?;
        Ok(Self { transport })
    }

    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let result = self.transport.request(METHOD_LIST_TOOLS, None).await?;
        let listed: ListToolsResult = serde_json::from_value(result)?;
        Ok(listed.tools)
    }

    /// Call a tool and decode its content into a single payload.
    pub async fn call_tool(&mut self, name: &str, args: Value) -> Result<Value, ToolError> {
        let result = self
            .transport
            .request(
                METHOD_CALL_TOOL,
                Some(json!({"name": name, "arguments": args})),
            )
            .await?;
        let result: CallToolResult = serde_json::from_value(result)?;
        if result.is_error {
            return Err(ToolError::execution(name, result.joined_text()));
        }
        Ok(result.into_payload())
    }
}

type ChildSession = McpSession<BufReader<ChildStdout>, ChildStdin>;

/// A session bound to the child process that serves it.
struct ScopedSession {
    child: Child,
    session: ChildSession,
}

impl ScopedSession {
    /// Close stdin, give the child a moment to exit, then kill it.
    async fn close(self) {
        let Self { mut child, session } = self;
        drop(session);
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!("Tool server exited with {}", status),
            Ok(Err(e)) => warn!("Failed waiting for tool server: {}", e),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill tool server: {}", e);
                }
            }
        }
    }
}

/// A tool provider served by a separate process over stdio.
///
/// Every operation spawns the process, performs the handshake, runs one
/// request and shuts the process down again, on success and on error. A
/// dropped operation (e.g. a timed-out call) kills the child on drop.
#[derive(Debug, Clone)]
pub struct StdioProvider {
    name: String,
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl StdioProvider {
    pub fn new(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            env: HashMap::new(),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    async fn open(&self) -> Result<ScopedSession, ToolError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Spawn(format!("'{}': {}", self.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Spawn("failed to capture stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Spawn("failed to capture stdout".into()))?;

        match McpSession::initialize(BufReader::new(stdout), stdin).await {
            Ok(session) => Ok(ScopedSession { child, session }),
            Err(e) => {
                let _ = child.kill().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ToolProvider for StdioProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let mut scoped = self.open().await?;
        let result = scoped.session.list_tools().await;
        scoped.close().await;
        result
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let mut scoped = self.open().await?;
        let result = scoped.session.call_tool(name, args).await;
        scoped.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_command_is_spawn_error() {
        let provider = StdioProvider::new("ghost", "/nonexistent/tool-server", vec![]);
        let err = provider.list_tools().await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn(_)));
    }
}

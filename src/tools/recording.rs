//! A scripted tool provider that records every call, for tests and demos.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::errors::ToolError;
use super::traits::{ToolDescriptor, ToolProvider};

/// How a scripted tool answers.
#[derive(Debug, Clone)]
enum Reply {
    /// Same payload every call.
    Fixed(Value),
    /// Payloads in order; the last one repeats.
    Sequence(VecDeque<Value>),
    /// `ToolError::Execution` with this reason.
    Fail(String),
    /// Panics inside the call.
    Panic,
    /// Never answers.
    Hang,
}

#[derive(Default)]
struct Inner {
    tools: Vec<ToolDescriptor>,
    replies: HashMap<String, Reply>,
    calls: Vec<(String, Value)>,
    fail_discovery: Option<String>,
    hang_discovery: bool,
}

/// Tool provider whose answers are scripted per tool name.
#[derive(Clone)]
pub struct RecordingProvider {
    name: String,
    inner: Arc<Mutex<Inner>>,
}

impl RecordingProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn register(self, tool: &str, reply: Reply) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            if !inner.tools.iter().any(|t| t.name == tool) {
                inner.tools.push(ToolDescriptor {
                    name: tool.to_string(),
                    description: format!("{tool} (scripted)"),
                    input_schema: json!({"type": "object"}),
                });
            }
            inner.replies.insert(tool.to_string(), reply);
        }
        self
    }

    /// A tool that always answers `payload`.
    pub fn with_tool(self, tool: &str, payload: Value) -> Self {
        self.register(tool, Reply::Fixed(payload))
    }

    /// A tool that answers `payloads` in order, repeating the last.
    pub fn with_sequence(self, tool: &str, payloads: Vec<Value>) -> Self {
        self.register(tool, Reply::Sequence(payloads.into()))
    }

    /// A tool whose calls fail with an execution error.
    pub fn with_failing_tool(self, tool: &str, reason: &str) -> Self {
        self.register(tool, Reply::Fail(reason.to_string()))
    }

    /// A tool whose calls panic.
    pub fn with_panicking_tool(self, tool: &str) -> Self {
        self.register(tool, Reply::Panic)
    }

    /// A tool whose calls never complete.
    pub fn with_hanging_tool(self, tool: &str) -> Self {
        self.register(tool, Reply::Hang)
    }

    /// Make `list_tools` never complete.
    pub fn hanging_discovery(self) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.hang_discovery = true;
        }
        self
    }

    /// Make `list_tools` fail.
    pub fn failing_discovery(self, reason: &str) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_discovery = Some(reason.to_string());
        }
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.inner
            .lock()
            .map(|i| i.calls.clone())
            .unwrap_or_default()
    }

    /// Arguments of every call to `tool`.
    pub fn calls_to(&self, tool: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == tool)
            .map(|(_, args)| args)
            .collect()
    }
}

#[async_trait]
impl ToolProvider for RecordingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let listed = {
            let inner = self
                .inner
                .lock()
                .map_err(|_| ToolError::transport("provider state poisoned"))?;
            if inner.hang_discovery {
                None
            } else {
                Some(match &inner.fail_discovery {
                    Some(reason) => Err(ToolError::transport(reason.clone())),
                    None => Ok(inner.tools.clone()),
                })
            }
        };
        match listed {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let reply = {
            let mut inner = self
                .inner
                .lock()
                .map_err(|_| ToolError::transport("provider state poisoned"))?;
            inner.calls.push((name.to_string(), args));
            match inner.replies.get_mut(name) {
                None => None,
                Some(Reply::Sequence(queue)) => {
                    let next = if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    };
                    Some(Reply::Fixed(next.unwrap_or(Value::Null)))
                }
                Some(other) => Some(other.clone()),
            }
        };

        match reply {
            None => Err(ToolError::NotAvailable {
                name: name.to_string(),
            }),
            Some(Reply::Fixed(value)) => Ok(value),
            Some(Reply::Fail(reason)) => Err(ToolError::execution(name, reason)),
            Some(Reply::Panic) => panic!("scripted panic in {name}"),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Sequence(_)) => Ok(Value::Null),
        }
    }
}

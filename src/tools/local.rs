//! In-process tool provider.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::errors::ToolError;
use super::traits::{Tool, ToolDescriptor, ToolProvider};

/// Hosts a fixed set of [`Tool`]s inside this process.
pub struct LocalProvider {
    name: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl LocalProvider {
    pub fn new(name: impl Into<String>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }

    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }
}

#[async_trait]
impl ToolProvider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.tools.iter().map(|t| t.descriptor()).collect())
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self.tool(name).ok_or_else(|| ToolError::NotAvailable {
            name: name.to_string(),
        })?;
        tool.execute(args).await
    }
}

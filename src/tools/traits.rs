//! Tool and provider traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ToolError;

/// A tool as advertised by its provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the arguments.
    #[serde(rename = "inputSchema", alias = "input_schema", default)]
    pub input_schema: Value,
}

/// A single tool hosted in this process.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in calls).
    fn name(&self) -> &str;

    /// Human-readable description, shown to the model verbatim.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Tool-level failures are usually reported inside the
    /// payload (`{"success": false, ...}`); `Err` is for failures to run at all.
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// A source of named tools: an in-process set or a separate process.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Provider name, for logs and listings.
    fn name(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError>;

    /// Call a tool and return its decoded payload.
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError>;
}

//! Tool registry: discovery across providers and name-based invocation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::ToolError;
use super::traits::{ToolDescriptor, ToolProvider};

struct Binding {
    descriptor: ToolDescriptor,
    provider: Arc<dyn ToolProvider>,
}

/// A provider that could not be listed during discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedProvider {
    pub name: String,
    pub reason: String,
}

/// Name → provider bindings, built once at startup and read-only after.
pub struct ToolRegistry {
    bindings: HashMap<String, Binding>,
    /// Tool names in registration order.
    order: Vec<String>,
    skipped: Vec<SkippedProvider>,
    call_timeout: Duration,
}

impl ToolRegistry {
    /// List every provider's tools. A provider that fails to list is skipped
    /// with a warning; a tool name claimed by an earlier provider is dropped.
    /// Fails only when no provider contributed any tool.
    pub async fn discover(
        providers: Vec<Arc<dyn ToolProvider>>,
        call_timeout: Duration,
    ) -> Result<Self, ToolError> {
        let mut registry = Self {
            bindings: HashMap::new(),
            order: Vec::new(),
            skipped: Vec::new(),
            call_timeout,
        };

        for provider in providers {
            let listed = tokio::time::timeout(call_timeout, provider.list_tools()).await;
            let tools = match listed {
                Ok(Ok(tools)) => tools,
                Ok(Err(e)) => {
                    warn!("Skipping tool provider '{}': {}", provider.name(), e);
                    registry.skipped.push(SkippedProvider {
                        name: provider.name().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(_) => {
                    warn!(
                        "Skipping tool provider '{}': listing timed out after {:?}",
                        provider.name(),
                        call_timeout
                    );
                    registry.skipped.push(SkippedProvider {
                        name: provider.name().to_string(),
                        reason: "timed out".to_string(),
                    });
                    continue;
                }
            };

            let mut added = 0;
            for descriptor in tools {
                if let Some(existing) = registry.bindings.get(&descriptor.name) {
                    warn!(
                        "Tool '{}' from '{}' already provided by '{}'; keeping the first",
                        descriptor.name,
                        provider.name(),
                        existing.provider.name()
                    );
                    continue;
                }
                registry.order.push(descriptor.name.clone());
                registry.bindings.insert(
                    descriptor.name.clone(),
                    Binding {
                        descriptor,
                        provider: Arc::clone(&provider),
                    },
                );
                added += 1;
            }
            info!("Provider '{}' contributed {} tool(s)", provider.name(), added);
        }

        if registry.bindings.is_empty() {
            return Err(ToolError::NoToolsDiscovered);
        }

        info!(
            "Discovered {} tool(s): {}",
            registry.order.len(),
            registry.order.join(", ")
        );
        Ok(registry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.bindings.get(name).map(|b| &b.descriptor)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.bindings.get(name).map(|b| &b.descriptor))
    }

    pub fn tool_names(&self) -> &[String] {
        &self.order
    }

    /// Name of the provider bound to `tool`.
    pub fn provider_of(&self, tool: &str) -> Option<&str> {
        self.bindings.get(tool).map(|b| b.provider.name())
    }

    pub fn skipped_providers(&self) -> &[SkippedProvider] {
        &self.skipped
    }

    /// Call a tool by name, bounded by the registry's call timeout.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let binding = self.bindings.get(name).ok_or_else(|| ToolError::NotAvailable {
            name: name.to_string(),
        })?;

        info!("Calling tool '{}' on '{}'", name, binding.provider.name());
        debug!("Arguments for '{}': {}", name, args);

        match tokio::time::timeout(self.call_timeout, binding.provider.call_tool(name, args)).await
        {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool: name.to_string(),
                timeout_ms: self.call_timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::RecordingProvider;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_first_registration_wins() {
        let first = RecordingProvider::new("first").with_tool("list_topics", json!(["a"]));
        let second = RecordingProvider::new("second")
            .with_tool("list_topics", json!(["b"]))
            .with_tool("add_topic", json!({"success": true}));

        let registry = ToolRegistry::discover(
            vec![Arc::new(first.clone()), Arc::new(second.clone())],
            TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(registry.tool_names(), ["list_topics", "add_topic"]);
        assert_eq!(registry.provider_of("list_topics"), Some("first"));
        assert_eq!(
            registry.invoke("list_topics", json!({})).await.unwrap(),
            json!(["a"])
        );
        assert!(second.calls_to("list_topics").is_empty());
    }

    #[tokio::test]
    async fn test_failing_provider_is_skipped() {
        let broken = RecordingProvider::new("broken")
            .with_tool("add_paper", json!({}))
            .failing_discovery("connection refused");
        let good = RecordingProvider::new("good").with_tool("list_topics", json!([]));

        let registry = ToolRegistry::discover(vec![Arc::new(broken), Arc::new(good)], TIMEOUT)
            .await
            .unwrap();

        assert!(!registry.contains("add_paper"));
        assert!(registry.contains("list_topics"));
        assert_eq!(registry.skipped_providers().len(), 1);
        assert_eq!(registry.skipped_providers()[0].name, "broken");
    }

    #[tokio::test]
    async fn test_empty_union_is_error() {
        let broken = RecordingProvider::new("broken").failing_discovery("down");
        let empty = RecordingProvider::new("empty");
        let err = ToolRegistry::discover(vec![Arc::new(broken), Arc::new(empty)], TIMEOUT)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ToolError::NoToolsDiscovered));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_available() {
        let p = RecordingProvider::new("p").with_tool("list_topics", json!([]));
        let registry = ToolRegistry::discover(vec![Arc::new(p)], TIMEOUT).await.unwrap();
        let err = registry.invoke("remove_topic", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Tool not available: remove_topic");
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let p = RecordingProvider::new("p").with_failing_tool("fetch_arxiv_paper", "404");
        let registry = ToolRegistry::discover(vec![Arc::new(p)], TIMEOUT).await.unwrap();
        let err = registry
            .invoke("fetch_arxiv_paper", json!({"arxiv_url": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out_during_discovery() {
        let stuck = RecordingProvider::new("stuck")
            .with_tool("summarize_topic", json!({}))
            .hanging_discovery();
        let good = RecordingProvider::new("good").with_tool("list_topics", json!([]));

        let registry = ToolRegistry::discover(
            vec![Arc::new(stuck), Arc::new(good)],
            Duration::from_millis(200),
        )
        .await
        .unwrap();

        assert!(!registry.contains("summarize_topic"));
        assert!(registry.contains("list_topics"));
        assert_eq!(
            registry.skipped_providers(),
            [SkippedProvider {
                name: "stuck".to_string(),
                reason: "timed out".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_hanging_call_times_out() {
        let p = RecordingProvider::new("p").with_hanging_tool("list_topics");
        let registry = ToolRegistry::discover(vec![Arc::new(p.clone())], Duration::from_millis(200))
            .await
            .unwrap();

        let err = registry.invoke("list_topics", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            ToolError::Timeout { ref tool, timeout_ms: 200 } if tool == "list_topics"
        ));
        assert_eq!(err.to_string(), "list_topics timed out after 200ms");
        assert_eq!(p.calls_to("list_topics").len(), 1);
    }
}

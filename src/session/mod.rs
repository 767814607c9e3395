//! One user session: bootstrap, per-turn processing and the REPL loop.

pub mod demo;

pub use demo::{run_demo, DemoOutcome, DemoStep, DEMO_REQUIRED_INTENTS};

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use ulid::Ulid;

use crate::config::OrganizerConfig;
use crate::dispatch::{Confirmer, Dispatcher, ExecutionResult};
use crate::intent::{parse_command, IntentClassifier, IntentSet, CATALOG};
use crate::llm::{self, ModelHandle};
use crate::providers::{build_providers, ProviderContext};
use crate::tools::ToolRegistry;
use crate::ui::{ConsoleInput, Ui};

/// Discover tools from every configured provider.
pub async fn discover_tools(
    config: &OrganizerConfig,
    home: &Path,
    model: ModelHandle,
) -> Result<ToolRegistry> {
    let ctx = Arc::new(ProviderContext::from_config(config, home, model));
    let providers = build_providers(config, home, ctx);
    info!("Discovering tools from {} provider(s)", providers.len());
    ToolRegistry::discover(
        providers,
        Duration::from_secs(config.tool_call_timeout_secs),
    )
    .await
    .context("Tool discovery failed")
}

pub struct Session {
    registry: Arc<ToolRegistry>,
    intents: Arc<IntentSet>,
    classifier: IntentClassifier,
    dispatcher: Dispatcher,
    confirmer: Arc<dyn Confirmer>,
    ui: Ui,
}

impl Session {
    pub fn new(
        registry: Arc<ToolRegistry>,
        model: ModelHandle,
        confirmer: Arc<dyn Confirmer>,
        ui: Ui,
    ) -> Self {
        let intents = Arc::new(IntentSet::resolve(&CATALOG, |name| registry.contains(name)));
        let classifier =
            IntentClassifier::new(Arc::clone(&registry), Arc::clone(&intents), model);
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&intents),
            Arc::clone(&confirmer),
            ui,
        );
        Self {
            registry,
            intents,
            classifier,
            dispatcher,
            confirmer,
            ui,
        }
    }

    /// Build the model handle and registry from configuration.
    pub async fn from_config(
        config: &OrganizerConfig,
        home: &Path,
        confirmer: Arc<dyn Confirmer>,
        ui: Ui,
    ) -> Result<Self> {
        let model = llm::model_from_config(config);
        let registry = discover_tools(config, home, model.clone()).await?;
        for skipped in registry.skipped_providers() {
            ui.warning(&format!(
                "Tool provider '{}' unavailable: {}",
                skipped.name, skipped.reason
            ));
        }
        Ok(Self::new(Arc::new(registry), model, confirmer, ui))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn intents(&self) -> &IntentSet {
        &self.intents
    }

    pub fn ui(&self) -> Ui {
        self.ui
    }

    pub fn natural_language(&self) -> bool {
        self.classifier.model().is_ready()
    }

    /// Process one utterance. With a model, the classifier decides and the
    /// fixed syntax is only a fallback when classification fails. Without
    /// one, the fixed syntax is the only input mode.
    pub async fn handle_input(&self, input: &str) -> ExecutionResult {
        let span = info_span!("turn", id = %Ulid::new());
        async {
            let input = input.trim();

            if self.natural_language() {
                let classification = self.classifier.classify(input).await;
                if !classification.success {
                    if let Some(command) = parse_command(input) {
                        info!("Falling back to command syntax");
                        return self.dispatcher.dispatch(&command).await;
                    }
                }
                return self.dispatcher.dispatch(&classification).await;
            }

            if let Some(command) = parse_command(input) {
                return self.dispatcher.dispatch(&command).await;
            }

            if input.is_empty() {
                let classification = self.classifier.classify(input).await;
                return self.dispatcher.dispatch(&classification).await;
            }

            self.ui.warning(&format!("Unknown command: {input}"));
            self.ui.info("Type 'help' to see available commands.");
            ExecutionResult::failed("unclear", format!("Unknown command: {input}"))
        }
        .instrument(span)
        .await
    }

    /// Read-dispatch loop. Only a confirmed exit or end of input ends it.
    pub async fn run(&self, input: &ConsoleInput) -> Result<()> {
        self.ui.welcome(self.natural_language());

        loop {
            let line = tokio::select! {
                line = input.read_line("> ") => line.context("Failed to read input")?,
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                    }
                    self.ui.blank();
                    self.ui.warning("Use 'exit' or 'quit' to exit gracefully.");
                    continue;
                }
            };

            let Some(line) = line else {
                self.ui.blank();
                self.ui.info("Goodbye!");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let result = self.handle_input(&line).await;
            if result.exit_requested()
                && self.confirmer.confirm("Are you sure you want to exit?").await
            {
                self.ui.info("Goodbye!");
                break;
            }
            self.ui.blank();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ScriptedConfirmer;
    use crate::llm::ScriptedModel;
    use crate::tools::{RecordingProvider, ToolProvider};
    use serde_json::json;

    async fn session(provider: &RecordingProvider, model: ModelHandle) -> Session {
        let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(provider.clone())];
        let registry = ToolRegistry::discover(providers, Duration::from_secs(5))
            .await
            .unwrap();
        Session::new(
            Arc::new(registry),
            model,
            Arc::new(ScriptedConfirmer::default()),
            Ui::silent(),
        )
    }

    #[tokio::test]
    async fn test_fixed_command_without_model() {
        let provider = RecordingProvider::new("db").with_tool("list_topics", json!([]));
        let s = session(&provider, ModelHandle::Uninitialized).await;
        let result = s.handle_input("LIST TOPICS").await;
        assert!(result.success);
        assert_eq!(provider.calls_to("list_topics").len(), 1);
    }

    #[tokio::test]
    async fn test_model_reads_command_lookalikes() {
        let provider = RecordingProvider::new("db")
            .with_tool("add_topic", json!({"success": true, "message": "Added.", "topic_id": 1}));
        let model = ScriptedModel::with_responses([
            r#"{"intent": "add_topic", "parameters": {"topic_name": "computer vision"}, "confidence": "high"}"#,
        ]);
        let s = session(&provider, model.handle()).await;
        let result = s.handle_input("add topic computer vision").await;
        assert!(result.success);
        assert_eq!(model.call_count(), 1);
        assert_eq!(
            provider.calls_to("add_topic"),
            vec![json!({"name": "computer vision", "description": ""})]
        );
    }

    #[tokio::test]
    async fn test_command_syntax_after_failed_classification() {
        let provider = RecordingProvider::new("db").with_tool("list_topics", json!([]));
        let model = ScriptedModel::with_responses(["not json at all"]);
        let s = session(&provider, model.handle()).await;
        let result = s.handle_input("list topics").await;
        assert!(result.success);
        assert_eq!(model.call_count(), 1);
        assert_eq!(provider.calls_to("list_topics").len(), 1);

        // Nothing to fall back to: the failed classification is reported.
        model.push_failure("connection refused");
        let result = s.handle_input("tell me a joke").await;
        assert!(!result.success);
        assert!(result
            .message
            .unwrap()
            .starts_with("Cannot execute - intent parsing failed"));
    }

    #[tokio::test]
    async fn test_free_text_goes_to_model() {
        let provider = RecordingProvider::new("db").with_tool("list_topics", json!([]));
        let model = ScriptedModel::with_responses([
            r#"{"intent": "list_topics", "parameters": {}, "confidence": "high"}"#,
        ]);
        let s = session(&provider, model.handle()).await;
        let result = s.handle_input("what topics do I have?").await;
        assert!(result.success);
        assert_eq!(result.intent, "list_topics");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_free_text_without_model_is_unknown() {
        let provider = RecordingProvider::new("db").with_tool("list_topics", json!([]));
        let s = session(&provider, ModelHandle::Uninitialized).await;
        assert!(!s.natural_language());
        let result = s.handle_input("what topics do I have?").await;
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("Unknown command: what topics do I have?")
        );
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exit_is_only_requested() {
        let provider = RecordingProvider::new("db").with_tool("list_topics", json!([]));
        let s = session(&provider, ModelHandle::Uninitialized).await;
        let result = s.handle_input("quit").await;
        assert!(result.exit_requested());
    }
}

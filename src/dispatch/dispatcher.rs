//! The per-turn state machine: meta intents, confirmation policy, handlers.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::confirm::Confirmer;
use super::handlers::{HandlerError, Handlers};
use crate::intent::catalog::{is_meta, EXIT, HELP, UNCLEAR};
use crate::intent::{Action, Classification, IntentSet};
use crate::tools::ToolRegistry;
use crate::types::Confidence;
use crate::ui::Ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Completed,
    Failed,
    /// The user declined; distinct from a failure.
    Cancelled,
}

/// The outcome of one dispatched turn. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub status: ExecutionStatus,
    pub intent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExecutionResult {
    pub fn completed(intent: impl Into<String>, result: Value) -> Self {
        Self {
            success: true,
            status: ExecutionStatus::Completed,
            intent: intent.into(),
            result: Some(result),
            message: None,
        }
    }

    pub fn failed(intent: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: ExecutionStatus::Failed,
            intent: intent.into(),
            result: None,
            message: Some(message.into()),
        }
    }

    pub fn cancelled(intent: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: ExecutionStatus::Cancelled,
            intent: intent.into(),
            result: None,
            message: Some(message.into()),
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The turn asked to end the session. The caller decides whether to.
    pub fn exit_requested(&self) -> bool {
        self.success && self.intent == EXIT
    }
}

/// Routes classifications to handlers under the confirmation policy.
pub struct Dispatcher {
    intents: Arc<IntentSet>,
    confirmer: Arc<dyn Confirmer>,
    handlers: Handlers,
    ui: Ui,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        intents: Arc<IntentSet>,
        confirmer: Arc<dyn Confirmer>,
        ui: Ui,
    ) -> Self {
        let handlers = Handlers::new(registry, Arc::clone(&confirmer), ui);
        Self {
            intents,
            confirmer,
            handlers,
            ui,
        }
    }

    /// Run one classified turn to completion. Every path ends in an
    /// `ExecutionResult`; nothing here returns an error or panics outward.
    pub async fn dispatch(&self, classification: &Classification) -> ExecutionResult {
        let intent = classification.intent.as_str();

        if !classification.success {
            let message = classification
                .message
                .as_deref()
                .unwrap_or("unknown error");
            warn!("Classification failed: {}", message);
            self.ui.warning(&format!("Could not understand the request: {message}"));
            return ExecutionResult::failed(
                intent,
                format!("Cannot execute - intent parsing failed: {message}"),
            );
        }

        match intent {
            UNCLEAR => {
                self.ui.warning("I'm not sure what you want to do.");
                self.ui
                    .info("Could you try rephrasing? Type 'help' for commands.");
                return ExecutionResult::failed(intent, "Unclear intent");
            }
            HELP => {
                self.ui.help();
                return ExecutionResult::completed(intent, Value::Null)
                    .with_message("Help displayed");
            }
            EXIT => {
                return ExecutionResult::completed(intent, Value::Null)
                    .with_message("Exit requested");
            }
            _ => {}
        }

        if is_meta(intent) || !self.intents.is_enabled(intent) {
            return self.no_handler(intent);
        }

        let action = match Action::from_classification(intent, &classification.parameters) {
            Ok(action) => action,
            Err(e) => {
                self.ui.error(&e.to_string());
                return ExecutionResult::failed(intent, e.to_string());
            }
        };
        // `list_papers` with a topic narrows to an intent with its own tools.
        if !self.intents.is_enabled(action.intent()) {
            return self.no_handler(action.intent());
        }

        let explanation = action.explain(classification.confidence);
        match classification.confidence {
            Confidence::Low => {
                self.ui.warning(&format!("I think you want to: {explanation}"));
                if !self.confirmer.confirm("Is this correct?").await {
                    self.ui.info("Cancelled. Please try again.");
                    return ExecutionResult::cancelled(
                        intent,
                        "User cancelled low-confidence action",
                    );
                }
            }
            Confidence::Medium => self.ui.info(&format!("Understanding: {explanation}")),
            Confidence::High => {}
        }

        self.execute(action).await
    }

    fn no_handler(&self, intent: &str) -> ExecutionResult {
        error!("No handler for intent '{}'", intent);
        self.ui.error(&format!("No handler for intent: {intent}"));
        ExecutionResult::failed(intent, format!("No handler for intent: {intent}"))
    }

    /// Run the handler in its own task so that a panic becomes a failed
    /// result instead of ending the session.
    async fn execute(&self, action: Action) -> ExecutionResult {
        let intent = action.intent();
        info!("Executing {}", intent);

        let handlers = self.handlers.clone();
        let outcome = tokio::spawn(async move { handlers.run(action).await }).await;

        match outcome {
            Ok(Ok(result)) => ExecutionResult::completed(intent, result),
            Ok(Err(HandlerError::Cancelled(message))) => ExecutionResult::cancelled(intent, message),
            Ok(Err(e)) => {
                warn!("{} failed: {}", intent, e);
                self.ui.error(&e.to_string());
                ExecutionResult::failed(intent, e.to_string())
            }
            Err(join_error) => {
                error!("Handler for {} aborted: {}", intent, join_error);
                self.ui.error("Execution error: the handler stopped unexpectedly");
                ExecutionResult::failed(intent, format!("Execution error: {join_error}"))
            }
        }
    }
}

//! Natural-language input to a structured, schema-constrained intent.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::catalog::{IntentSet, META_INTENTS, UNCLEAR};
use super::schema::build_schema;
use crate::agents::{generate_structured, StructuredOutput};
use crate::llm::{ModelHandle, SamplingParams};
use crate::tools::ToolRegistry;
use crate::types::Confidence;

const PROMPT_TEMPLATE: &str = r#"You are an intelligent assistant that understands user queries for a research paper management system.

**User Query:** "{user_input}"

**Available Actions:**
{tool_descriptions}

{special_descriptions}

**Instructions:**
1. Analyze the user query carefully
2. Choose the most suitable intent from the list
3. Extract parameters mentioned in the request
4. Set confidence: high (very clear), medium (somewhat clear), low (ambiguous)
5. Respond with strictly valid JSON that matches the schema
6. Use 'unclear' only if no action fits
"#;

/// One classified utterance. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub success: bool,
    pub intent: String,
    pub parameters: BTreeMap<String, String>,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl Classification {
    /// The safe fallback: unclear, low confidence, no parameters.
    pub fn failure(message: impl Into<String>, raw_response: Option<String>) -> Self {
        Self {
            success: false,
            intent: UNCLEAR.to_string(),
            parameters: BTreeMap::new(),
            confidence: Confidence::Low,
            message: Some(message.into()),
            raw_response,
        }
    }

    /// A successful classification with the given fields.
    pub fn new(
        intent: impl Into<String>,
        parameters: BTreeMap<String, String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            success: true,
            intent: intent.into(),
            parameters,
            confidence,
            message: None,
            raw_response: None,
        }
    }

    /// Read a decoded model reply. Absent fields fall back to
    /// `unclear` / `{}` / `low`; non-string scalar parameters are stringified.
    pub fn from_model_output(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::failure(
                "Error during intent parsing: expected a JSON object",
                Some(value.to_string()),
            );
        };

        let intent = obj
            .get("intent")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNCLEAR);

        let parameters = obj
            .get("parameters")
            .and_then(Value::as_object)
            .map(|params| {
                params
                    .iter()
                    .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
                    .collect()
            })
            .unwrap_or_default();

        let confidence = obj
            .get("confidence")
            .and_then(Value::as_str)
            .map(Confidence::parse_lenient)
            .unwrap_or_default();

        Self::new(intent, parameters, confidence)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Classifies utterances against the intents enabled at startup.
pub struct IntentClassifier {
    registry: Arc<ToolRegistry>,
    intents: Arc<IntentSet>,
    model: ModelHandle,
    schema: Value,
}

impl IntentClassifier {
    pub fn new(registry: Arc<ToolRegistry>, intents: Arc<IntentSet>, model: ModelHandle) -> Self {
        let schema = build_schema(intents.names());
        info!(
            "Intent classifier ready with {} intent(s): {}",
            intents.names().len(),
            intents.names().join(", ")
        );
        Self {
            registry,
            intents,
            model,
            schema,
        }
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Render the classification prompt. Tool descriptions come from the
    /// registry, so the prompt only mentions what can actually be called.
    pub fn compose_prompt(&self, user_input: &str) -> String {
        let tool_lines: Vec<String> = self
            .intents
            .actionable()
            .iter()
            .map(|def| {
                let params = if def.parameters.is_empty() {
                    "none".to_string()
                } else {
                    def.parameters.join(", ")
                };
                let tools: Vec<String> = def
                    .tools()
                    .filter_map(|name| self.registry.descriptor(name))
                    .map(|d| format!("{}: {}", d.name, d.description))
                    .collect();
                let tools = if tools.is_empty() {
                    "No registered tools".to_string()
                } else {
                    tools.join("; ")
                };
                format!(
                    "- {}: {} (Parameters: {}) (Tools: {})",
                    def.name, def.description, params, tools
                )
            })
            .collect();

        let tool_descriptions = if tool_lines.is_empty() {
            "- No tool-backed actions available.".to_string()
        } else {
            tool_lines.join("\n")
        };

        let mut special_descriptions = String::from("**Special Commands:**");
        for meta in META_INTENTS
            .iter()
            .filter(|m| self.intents.is_enabled(m.name))
        {
            special_descriptions.push_str(&format!("\n- {}: {}", meta.name, meta.description));
        }

        PROMPT_TEMPLATE
            .replace("{tool_descriptions}", &tool_descriptions)
            .replace("{special_descriptions}", &special_descriptions)
            .replace("{user_input}", user_input)
            .trim_end()
            .to_string()
    }

    /// Classify one utterance. Never fails: every error collapses to an
    /// unclear, low-confidence result carrying a message.
    pub async fn classify(&self, user_input: &str) -> Classification {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Classification::failure("Empty input", None);
        }

        let prompt = self.compose_prompt(user_input);
        debug!("Classifier prompt is {} chars", prompt.len());

        let classification = match generate_structured(
            &self.model,
            &prompt,
            &self.schema,
            &SamplingParams::ROUTING,
        )
        .await
        {
            StructuredOutput::Parsed(value) => Classification::from_model_output(&value),
            StructuredOutput::Undecodable { message, raw } => Classification::failure(
                format!("Failed to parse LLM response: {message}"),
                Some(raw),
            ),
            StructuredOutput::Failed { message } => {
                Classification::failure(format!("Error during intent parsing: {message}"), None)
            }
        };

        info!(
            "Classified as '{}' ({} confidence)",
            classification.intent, classification.confidence
        );
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::catalog::CATALOG;
    use crate::llm::ScriptedModel;
    use crate::tools::{RecordingProvider, ToolProvider};
    use serde_json::json;
    use std::time::Duration;

    async fn classifier(tools: &[&str], model: &ScriptedModel) -> IntentClassifier {
        let mut provider = RecordingProvider::new("research-db");
        for tool in tools {
            provider = provider.with_tool(tool, json!([]));
        }
        let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(provider)];
        let registry = ToolRegistry::discover(providers, Duration::from_secs(5))
            .await
            .unwrap();
        let intents = IntentSet::resolve(&CATALOG, |name| registry.contains(name));
        IntentClassifier::new(Arc::new(registry), Arc::new(intents), model.handle())
    }

    #[tokio::test]
    async fn test_empty_input_skips_model() {
        let model = ScriptedModel::new();
        let c = classifier(&["list_topics"], &model).await;
        for input in ["", "   \t "] {
            let result = c.classify(input).await;
            assert!(!result.success);
            assert_eq!(result.intent, "unclear");
            assert_eq!(result.confidence, Confidence::Low);
            assert_eq!(result.message.as_deref(), Some("Empty input"));
        }
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_reply_and_routing_sampling() {
        let model = ScriptedModel::with_responses([
            r#"{"intent": "remove_topic", "parameters": {"topic_name": "nlp"}, "confidence": "medium"}"#,
        ]);
        let c = classifier(&["remove_topic"], &model).await;
        let result = c.classify("drop the nlp topic").await;
        assert!(result.success);
        assert_eq!(result.intent, "remove_topic");
        assert_eq!(result.param("topic_name"), Some("nlp"));
        assert_eq!(result.confidence, Confidence::Medium);

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].sampling, SamplingParams::ROUTING);
        assert_eq!(
            calls[0].schema["properties"]["intent"]["enum"],
            json!(["remove_topic", "exit", "help", "unclear"])
        );
    }

    #[tokio::test]
    async fn test_undecodable_reply_keeps_raw_text() {
        let model = ScriptedModel::with_responses(["I think you want topics"]);
        let c = classifier(&["list_topics"], &model).await;
        let result = c.classify("topics?").await;
        assert!(!result.success);
        assert_eq!(result.intent, "unclear");
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.raw_response.as_deref(), Some("I think you want topics"));
        assert!(result
            .message
            .unwrap()
            .starts_with("Failed to parse LLM response:"));
    }

    #[tokio::test]
    async fn test_missing_fields_default() {
        let model = ScriptedModel::with_responses([r#"{"intent": "list_topics"}"#, r#"{}"#]);
        let c = classifier(&["list_topics"], &model).await;

        let result = c.classify("topics").await;
        assert!(result.success);
        assert_eq!(result.intent, "list_topics");
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.parameters.is_empty());

        let result = c.classify("hmm").await;
        assert_eq!(result.intent, "unclear");
    }

    #[tokio::test]
    async fn test_model_failure_is_unclear() {
        let model = ScriptedModel::new();
        model.push_failure("connection refused");
        let c = classifier(&["list_topics"], &model).await;
        let result = c.classify("topics").await;
        assert!(!result.success);
        assert_eq!(result.intent, "unclear");
        assert!(result
            .message
            .unwrap()
            .starts_with("Error during intent parsing:"));
    }

    #[tokio::test]
    async fn test_prompt_lists_only_enabled_intents() {
        let model = ScriptedModel::new();
        let c = classifier(&["list_topics", "get_all_papers"], &model).await;
        let prompt = c.compose_prompt("show papers");
        assert!(prompt.contains("**User Query:** \"show papers\""));
        assert!(prompt.contains(
            "- list_topics: Show all stored topics. (Parameters: none) (Tools: list_topics: list_topics (scripted))"
        ));
        assert!(prompt.contains("- list_papers: List every paper stored in the database."));
        assert!(!prompt.contains("- add_topic:"));
        assert!(prompt.contains("**Special Commands:**\n- help: Show a help message"));
        assert!(prompt.ends_with("6. Use 'unclear' only if no action fits"));
    }

    #[test]
    fn test_scalar_parameters_are_stringified() {
        let c = Classification::from_model_output(&json!({
            "intent": "add_paper",
            "parameters": {"arxiv_url": 1706.03762, "topic_name": "  ", "extra": null},
            "confidence": "high"
        }));
        assert_eq!(c.param("arxiv_url"), Some("1706.03762"));
        assert!(c.param("topic_name").is_none());
        assert!(c.param("extra").is_none());

        let c = Classification::from_model_output(&json!(["list_topics"]));
        assert!(!c.success);
        assert_eq!(c.intent, "unclear");
    }
}

//! The `summarize_topic` tool, backed by the summarizer agent.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{str_arg, ProviderContext};
use crate::agents::{PaperExcerpt, SummarizerAgent};
use crate::tools::{Tool, ToolError};

pub struct SummarizeTopic {
    ctx: Arc<ProviderContext>,
}

impl SummarizeTopic {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }
}

fn rejected(message: impl Into<String>, raw_response: Option<String>) -> Value {
    let mut payload = json!({
        "success": false,
        "message": message.into(),
        "summary": null,
    });
    if let Some(raw) = raw_response {
        payload["raw_response"] = Value::String(raw);
    }
    payload
}

#[async_trait]
impl Tool for SummarizeTopic {
    fn name(&self) -> &str {
        "summarize_topic"
    }

    fn description(&self) -> &str {
        "Use the LLM SummarizerAgent to create a structured summary for a collection of papers."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "papers": {
                    "type": "array",
                    "description": "List of papers to summarize (includes title, abstract, etc.).",
                    "items": {"type": "object"}
                },
                "topic_name": {
                    "type": "string",
                    "description": "Optional topic label for context.",
                    "default": ""
                }
            },
            "required": ["papers"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let Some(papers) = args.get("papers").filter(|p| p.is_array()) else {
            return Ok(rejected("Missing argument: papers", None));
        };
        let papers: Vec<PaperExcerpt> = match serde_json::from_value(papers.clone()) {
            Ok(papers) => papers,
            Err(e) => return Ok(rejected(format!("Invalid papers: {e}"), None)),
        };
        let topic_name = str_arg(&args, "topic_name").unwrap_or("");

        if !self.ctx.model().is_ready() {
            return Ok(rejected(
                "LLM is not initialized. Configure [llm] before summarizing topics.",
                None,
            ));
        }

        let agent = SummarizerAgent::new(self.ctx.model().clone());
        match agent.summarize(&papers, topic_name).await {
            Ok(summary) => Ok(json!({
                "success": true,
                "topic_name": topic_name,
                "summary": summary,
                "paper_count": papers.len(),
            })),
            Err(failure) => Ok(rejected(failure.message, failure.raw_response)),
        }
    }
}

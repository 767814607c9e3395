//! The `extract_topics` tool, backed by the topic agent.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{str_arg, ProviderContext};
use crate::agents::TopicAgent;
use crate::tools::{Tool, ToolError};

pub struct ExtractTopics {
    ctx: Arc<ProviderContext>,
}

impl ExtractTopics {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }
}

fn rejected(message: impl Into<String>, raw_response: Option<String>) -> Value {
    let mut payload = json!({
        "success": false,
        "message": message.into(),
        "extracted_topics": [],
    });
    if let Some(raw) = raw_response {
        payload["raw_response"] = Value::String(raw);
    }
    payload
}

#[async_trait]
impl Tool for ExtractTopics {
    fn name(&self) -> &str {
        "extract_topics"
    }

    fn description(&self) -> &str {
        "Use the LLM-powered TopicAgent to extract applicable topics for a paper."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Title of the research paper"},
                "abstract": {"type": "string", "description": "Abstract of the research paper"}
            },
            "required": ["title", "abstract"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let title = str_arg(&args, "title").unwrap_or("").trim();
        let abstract_text = str_arg(&args, "abstract").unwrap_or("").trim();

        if title.is_empty() {
            return Ok(rejected("Paper title is required", None));
        }
        if abstract_text.is_empty() {
            return Ok(rejected("Paper abstract is required", None));
        }
        if !self.ctx.model().is_ready() {
            return Ok(rejected(
                "LLM is not initialized. Configure [llm] before extracting topics.",
                None,
            ));
        }

        let topics = {
            let db = self.ctx.database().await?;
            let db = db.lock().await;
            match db.list_topics() {
                Ok(topics) => topics,
                Err(e) => return Ok(rejected(format!("Topic extraction failed: {e:#}"), None)),
            }
        };

        let agent = TopicAgent::new(self.ctx.model().clone());
        match agent.suggest(title, abstract_text, &topics).await {
            Ok(names) => Ok(json!({"success": true, "extracted_topics": names})),
            Err(failure) => Ok(rejected(failure.message, failure.raw_response)),
        }
    }
}

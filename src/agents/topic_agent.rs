//! Suggests which existing topics a paper belongs to.

use serde_json::{json, Value};
use tracing::info;

use super::structured::{generate_structured, truncate_chars, AgentFailure};
use crate::llm::{ModelHandle, SamplingParams};
use crate::types::Topic;

const ABSTRACT_LIMIT: usize = 500;

const PROMPT_TEMPLATE: &str = "You are an expert research paper classifier. Your task is to analyze a research paper and suggest which topics from the available list are most applicable.

**Paper Information:**
Title: {title}

Abstract: {abstract}

**Available Topics:**
{topics_list}

**Instructions:**
1. Carefully read the paper's title and abstract
2. Consider each available topic and its description
3. Suggest ONLY the topics that are clearly relevant to this paper
4. If no topics are applicable, return an empty list
5. Focus on quality over quantity - only suggest topics you're confident about

Analyze the paper and respond with the applicable topics in JSON format.";

pub struct TopicAgent {
    model: ModelHandle,
}

impl TopicAgent {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    /// Output schema: an array drawn from the existing topic names only.
    pub fn schema(topic_names: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": {
                "topics": {
                    "type": "array",
                    "items": {"type": "string", "enum": topic_names}
                }
            },
            "required": ["topics"]
        })
    }

    pub fn compose_prompt(title: &str, abstract_text: &str, topics: &[Topic]) -> String {
        let topics_list = topics
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let description = if t.description.trim().is_empty() {
                    "No description"
                } else {
                    t.description.as_str()
                };
                format!("{}. **{}**: {}", i + 1, t.name, description)
            })
            .collect::<Vec<_>>()
            .join("\n");

        PROMPT_TEMPLATE
            .replace("{title}", title)
            .replace("{abstract}", &truncate_chars(abstract_text, ABSTRACT_LIMIT, ""))
            .replace("{topics_list}", &topics_list)
    }

    /// Topic names for the paper. Anything the model returns that is not an
    /// existing topic is dropped.
    pub async fn suggest(
        &self,
        title: &str,
        abstract_text: &str,
        topics: &[Topic],
    ) -> Result<Vec<String>, AgentFailure> {
        if topics.is_empty() {
            return Err(AgentFailure::new("No topics available for classification"));
        }

        let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
        let prompt = Self::compose_prompt(title, abstract_text, topics);
        let value = generate_structured(
            &self.model,
            &prompt,
            &Self::schema(&names),
            &SamplingParams::TOPIC_SUGGESTION,
        )
        .await
        .into_result("Error during topic analysis")?;

        let suggested: Vec<String> = value
            .get("topics")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|name| names.contains(name))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        info!("Topic agent suggested {} topic(s) for '{}'", suggested.len(), title);
        Ok(suggested)
    }
}

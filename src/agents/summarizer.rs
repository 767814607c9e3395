//! Multi-paper topic summaries.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::structured::{generate_structured, truncate_chars, AgentFailure};
use crate::llm::{ModelHandle, SamplingParams};

const ABSTRACT_LIMIT: usize = 500;

const PROMPT_TEMPLATE: &str = "You are a research analyst. Summarize ONLY the papers listed below on topic \"{topic_name}\".

**Papers to Analyze ({num_papers} total):**
{papers_list}

**CRITICAL INSTRUCTIONS:**
1. Summarize ONLY the {num_papers} papers listed above - DO NOT mention or invent other papers
2. Use the EXACT titles from the list above
3. Write a brief overview (2-3 sentences) about what THESE papers cover
4. List 3-5 key findings from THESE specific papers
5. For each paper, write ONE concise sentence about its main point (max 150 characters)
6. Be factual and concise - stick to what's in the abstracts

Response format: JSON only, no additional text.";

/// The parts of a paper the summarizer reads. Lenient so that payloads from
/// any provider deserialize: absent and `null` fields both fall back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperExcerpt {
    #[serde(default = "unknown_title", deserialize_with = "title_or_unknown")]
    pub title: String,
    #[serde(
        rename = "abstract",
        default = "no_abstract",
        deserialize_with = "abstract_or_none"
    )]
    pub abstract_text: String,
}

fn unknown_title() -> String {
    "Unknown Title".into()
}

fn no_abstract() -> String {
    "No abstract available".into()
}

fn title_or_unknown<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(unknown_title))
}

fn abstract_or_none<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(no_abstract))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperKeyPoint {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub key_point: String,
}

/// Structured summary of a set of papers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub papers_summary: Vec<PaperKeyPoint>,
}

impl TopicSummary {
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "overview": {
                    "type": "string",
                    "description": "Brief overview (2-3 sentences) of what these specific papers cover"
                },
                "key_findings": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Key findings from the provided papers (3-5 items)",
                    "maxItems": 5
                },
                "papers_summary": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string", "description": "Exact paper title from input"},
                            "key_point": {"type": "string", "description": "One sentence main point (max 150 chars)"}
                        },
                        "required": ["title", "key_point"]
                    },
                    "description": "Brief summary of each provided paper"
                }
            },
            "required": ["overview", "key_findings", "papers_summary"]
        })
    }

    /// Markdown for display.
    pub fn to_markdown(&self) -> String {
        let mut lines = Vec::new();

        if !self.overview.is_empty() {
            lines.push("## Overview".to_string());
            lines.push(self.overview.clone());
            lines.push(String::new());
        }

        if !self.key_findings.is_empty() {
            lines.push("## Key Findings".to_string());
            for finding in &self.key_findings {
                lines.push(format!("• {finding}"));
            }
            lines.push(String::new());
        }

        if !self.papers_summary.is_empty() {
            lines.push("## Papers".to_string());
            for paper in &self.papers_summary {
                let title = if paper.title.is_empty() { "Unknown" } else { &paper.title };
                let point = if paper.key_point.is_empty() { "N/A" } else { &paper.key_point };
                lines.push(format!("**{title}**"));
                lines.push(format!("  {point}"));
                lines.push(String::new());
            }
        }

        if lines.is_empty() {
            return "No summary available.".to_string();
        }
        lines.join("\n")
    }
}

pub struct SummarizerAgent {
    model: ModelHandle,
}

impl SummarizerAgent {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    pub fn compose_prompt(papers: &[PaperExcerpt], topic_name: &str) -> String {
        let papers_list = papers
            .iter()
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "{}. **{}**\n   Abstract: {}\n",
                    i + 1,
                    p.title,
                    truncate_chars(&p.abstract_text, ABSTRACT_LIMIT, "...")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let topic_name = if topic_name.trim().is_empty() {
            "Unknown Topic"
        } else {
            topic_name
        };

        PROMPT_TEMPLATE
            .replace("{topic_name}", topic_name)
            .replace("{num_papers}", &papers.len().to_string())
            .replace("{papers_list}", &papers_list)
    }

    pub async fn summarize(
        &self,
        papers: &[PaperExcerpt],
        topic_name: &str,
    ) -> Result<TopicSummary, AgentFailure> {
        if papers.is_empty() {
            return Err(AgentFailure::new(format!(
                "No papers found for topic '{topic_name}'."
            )));
        }

        let prompt = Self::compose_prompt(papers, topic_name);
        let value = generate_structured(
            &self.model,
            &prompt,
            &TopicSummary::schema(),
            &SamplingParams::SUMMARY,
        )
        .await
        .into_result("Error during summarization")?;

        let summary: TopicSummary =
            serde_json::from_value(value.clone()).map_err(|e| AgentFailure {
                message: format!("Failed to parse LLM response: {e}"),
                raw_response: Some(value.to_string()),
            })?;

        info!("Summarized {} paper(s) for '{}'", papers.len(), topic_name);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;

    fn excerpt(title: &str, abstract_text: &str) -> PaperExcerpt {
        PaperExcerpt {
            title: title.into(),
            abstract_text: abstract_text.into(),
        }
    }

    #[test]
    fn test_excerpt_defaults() {
        let e: PaperExcerpt = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(e.title, "Unknown Title");
        assert_eq!(e.abstract_text, "No abstract available");
    }

    #[test]
    fn test_null_fields_fall_back() {
        let papers: Vec<PaperExcerpt> = serde_json::from_value(json!([
            {"title": "Attention", "abstract": null},
            {"title": null, "abstract": "Text"}
        ]))
        .unwrap();
        assert_eq!(papers[0].title, "Attention");
        assert_eq!(papers[0].abstract_text, "No abstract available");
        assert_eq!(papers[1].title, "Unknown Title");
        assert_eq!(papers[1].abstract_text, "Text");
    }

    #[test]
    fn test_prompt_truncates_with_ellipsis() {
        let prompt = SummarizerAgent::compose_prompt(&[excerpt("A", &"y".repeat(600))], "nlp");
        assert!(prompt.contains(&format!("{}...", "y".repeat(500))));
        assert!(prompt.contains("(1 total)"));
        assert!(prompt.contains("topic \"nlp\""));
    }

    #[test]
    fn test_markdown_rendering() {
        let summary = TopicSummary {
            overview: "Two papers on attention.".into(),
            key_findings: vec!["Attention scales".into()],
            papers_summary: vec![PaperKeyPoint {
                title: "Attention".into(),
                key_point: "Transformers".into(),
            }],
        };
        let md = summary.to_markdown();
        assert!(md.starts_with("## Overview\nTwo papers on attention."));
        assert!(md.contains("## Key Findings\n• Attention scales"));
        assert!(md.contains("## Papers\n**Attention**\n  Transformers"));
        assert_eq!(TopicSummary::default().to_markdown(), "No summary available.");
    }

    #[tokio::test]
    async fn test_summarize_uses_deterministic_sampling() {
        let model = ScriptedModel::with_responses([
            r#"{"overview": "o", "key_findings": ["k"], "papers_summary": []}"#,
        ]);
        let agent = SummarizerAgent::new(model.handle());
        let summary = agent.summarize(&[excerpt("A", "B")], "nlp").await.unwrap();
        assert_eq!(summary.overview, "o");
        assert!(model.calls()[0].sampling.deterministic);
        assert_eq!(model.calls()[0].sampling.max_tokens, 1024);
    }

    #[tokio::test]
    async fn test_no_papers_skips_model() {
        let model = ScriptedModel::new();
        let agent = SummarizerAgent::new(model.handle());
        let err = agent.summarize(&[], "nlp").await.unwrap_err();
        assert_eq!(err.message, "No papers found for topic 'nlp'.");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_reported() {
        let model = ScriptedModel::new();
        model.push_failure("connection refused");
        let agent = SummarizerAgent::new(model.handle());
        let err = agent.summarize(&[excerpt("A", "B")], "nlp").await.unwrap_err();
        assert!(err.message.starts_with("Error during summarization"));
        assert!(err.raw_response.is_none());
    }
}

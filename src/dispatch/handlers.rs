//! Per-intent handlers. Each turns a typed action into tool calls.

use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::confirm::Confirmer;
use crate::agents::TopicSummary;
use crate::intent::Action;
use crate::tools::{ToolError, ToolRegistry};
use crate::ui::Ui;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// The user declined a confirmation.
    #[error("{0}")]
    Cancelled(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The tool ran and reported `success: false`.
    #[error("{message}")]
    Rejected { tool: String, message: String },

    #[error("Unexpected response from {tool}")]
    UnexpectedResponse { tool: String },

    #[error("No papers found for topic '{topic}'")]
    NoPapers { topic: String },
}

/// Accept a `{success: true, ...}` payload.
fn expect_success(tool: &str, payload: Value) -> Result<Value, HandlerError> {
    match payload.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(payload),
        Some(false) => Err(HandlerError::Rejected {
            tool: tool.to_string(),
            message: payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{tool} reported a failure")),
        }),
        None => Err(HandlerError::UnexpectedResponse {
            tool: tool.to_string(),
        }),
    }
}

/// Accept a listing. A failure payload is a rejection; anything else that
/// is not an array is a protocol violation.
fn expect_list(tool: &str, payload: Value) -> Result<Vec<Value>, HandlerError> {
    match payload {
        Value::Array(items) => Ok(items),
        other if other.get("success").is_some() => {
            expect_success(tool, other)?;
            Err(HandlerError::UnexpectedResponse {
                tool: tool.to_string(),
            })
        }
        _ => Err(HandlerError::UnexpectedResponse {
            tool: tool.to_string(),
        }),
    }
}

fn text<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Everything a handler needs. Cloned into the task that runs it.
#[derive(Clone)]
pub struct Handlers {
    registry: Arc<ToolRegistry>,
    confirmer: Arc<dyn Confirmer>,
    ui: Ui,
}

impl Handlers {
    pub fn new(registry: Arc<ToolRegistry>, confirmer: Arc<dyn Confirmer>, ui: Ui) -> Self {
        Self {
            registry,
            confirmer,
            ui,
        }
    }

    pub async fn run(&self, action: Action) -> Result<Value, HandlerError> {
        match action {
            Action::AddTopic { name, description } => {
                self.add_topic(&name, description.as_deref()).await
            }
            Action::ListTopics => self.list_topics().await,
            Action::RemoveTopic { name } => self.remove_topic(&name).await,
            Action::AddPaper { arxiv_url } => self.add_paper(&arxiv_url).await,
            Action::ListPapers => self.list_papers(None).await,
            Action::ListPapersByTopic { topic_name } => self.list_papers(Some(&topic_name)).await,
            Action::SummarizeTopic { topic_name } => self.summarize_topic(&topic_name).await,
        }
    }

    async fn add_topic(&self, name: &str, description: Option<&str>) -> Result<Value, HandlerError> {
        self.ui.step(&format!("Adding topic '{name}'..."));
        let payload = self
            .registry
            .invoke(
                "add_topic",
                json!({"name": name, "description": description.unwrap_or("")}),
            )
            .await?;
        let payload = expect_success("add_topic", payload)?;
        self.ui.success(text(&payload, "message"));
        Ok(payload)
    }

    async fn list_topics(&self) -> Result<Value, HandlerError> {
        let payload = self.registry.invoke("list_topics", json!({})).await?;
        let topics = expect_list("list_topics", payload)?;
        self.ui.topics(&topics);
        Ok(Value::Array(topics))
    }

    async fn remove_topic(&self, name: &str) -> Result<Value, HandlerError> {
        if !self
            .confirmer
            .confirm(&format!("Remove topic '{name}'?"))
            .await
        {
            self.ui.info("Cancelled.");
            return Err(HandlerError::Cancelled("Cancelled by user".to_string()));
        }
        let payload = self
            .registry
            .invoke("remove_topic", json!({"name": name}))
            .await?;
        let payload = expect_success("remove_topic", payload)?;
        self.ui.success(text(&payload, "message"));
        Ok(payload)
    }

    /// Fetch, store, then tag. Fetching and storing are hard failures; topic
    /// extraction and linking only degrade the result.
    async fn add_paper(&self, arxiv_url: &str) -> Result<Value, HandlerError> {
        self.ui.step("Fetching paper from ArXiv...");
        let fetched = self
            .registry
            .invoke("fetch_arxiv_paper", json!({"arxiv_url": arxiv_url}))
            .await?;
        let mut fetched = expect_success("fetch_arxiv_paper", fetched)?;
        if let Some(obj) = fetched.as_object_mut() {
            obj.remove("success");
        }

        let title = text(&fetched, "title").to_string();
        let abstract_text = text(&fetched, "abstract").to_string();
        if title.is_empty() {
            return Err(HandlerError::UnexpectedResponse {
                tool: "fetch_arxiv_paper".to_string(),
            });
        }
        let canonical_url = match text(&fetched, "arxiv_url") {
            "" => arxiv_url.to_string(),
            url => url.to_string(),
        };
        self.ui.success(&format!("Retrieved: {title}"));

        self.ui.step("Adding paper to database...");
        let added = self
            .registry
            .invoke(
                "add_paper",
                json!({"title": title, "arxiv_url": canonical_url, "abstract": abstract_text}),
            )
            .await?;
        let added = expect_success("add_paper", added)?;
        let paper_id = added
            .get("paper_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| HandlerError::UnexpectedResponse {
                tool: "add_paper".to_string(),
            })?;
        self.ui
            .success(&format!("Added paper to database (ID: {paper_id})"));

        let extracted = self.extract_topics(&title, &abstract_text).await;
        let linked = if extracted.is_empty() {
            Vec::new()
        } else {
            self.link_topics(paper_id, &extracted).await
        };

        self.ui.article_card(&title, &abstract_text, &linked);
        Ok(json!({
            "paper_id": paper_id,
            "paper_data": fetched,
            "extracted_topics": extracted,
            "linked_topics": linked,
        }))
    }

    async fn extract_topics(&self, title: &str, abstract_text: &str) -> Vec<String> {
        if !self.registry.contains("extract_topics") {
            self.ui.info("Topic extraction tool not available.");
            return Vec::new();
        }

        self.ui.step("Extracting paper topics...");
        let payload = match self
            .registry
            .invoke(
                "extract_topics",
                json!({"title": title, "abstract": abstract_text}),
            )
            .await
            .map_err(HandlerError::from)
            .and_then(|p| expect_success("extract_topics", p))
        {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Topic extraction failed, paper stays untagged: {}", e);
                self.ui.warning(&format!("Topic extraction failed: {e}"));
                return Vec::new();
            }
        };

        let topics: Vec<String> = payload
            .get("extracted_topics")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if topics.is_empty() {
            self.ui.info("No matching topics found.");
        } else {
            self.ui
                .info(&format!("Detected topics: {}", topics.join(", ")));
        }
        topics
    }

    /// Resolve candidate names against a fresh topic listing and link the
    /// matches. Returns the names actually linked.
    async fn link_topics(&self, paper_id: i64, candidates: &[String]) -> Vec<String> {
        if !self.registry.contains("link_paper_to_topics") || !self.registry.contains("list_topics")
        {
            warn!("Topic linking tools not available; paper {} stays untagged", paper_id);
            return Vec::new();
        }

        let topics = match self
            .registry
            .invoke("list_topics", json!({}))
            .await
            .map_err(HandlerError::from)
            .and_then(|p| expect_list("list_topics", p))
        {
            Ok(topics) => topics,
            Err(e) => {
                warn!("Could not list topics for linking: {}", e);
                self.ui.warning(&format!("Could not link topics: {e}"));
                return Vec::new();
            }
        };

        let mut topic_ids: Vec<i64> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for candidate in candidates {
            let matched = topics
                .iter()
                .find(|t| t.get("name").and_then(Value::as_str) == Some(candidate.as_str()))
                .and_then(|t| t.get("id").and_then(Value::as_i64));
            if let Some(id) = matched {
                if !topic_ids.contains(&id) {
                    topic_ids.push(id);
                    names.push(candidate.clone());
                }
            }
        }

        if topic_ids.is_empty() {
            info!("No extracted topic matched a stored topic");
            self.ui.info("Extracted topics did not match existing topics.");
            return Vec::new();
        }

        match self
            .registry
            .invoke(
                "link_paper_to_topics",
                json!({"paper_id": paper_id, "topic_ids": topic_ids}),
            )
            .await
            .map_err(HandlerError::from)
            .and_then(|p| expect_success("link_paper_to_topics", p))
        {
            Ok(_) => {
                self.ui
                    .success(&format!("Linked to {} topic(s)", topic_ids.len()));
                names
            }
            Err(e) => {
                warn!("Linking paper {} failed: {}", paper_id, e);
                self.ui.warning(&format!("Could not link topics: {e}"));
                Vec::new()
            }
        }
    }

    async fn list_papers(&self, topic: Option<&str>) -> Result<Value, HandlerError> {
        let papers = match topic {
            Some(topic_name) => {
                let payload = self
                    .registry
                    .invoke("get_papers_by_topic", json!({"topic_name": topic_name}))
                    .await?;
                expect_list("get_papers_by_topic", payload)?
            }
            None => {
                let payload = self.registry.invoke("get_all_papers", json!({})).await?;
                expect_list("get_all_papers", payload)?
            }
        };
        self.ui.papers(&papers, topic);
        Ok(match topic {
            Some(topic) => json!({"topic": topic, "papers": papers}),
            None => json!({"papers": papers}),
        })
    }

    async fn summarize_topic(&self, topic_name: &str) -> Result<Value, HandlerError> {
        let payload = self
            .registry
            .invoke("get_papers_by_topic", json!({"topic_name": topic_name}))
            .await?;
        let papers = expect_list("get_papers_by_topic", payload)?;
        if papers.is_empty() {
            return Err(HandlerError::NoPapers {
                topic: topic_name.to_string(),
            });
        }

        let count = papers.len();
        self.ui
            .step(&format!("Generating summary for {count} paper(s)..."));
        let payload = self
            .registry
            .invoke(
                "summarize_topic",
                json!({"papers": papers, "topic_name": topic_name}),
            )
            .await?;
        let payload = expect_success("summarize_topic", payload)?;
        let summary: TopicSummary = payload
            .get("summary")
            .cloned()
            .and_then(|s| serde_json::from_value(s).ok())
            .ok_or_else(|| HandlerError::UnexpectedResponse {
                tool: "summarize_topic".to_string(),
            })?;

        self.ui.markdown(&summary.to_markdown());
        Ok(json!({"topic": topic_name, "summary": summary, "paper_count": count}))
    }
}

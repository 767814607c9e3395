//! Storage tools over the SQLite database.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::{failure, missing_argument, str_arg, ProviderContext};
use crate::state::{Database, InsertOutcome};
use crate::tools::{Tool, ToolError};

/// The storage operations exposed as tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbOp {
    AddTopic,
    ListTopics,
    RemoveTopic,
    AddPaper,
    LinkPaperToTopics,
    GetPapersByTopic,
    GetAllPapers,
    GetTopicByName,
}

impl DbOp {
    pub const ALL: [DbOp; 8] = [
        DbOp::AddTopic,
        DbOp::ListTopics,
        DbOp::RemoveTopic,
        DbOp::AddPaper,
        DbOp::LinkPaperToTopics,
        DbOp::GetPapersByTopic,
        DbOp::GetAllPapers,
        DbOp::GetTopicByName,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTopic => "add_topic",
            Self::ListTopics => "list_topics",
            Self::RemoveTopic => "remove_topic",
            Self::AddPaper => "add_paper",
            Self::LinkPaperToTopics => "link_paper_to_topics",
            Self::GetPapersByTopic => "get_papers_by_topic",
            Self::GetAllPapers => "get_all_papers",
            Self::GetTopicByName => "get_topic_by_name",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AddTopic => "Add a topic to the database.",
            Self::ListTopics => "List all topics.",
            Self::RemoveTopic => "Remove a topic by name.",
            Self::AddPaper => "Add a paper record.",
            Self::LinkPaperToTopics => "Associate a paper with topics by id.",
            Self::GetPapersByTopic => "Fetch papers linked to a topic name.",
            Self::GetAllPapers => "List all papers.",
            Self::GetTopicByName => "Fetch a topic by name.",
        }
    }

    pub fn schema(&self) -> Value {
        let no_args = json!({"type": "object", "properties": {}});
        match self {
            Self::AddTopic => json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Topic name."},
                    "description": {"type": "string", "description": "Optional topic description.", "default": ""}
                },
                "required": ["name"]
            }),
            Self::ListTopics | Self::GetAllPapers => no_args,
            Self::RemoveTopic => json!({
                "type": "object",
                "properties": {"name": {"type": "string", "description": "Topic name to remove."}},
                "required": ["name"]
            }),
            Self::AddPaper => json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Paper title."},
                    "arxiv_url": {"type": "string", "description": "Paper arXiv URL."},
                    "abstract": {"type": "string", "description": "Paper abstract."}
                },
                "required": ["title", "arxiv_url", "abstract"]
            }),
            Self::LinkPaperToTopics => json!({
                "type": "object",
                "properties": {
                    "paper_id": {"type": "integer", "description": "Paper identifier."},
                    "topic_ids": {
                        "type": "array",
                        "description": "Topic identifiers to link.",
                        "items": {"type": "integer"}
                    }
                },
                "required": ["paper_id", "topic_ids"]
            }),
            Self::GetPapersByTopic => json!({
                "type": "object",
                "properties": {"topic_name": {"type": "string", "description": "Topic name filter."}},
                "required": ["topic_name"]
            }),
            Self::GetTopicByName => json!({
                "type": "object",
                "properties": {"name": {"type": "string", "description": "Topic name to lookup."}},
                "required": ["name"]
            }),
        }
    }

    /// Run the operation. Missing arguments and constraint violations come
    /// back as `{"success": false, ...}` payloads.
    pub fn run(&self, db: &Database, args: &Value) -> anyhow::Result<Value> {
        let payload = match self {
            Self::AddTopic => {
                let Some(name) = str_arg(args, "name") else {
                    return Ok(missing_argument("name"));
                };
                let description = str_arg(args, "description").unwrap_or("");
                match db.add_topic(name, description)? {
                    InsertOutcome::Inserted(id) => json!({
                        "success": true,
                        "message": format!("Added topic '{name}'."),
                        "topic_id": id,
                    }),
                    InsertOutcome::Duplicate => failure(format!("Topic '{name}' already exists.")),
                }
            }
            Self::ListTopics => serde_json::to_value(db.list_topics()?)?,
            Self::RemoveTopic => {
                let Some(name) = str_arg(args, "name") else {
                    return Ok(missing_argument("name"));
                };
                if db.remove_topic(name)? > 0 {
                    json!({"success": true, "message": format!("Removed topic '{name}'.")})
                } else {
                    failure(format!("Topic '{name}' not found."))
                }
            }
            Self::AddPaper => {
                let (Some(title), Some(url), Some(abstract_text)) = (
                    str_arg(args, "title"),
                    str_arg(args, "arxiv_url"),
                    str_arg(args, "abstract"),
                ) else {
                    let missing = ["title", "arxiv_url", "abstract"]
                        .into_iter()
                        .find(|k| str_arg(args, k).is_none())
                        .unwrap_or("title");
                    return Ok(missing_argument(missing));
                };
                match db.add_paper(title, url, abstract_text)? {
                    InsertOutcome::Inserted(id) => json!({
                        "success": true,
                        "message": format!("Added paper '{title}'."),
                        "paper_id": id,
                    }),
                    InsertOutcome::Duplicate => {
                        failure(format!("Paper with URL '{url}' already exists."))
                    }
                }
            }
            Self::LinkPaperToTopics => {
                let Some(paper_id) = args.get("paper_id").and_then(Value::as_i64) else {
                    return Ok(missing_argument("paper_id"));
                };
                let Some(topic_ids) = args.get("topic_ids").and_then(Value::as_array) else {
                    return Ok(missing_argument("topic_ids"));
                };
                let topic_ids: Vec<i64> = topic_ids.iter().filter_map(Value::as_i64).collect();
                let linked = db.link_paper_to_topics(paper_id, &topic_ids)?;
                json!({
                    "success": true,
                    "message": format!("Linked paper to {} topic(s).", topic_ids.len()),
                    "linked": linked,
                })
            }
            Self::GetPapersByTopic => {
                let Some(topic_name) = str_arg(args, "topic_name") else {
                    return Ok(missing_argument("topic_name"));
                };
                serde_json::to_value(db.papers_by_topic(topic_name)?)?
            }
            Self::GetAllPapers => serde_json::to_value(db.all_papers()?)?,
            Self::GetTopicByName => {
                let Some(name) = str_arg(args, "name") else {
                    return Ok(missing_argument("name"));
                };
                match db.topic_by_name(name)? {
                    Some(topic) => json!({"success": true, "topic": topic}),
                    None => failure(format!("Topic '{name}' not found.")),
                }
            }
        };
        Ok(payload)
    }
}

/// One storage operation bound to the shared context.
pub struct DbTool {
    op: DbOp,
    ctx: Arc<ProviderContext>,
}

#[async_trait]
impl Tool for DbTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    fn parameters_schema(&self) -> Value {
        self.op.schema()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let db = self.ctx.database().await?;
        let db = db.lock().await;
        debug!("db.{} {}", self.op.name(), args);
        Ok(self
            .op
            .run(&db, &args)
            .unwrap_or_else(|e| failure(format!("Database operation failed: {e:#}"))))
    }
}

/// All eight storage tools.
pub fn tools(ctx: Arc<ProviderContext>) -> Vec<Arc<dyn Tool>> {
    DbOp::ALL
        .iter()
        .map(|op| {
            Arc::new(DbTool {
                op: *op,
                ctx: Arc::clone(&ctx),
            }) as Arc<dyn Tool>
        })
        .collect()
}

//! The `fetch_arxiv_paper` tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{failure, missing_argument, str_arg};
use crate::arxiv::ArxivClient;
use crate::tools::{Tool, ToolError};

pub struct FetchArxivPaper {
    client: ArxivClient,
}

impl FetchArxivPaper {
    pub fn new(client: ArxivClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FetchArxivPaper {
    fn name(&self) -> &str {
        "fetch_arxiv_paper"
    }

    fn description(&self) -> &str {
        "Fetch paper metadata and abstract from ArXiv API using URL or ID"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "arxiv_url": {
                    "type": "string",
                    "description": "ArXiv URL (example: https://arxiv.org/abs/2412.01234) or ID (e.g., 2412.01234)"
                }
            },
            "required": ["arxiv_url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let Some(url) = str_arg(&args, "arxiv_url") else {
            return Ok(missing_argument("arxiv_url"));
        };

        match self.client.fetch(url).await {
            Ok(paper) => {
                let mut payload = serde_json::to_value(&paper)?;
                if let Some(obj) = payload.as_object_mut() {
                    obj.insert("success".into(), Value::Bool(true));
                }
                Ok(payload)
            }
            Err(e) => Ok(failure(e.to_string())),
        }
    }
}

//! Typed actions: one variant per actionable intent, with its parameters.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::Confidence;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Missing required parameter '{parameter}' for {intent}")]
    MissingParameter {
        intent: &'static str,
        parameter: &'static str,
    },

    #[error("No handler for intent: {0}")]
    NotActionable(String),
}

/// A validated action. Required parameters are non-empty by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddTopic {
        name: String,
        description: Option<String>,
    },
    ListTopics,
    RemoveTopic {
        name: String,
    },
    AddPaper {
        arxiv_url: String,
    },
    ListPapers,
    ListPapersByTopic {
        topic_name: String,
    },
    SummarizeTopic {
        topic_name: String,
    },
}

fn optional(params: &BTreeMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(
    params: &BTreeMap<String, String>,
    intent: &'static str,
    parameter: &'static str,
) -> Result<String, ActionError> {
    optional(params, parameter).ok_or(ActionError::MissingParameter { intent, parameter })
}

impl Action {
    /// Build the action for `intent` from a classification's parameter map.
    pub fn from_classification(
        intent: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Self, ActionError> {
        let action = match intent {
            "add_topic" => Self::AddTopic {
                name: required(params, "add_topic", "topic_name")?,
                description: optional(params, "topic_description"),
            },
            "list_topics" => Self::ListTopics,
            "remove_topic" => Self::RemoveTopic {
                name: required(params, "remove_topic", "topic_name")?,
            },
            "add_paper" => Self::AddPaper {
                arxiv_url: required(params, "add_paper", "arxiv_url")?,
            },
            "list_papers" => match optional(params, "topic_name") {
                Some(topic_name) => Self::ListPapersByTopic { topic_name },
                None => Self::ListPapers,
            },
            "list_papers_by_topic" => Self::ListPapersByTopic {
                topic_name: required(params, "list_papers_by_topic", "topic_name")?,
            },
            "summarize_topic" => Self::SummarizeTopic {
                topic_name: required(params, "summarize_topic", "topic_name")?,
            },
            other => return Err(ActionError::NotActionable(other.to_string())),
        };
        Ok(action)
    }

    pub fn intent(&self) -> &'static str {
        match self {
            Self::AddTopic { .. } => "add_topic",
            Self::ListTopics => "list_topics",
            Self::RemoveTopic { .. } => "remove_topic",
            Self::AddPaper { .. } => "add_paper",
            Self::ListPapers => "list_papers",
            Self::ListPapersByTopic { .. } => "list_papers_by_topic",
            Self::SummarizeTopic { .. } => "summarize_topic",
        }
    }

    /// What the action is about to do, in the user's terms.
    pub fn explain(&self, confidence: Confidence) -> String {
        let text = match self {
            Self::AddTopic { name, .. } => format!("Adding topic '{name}'"),
            Self::ListTopics => "Listing all topics".to_string(),
            Self::RemoveTopic { name } => format!("Removing topic '{name}'"),
            Self::AddPaper { arxiv_url } => format!("Adding paper from {arxiv_url}"),
            Self::ListPapers => "Listing all papers".to_string(),
            Self::ListPapersByTopic { topic_name } => {
                format!("Listing papers for topic '{topic_name}'")
            }
            Self::SummarizeTopic { topic_name } => format!("Summarizing topic '{topic_name}'"),
        };
        if confidence == Confidence::Low {
            format!("{text} (low confidence - please verify)")
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required_parameters() {
        let err = Action::from_classification("remove_topic", &params(&[])).unwrap_err();
        assert_eq!(
            err,
            ActionError::MissingParameter {
                intent: "remove_topic",
                parameter: "topic_name"
            }
        );
        let err = Action::from_classification("add_paper", &params(&[("arxiv_url", " ")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required parameter 'arxiv_url' for add_paper"
        );
    }

    #[test]
    fn test_list_papers_with_topic_routes_by_topic() {
        let action =
            Action::from_classification("list_papers", &params(&[("topic_name", "nlp")])).unwrap();
        assert_eq!(
            action,
            Action::ListPapersByTopic {
                topic_name: "nlp".into()
            }
        );
        assert_eq!(action.intent(), "list_papers_by_topic");
        assert_eq!(
            Action::from_classification("list_papers", &params(&[])).unwrap(),
            Action::ListPapers
        );
    }

    #[test]
    fn test_add_topic_description_is_optional() {
        let action = Action::from_classification(
            "add_topic",
            &params(&[("topic_name", "nlp"), ("topic_description", "")]),
        )
        .unwrap();
        assert_eq!(
            action,
            Action::AddTopic {
                name: "nlp".into(),
                description: None
            }
        );
    }

    #[test]
    fn test_explanations() {
        let action = Action::RemoveTopic { name: "foo".into() };
        assert_eq!(action.explain(Confidence::High), "Removing topic 'foo'");
        assert_eq!(
            action.explain(Confidence::Low),
            "Removing topic 'foo' (low confidence - please verify)"
        );
        assert_eq!(
            Action::AddPaper {
                arxiv_url: "1706.03762".into()
            }
            .explain(Confidence::Medium),
            "Adding paper from 1706.03762"
        );
    }

    #[test]
    fn test_meta_intents_are_not_actions() {
        assert_eq!(
            Action::from_classification("help", &params(&[])).unwrap_err(),
            ActionError::NotActionable("help".into())
        );
    }
}

//! Shared types used across the research organizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Classification confidence
// ---------------------------------------------------------------------------

/// How sure the classifier is about the chosen intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The request was very clear.
    High,
    /// Somewhat clear; the action is announced but not blocked.
    Medium,
    /// Ambiguous; the user must confirm before anything runs.
    Low,
}

impl Confidence {
    /// All levels in schema order.
    pub const ALL: [Confidence; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a model-provided label. Anything unrecognised degrades to `Low`.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::Low
    }
}

// ---------------------------------------------------------------------------
// Storage records
// ---------------------------------------------------------------------------

/// A research topic papers can be tagged with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A stored paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub arxiv_url: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ArXiv metadata
// ---------------------------------------------------------------------------

/// Paper metadata as returned by the ArXiv export API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivPaper {
    pub arxiv_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Canonical `https://arxiv.org/abs/<id>` URL.
    pub arxiv_url: String,
    pub authors: Vec<String>,
    pub published: Option<String>,
}

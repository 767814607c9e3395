//! The static intent catalog and its resolution against discovered tools.

use tracing::warn;

/// One actionable intent: what it means to the model and which tools it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentDefinition {
    pub name: &'static str,
    pub description: &'static str,
    /// Parameter lines shown in the classifier prompt.
    pub parameters: &'static [&'static str],
    /// Tools that must all be registered for the intent to be offered.
    pub required_tools: &'static [&'static str],
    /// Tools used when present; their absence degrades the intent.
    pub optional_tools: &'static [&'static str],
}

impl IntentDefinition {
    /// Required tools followed by optional ones.
    pub fn tools(&self) -> impl Iterator<Item = &'static str> {
        self.required_tools
            .iter()
            .chain(self.optional_tools.iter())
            .copied()
    }
}

/// Intents handled by the dispatcher itself, without tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaIntent {
    pub name: &'static str,
    pub description: &'static str,
}

pub const HELP: &str = "help";
pub const EXIT: &str = "exit";
pub const UNCLEAR: &str = "unclear";

pub const META_INTENTS: [MetaIntent; 3] = [
    MetaIntent {
        name: HELP,
        description: "Show a help message with supported commands.",
    },
    MetaIntent {
        name: EXIT,
        description: "Exit the application after confirming with the user.",
    },
    MetaIntent {
        name: UNCLEAR,
        description: "Use when no action fits or the request is ambiguous.",
    },
];

pub const CATALOG: [IntentDefinition; 7] = [
    IntentDefinition {
        name: "add_topic",
        description: "Add a new research topic.",
        parameters: &[
            "topic_name (required string)",
            "topic_description (optional string)",
        ],
        required_tools: &["add_topic"],
        optional_tools: &[],
    },
    IntentDefinition {
        name: "list_topics",
        description: "Show all stored topics.",
        parameters: &[],
        required_tools: &["list_topics"],
        optional_tools: &[],
    },
    IntentDefinition {
        name: "remove_topic",
        description: "Delete an existing topic.",
        parameters: &["topic_name (required string)"],
        required_tools: &["remove_topic"],
        optional_tools: &[],
    },
    IntentDefinition {
        name: "add_paper",
        description: "Fetch a paper from ArXiv, store it, and tag matching topics.",
        parameters: &["arxiv_url (required string)"],
        required_tools: &["fetch_arxiv_paper", "add_paper"],
        optional_tools: &["extract_topics", "list_topics", "link_paper_to_topics"],
    },
    IntentDefinition {
        name: "list_papers",
        description: "List every paper stored in the database.",
        parameters: &[],
        required_tools: &["get_all_papers"],
        optional_tools: &[],
    },
    IntentDefinition {
        name: "list_papers_by_topic",
        description: "Show papers tagged with a specific topic.",
        parameters: &["topic_name (required string)"],
        required_tools: &["get_papers_by_topic"],
        optional_tools: &[],
    },
    IntentDefinition {
        name: "summarize_topic",
        description: "Generate a summary of papers for a topic.",
        parameters: &["topic_name (required string)"],
        required_tools: &["get_papers_by_topic", "summarize_topic"],
        optional_tools: &[],
    },
];

pub fn is_meta(name: &str) -> bool {
    META_INTENTS.iter().any(|m| m.name == name)
}

/// An intent left out because some of its required tools are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledIntent {
    pub name: &'static str,
    pub missing_tools: Vec<&'static str>,
}

/// The catalog resolved against a tool set, computed once at startup.
#[derive(Debug, Clone, Default)]
pub struct IntentSet {
    enabled: Vec<IntentDefinition>,
    disabled: Vec<DisabledIntent>,
    names: Vec<String>,
}

impl IntentSet {
    /// Keep the definitions whose required tools all satisfy `has_tool`.
    /// Each disabled intent is logged once, here. Duplicate definitions keep
    /// their first occurrence; meta intents are appended sorted by name.
    pub fn resolve(catalog: &[IntentDefinition], has_tool: impl Fn(&str) -> bool) -> Self {
        let mut set = Self::default();

        for def in catalog {
            if set.names.iter().any(|n| n == def.name)
                || set.disabled.iter().any(|d| d.name == def.name)
            {
                continue;
            }
            let missing: Vec<&'static str> = def
                .required_tools
                .iter()
                .copied()
                .filter(|tool| !has_tool(tool))
                .collect();
            if missing.is_empty() {
                set.names.push(def.name.to_string());
                set.enabled.push(*def);
            } else {
                warn!(
                    "Disabling intent '{}' (missing tools: {}).",
                    def.name,
                    missing.join(", ")
                );
                set.disabled.push(DisabledIntent {
                    name: def.name,
                    missing_tools: missing,
                });
            }
        }

        let mut meta: Vec<&str> = META_INTENTS.iter().map(|m| m.name).collect();
        meta.sort_unstable();
        for name in meta {
            if !set.names.iter().any(|n| n == name) {
                set.names.push(name.to_string());
            }
        }
        set
    }

    /// Intent names offered to the classifier, in schema order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Enabled actionable intents, in catalog order.
    pub fn actionable(&self) -> &[IntentDefinition] {
        &self.enabled
    }

    pub fn disabled(&self) -> &[DisabledIntent] {
        &self.disabled
    }
}

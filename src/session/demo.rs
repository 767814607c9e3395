//! Scripted natural-language walkthrough.
//!
//! Steps:
//! 1. Add topics and list them
//! 2. Add an ArXiv paper
//! 3. List papers for the first topic extracted from it
//! 4. Summarize that topic

use serde_json::Value;
use tracing::info;

use super::Session;
use crate::dispatch::ExecutionResult;

/// Intents the walkthrough cannot run without.
pub const DEMO_REQUIRED_INTENTS: [&str; 5] = [
    "add_topic",
    "add_paper",
    "list_papers_by_topic",
    "list_topics",
    "summarize_topic",
];

const TOPIC_QUERIES: [&str; 2] = [
    "add machine learning as a topic about algorithms that learn from data",
    "add a topic called natural language processing for processing and understanding \
     human language and a computer vision topic for teaching computers to understand images",
];

const SAMPLE_ARXIV_URL: &str = "https://arxiv.org/abs/1706.03762";

/// One utterance and what it produced.
#[derive(Debug, Clone)]
pub struct DemoStep {
    pub query: String,
    pub result: ExecutionResult,
}

#[derive(Debug, Clone)]
pub enum DemoOutcome {
    /// The walkthrough needs a language model.
    NoModel,
    /// Discovery left required intents disabled; nothing was run.
    MissingIntents(Vec<&'static str>),
    /// Every utterance that ran, in order.
    Completed(Vec<DemoStep>),
}

/// Run the walkthrough through `session`. Steps 3 and 4 only run when the
/// paper was added and at least one topic was extracted for it.
pub async fn run_demo(session: &Session) -> DemoOutcome {
    let ui = session.ui();

    if !session.natural_language() {
        ui.warning("The demo needs a language model. Configure [llm] or run `setup`.");
        return DemoOutcome::NoModel;
    }

    let missing: Vec<&'static str> = DEMO_REQUIRED_INTENTS
        .iter()
        .copied()
        .filter(|intent| !session.intents().is_enabled(intent))
        .collect();
    if !missing.is_empty() {
        ui.error(&format!(
            "Required intents are unavailable: {}.",
            missing.join(", ")
        ));
        return DemoOutcome::MissingIntents(missing);
    }

    let mut steps = Vec::new();

    ui.divider();
    ui.info("Step 1: Adding research topics using natural language");
    for query in TOPIC_QUERIES {
        say(session, &mut steps, query.to_string()).await;
    }
    say(session, &mut steps, "show me all the topics".to_string()).await;

    ui.divider();
    ui.info("Step 2: Adding a paper from ArXiv using natural language");
    let added = say(
        session,
        &mut steps,
        format!("add this paper from arxiv: {SAMPLE_ARXIV_URL}"),
    )
    .await;

    let first_topic = added
        .result
        .as_ref()
        .filter(|_| added.success)
        .and_then(|payload| payload.get("extracted_topics"))
        .and_then(Value::as_array)
        .and_then(|topics| topics.first())
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(topic) = first_topic {
        ui.divider();
        ui.info("Step 3: Listing papers by topic using natural language");
        say(session, &mut steps, format!("show me papers about {topic}")).await;

        ui.divider();
        ui.info("Step 4: Generating topic summary using natural language");
        say(session, &mut steps, format!("summarize the topic {topic}")).await;
    } else {
        info!("No topics extracted for the sample paper; skipping steps 3 and 4");
    }

    ui.divider();
    ui.success("Demo completed!");
    ui.info("Run `research-organizer run` to start the interactive session.");
    DemoOutcome::Completed(steps)
}

async fn say(session: &Session, steps: &mut Vec<DemoStep>, query: String) -> ExecutionResult {
    let ui = session.ui();
    ui.blank();
    ui.user_said(&query);
    let result = session.handle_input(&query).await;
    steps.push(DemoStep {
        query,
        result: result.clone(),
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ScriptedConfirmer;
    use crate::llm::{ModelHandle, ScriptedModel};
    use crate::tools::{RecordingProvider, ToolProvider, ToolRegistry};
    use crate::ui::Ui;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn research_tools(extracted: Value) -> RecordingProvider {
        RecordingProvider::new("research")
            .with_tool("add_topic", json!({"success": true, "message": "Added.", "topic_id": 1}))
            .with_tool("list_topics", json!([{"id": 1, "name": "nlp"}]))
            .with_tool("remove_topic", json!({"success": true}))
            .with_tool(
                "fetch_arxiv_paper",
                json!({"success": true, "title": "Attention", "abstract": "A", "arxiv_url": SAMPLE_ARXIV_URL}),
            )
            .with_tool("add_paper", json!({"success": true, "paper_id": 7}))
            .with_tool("extract_topics", json!({"success": true, "extracted_topics": extracted}))
            .with_tool("link_paper_to_topics", json!({"success": true}))
            .with_tool("get_all_papers", json!([]))
            .with_tool("get_papers_by_topic", json!([{"id": 7, "title": "Attention", "abstract": "A"}]))
            .with_tool(
                "summarize_topic",
                json!({"success": true, "summary": {"overview": "o", "key_findings": [], "papers_summary": []}}),
            )
    }

    async fn session(provider: &RecordingProvider, model: ModelHandle) -> Session {
        let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(provider.clone())];
        let registry = ToolRegistry::discover(providers, Duration::from_secs(5))
            .await
            .unwrap();
        Session::new(
            Arc::new(registry),
            model,
            Arc::new(ScriptedConfirmer::default()),
            Ui::silent(),
        )
    }

    fn classified(intent: &str, params: Value) -> String {
        json!({"intent": intent, "parameters": params, "confidence": "high"}).to_string()
    }

    #[tokio::test]
    async fn test_full_walkthrough() {
        let provider = research_tools(json!(["nlp"]));
        let model = ScriptedModel::with_responses([
            classified("add_topic", json!({"topic_name": "machine learning"})),
            classified("add_topic", json!({"topic_name": "natural language processing"})),
            classified("list_topics", json!({})),
            classified("add_paper", json!({"arxiv_url": SAMPLE_ARXIV_URL})),
            classified("list_papers_by_topic", json!({"topic_name": "nlp"})),
            classified("summarize_topic", json!({"topic_name": "nlp"})),
        ]);
        let s = session(&provider, model.handle()).await;

        let DemoOutcome::Completed(steps) = run_demo(&s).await else {
            panic!("demo did not complete");
        };
        let queries: Vec<&str> = steps.iter().map(|s| s.query.as_str()).collect();
        assert_eq!(queries.len(), 6);
        assert_eq!(queries[3], "add this paper from arxiv: https://arxiv.org/abs/1706.03762");
        assert_eq!(queries[4], "show me papers about nlp");
        assert_eq!(queries[5], "summarize the topic nlp");
        assert!(steps.iter().all(|s| s.result.success));
        assert_eq!(model.call_count(), 6);
        assert_eq!(provider.calls_to("summarize_topic").len(), 1);
    }

    #[tokio::test]
    async fn test_stops_after_paper_without_topics() {
        let provider = research_tools(json!([]));
        let model = ScriptedModel::with_responses([
            classified("add_topic", json!({"topic_name": "machine learning"})),
            classified("add_topic", json!({"topic_name": "computer vision"})),
            classified("list_topics", json!({})),
            classified("add_paper", json!({"arxiv_url": SAMPLE_ARXIV_URL})),
        ]);
        let s = session(&provider, model.handle()).await;

        let DemoOutcome::Completed(steps) = run_demo(&s).await else {
            panic!("demo did not complete");
        };
        assert_eq!(steps.len(), 4);
        assert!(provider.calls_to("get_papers_by_topic").is_empty());
    }

    #[tokio::test]
    async fn test_missing_intents_run_nothing() {
        let provider = RecordingProvider::new("db")
            .with_tool("add_topic", json!({"success": true}))
            .with_tool("list_topics", json!([]));
        let model = ScriptedModel::new();
        let s = session(&provider, model.handle()).await;

        match run_demo(&s).await {
            DemoOutcome::MissingIntents(missing) => assert_eq!(
                missing,
                vec!["add_paper", "list_papers_by_topic", "summarize_topic"]
            ),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(model.call_count(), 0);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_requires_model() {
        let provider = research_tools(json!([]));
        let s = session(&provider, ModelHandle::Uninitialized).await;
        assert!(matches!(run_demo(&s).await, DemoOutcome::NoModel));
        assert!(provider.calls().is_empty());
    }
}

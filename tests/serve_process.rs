//! The built-in database server, hosted by the real binary as a child
//! process and driven over the stdio tool protocol.

use serde_json::json;

use research_organizer::mcp::StdioProvider;
use research_organizer::tools::{ToolError, ToolProvider};

fn db_server(home: &std::path::Path) -> StdioProvider {
    StdioProvider::new(
        "research-db",
        env!("CARGO_BIN_EXE_research-organizer"),
        vec![
            "--home".to_string(),
            home.display().to_string(),
            "serve".to_string(),
            "db".to_string(),
        ],
    )
}

#[tokio::test]
async fn test_db_server_over_stdio() {
    let home = tempfile::tempdir().unwrap();
    let provider = db_server(home.path());

    let mut names: Vec<String> = provider
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "add_paper",
            "add_topic",
            "get_all_papers",
            "get_papers_by_topic",
            "get_topic_by_name",
            "link_paper_to_topics",
            "list_topics",
            "remove_topic",
        ]
    );

    let added = provider
        .call_tool("add_topic", json!({"name": "nlp", "description": "Language"}))
        .await
        .unwrap();
    assert_eq!(added["success"], true);

    // Each call runs in a fresh child; the store persists between them.
    let topics = provider.call_tool("list_topics", json!({})).await.unwrap();
    assert_eq!(topics[0]["name"], "nlp");
    assert_eq!(topics[0]["description"], "Language");
    assert!(home.path().join("research.db").exists());
}

#[tokio::test]
async fn test_unknown_tool_is_an_execution_error() {
    let home = tempfile::tempdir().unwrap();
    let provider = db_server(home.path());
    let err = provider
        .call_tool("drop_everything", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Execution { .. }), "{err:?}");
    assert!(err.to_string().contains("Tool not available: drop_everything"));
}

#[tokio::test]
async fn test_missing_command_is_unavailable() {
    let provider = StdioProvider::new("ghost", "/nonexistent/tool-server", Vec::new());
    let err = provider.list_tools().await.unwrap_err();
    assert!(matches!(err, ToolError::Spawn(_)), "{err:?}");
}

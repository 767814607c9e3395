//! Database schema definitions and migrations.

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Full DDL for the research database.
pub const CREATE_SCHEMA: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Research topics
CREATE TABLE IF NOT EXISTS topics (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

-- Stored papers, unique by canonical ArXiv URL
CREATE TABLE IF NOT EXISTS papers (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    title     TEXT NOT NULL,
    arxiv_url TEXT UNIQUE NOT NULL,
    abstract  TEXT NOT NULL DEFAULT '',
    added_at  TEXT NOT NULL
);

-- Paper <-> topic links
CREATE TABLE IF NOT EXISTS paper_topics (
    paper_id INTEGER NOT NULL REFERENCES papers(id) ON DELETE CASCADE,
    topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
    PRIMARY KEY (paper_id, topic_id)
);

CREATE INDEX IF NOT EXISTS idx_paper_topics_topic ON paper_topics(topic_id);
"#;

//! SQLite database wrapper for topics, papers and their links.

use crate::state::schema;
use crate::types::*;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

/// Outcome of an insert guarded by a UNIQUE constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row created with this id.
    Inserted(i64),
    /// A row with the same unique key already exists.
    Duplicate,
}

/// The research organizer database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Run schema creation.
    fn migrate(&mut self) -> Result<()> {
        if self.schema_version() == 0 {
            info!("Creating database schema v{}", schema::SCHEMA_VERSION);
            self.conn
                .execute_batch(schema::CREATE_SCHEMA)
                .context("Failed to create schema")?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::SCHEMA_VERSION],
            )?;
        }
        Ok(())
    }

    /// Get the current schema version (0 if uninitialized).
    fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Topics
    // -----------------------------------------------------------------------

    /// Add a topic. Names are unique.
    pub fn add_topic(&self, name: &str, description: &str) -> Result<InsertOutcome> {
        let inserted = self.conn.execute(
            "INSERT INTO topics (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![name, description, Utc::now().to_rfc3339()],
        );
        into_insert_outcome(inserted, &self.conn)
    }

    /// List all topics ordered by id.
    pub fn list_topics(&self) -> Result<Vec<Topic>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at FROM topics ORDER BY id")?;
        let rows = stmt.query_map([], topic_from_row)?;

        let mut topics = Vec::new();
        for row in rows {
            topics.push(row?);
        }
        Ok(topics)
    }

    /// Delete a topic by name, returning the number of rows removed.
    pub fn remove_topic(&self, name: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM topics WHERE name = ?1", params![name])?;
        debug!("Removed {} topic row(s) named '{}'", deleted, name);
        Ok(deleted)
    }

    /// Look up a topic by its exact name.
    pub fn topic_by_name(&self, name: &str) -> Result<Option<Topic>> {
        let topic = self
            .conn
            .query_row(
                "SELECT id, name, description, created_at FROM topics WHERE name = ?1",
                params![name],
                topic_from_row,
            )
            .optional()?;
        Ok(topic)
    }

    // -----------------------------------------------------------------------
    // Papers
    // -----------------------------------------------------------------------

    /// Add a paper. The ArXiv URL is unique.
    pub fn add_paper(&self, title: &str, arxiv_url: &str, abstract_text: &str) -> Result<InsertOutcome> {
        let inserted = self.conn.execute(
            "INSERT INTO papers (title, arxiv_url, abstract, added_at) VALUES (?1, ?2, ?3, ?4)",
            params![title, arxiv_url, abstract_text, Utc::now().to_rfc3339()],
        );
        into_insert_outcome(inserted, &self.conn)
    }

    /// Link a paper to topics. Existing links are left alone; returns the
    /// number of new links.
    pub fn link_paper_to_topics(&self, paper_id: i64, topic_ids: &[i64]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut created = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO paper_topics (paper_id, topic_id) VALUES (?1, ?2)",
            )?;
            for topic_id in topic_ids {
                created += stmt.execute(params![paper_id, topic_id])?;
            }
        }
        tx.commit()?;
        Ok(created)
    }

    /// Papers tagged with the named topic, newest first.
    pub fn papers_by_topic(&self, topic_name: &str) -> Result<Vec<Paper>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.title, p.arxiv_url, p.abstract, p.added_at
             FROM papers p
             JOIN paper_topics pt ON p.id = pt.paper_id
             JOIN topics t ON pt.topic_id = t.id
             WHERE t.name = ?1
             ORDER BY p.added_at DESC, p.id DESC",
        )?;
        let rows = stmt.query_map(params![topic_name], paper_from_row)?;

        let mut papers = Vec::new();
        for row in rows {
            papers.push(row?);
        }
        Ok(papers)
    }

    /// All stored papers, newest first.
    pub fn all_papers(&self) -> Result<Vec<Paper>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, arxiv_url, abstract, added_at
             FROM papers ORDER BY added_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], paper_from_row)?;

        let mut papers = Vec::new();
        for row in rows {
            papers.push(row?);
        }
        Ok(papers)
    }
}

fn into_insert_outcome(
    inserted: rusqlite::Result<usize>,
    conn: &Connection,
) -> Result<InsertOutcome> {
    match inserted {
        Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Ok(InsertOutcome::Duplicate)
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn topic_from_row(row: &Row<'_>) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get::<_, String>(3).map(parse_timestamp)?,
    })
}

fn paper_from_row(row: &Row<'_>) -> rusqlite::Result<Paper> {
    Ok(Paper {
        id: row.get(0)?,
        title: row.get(1)?,
        arxiv_url: row.get(2)?,
        abstract_text: row.get(3)?,
        added_at: row.get::<_, String>(4).map(parse_timestamp)?,
    })
}

//! Research Organizer — console research-paper assistant.
//!
//! Natural-language or fixed-syntax requests are classified into intents
//! and routed to tools discovered from one or more tool providers. Topics
//! and papers live in SQLite; papers come from ArXiv; an LLM suggests topics
//! for new papers and summarizes topics.

pub mod agents;
pub mod arxiv;
pub mod config;
pub mod dispatch;
pub mod intent;
pub mod llm;
pub mod mcp;
pub mod providers;
pub mod session;
pub mod setup;
pub mod state;
pub mod tools;
pub mod types;
pub mod ui;

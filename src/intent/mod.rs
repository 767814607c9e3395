//! Intent catalog, typed actions, schema construction and classification.

pub mod action;
pub mod catalog;
pub mod classifier;
pub mod command;
pub mod schema;

pub use action::{Action, ActionError};
pub use catalog::{DisabledIntent, IntentDefinition, IntentSet, CATALOG, META_INTENTS};
pub use classifier::{Classification, IntentClassifier};
pub use command::parse_command;
pub use schema::build_schema;

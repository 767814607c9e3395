pub mod structured;
pub mod summarizer;
pub mod topic_agent;

pub use structured::{generate_structured, AgentFailure, StructuredOutput};
pub use summarizer::{PaperExcerpt, SummarizerAgent, TopicSummary};
pub use topic_agent::TopicAgent;

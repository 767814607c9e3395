//! Tool transport: JSON-RPC 2.0, one message per line.
//!
//! The client side ([`StdioProvider`]) spawns a provider process per
//! operation; the server side ([`serve_provider`]) hosts any
//! [`ToolProvider`](crate::tools::ToolProvider) over a reader/writer pair.

pub mod client;
pub mod server;
pub mod transport;
pub mod types;

pub use client::{McpSession, StdioProvider};
pub use server::serve_provider;
pub use transport::LineTransport;

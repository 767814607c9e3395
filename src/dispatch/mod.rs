//! Confirmation policy, dispatcher and per-intent handlers.

pub mod confirm;
pub mod dispatcher;
pub mod handlers;

pub use confirm::{ConsoleConfirmer, Confirmer, ScriptedConfirmer};
pub use dispatcher::{Dispatcher, ExecutionResult, ExecutionStatus};
pub use handlers::{HandlerError, Handlers};

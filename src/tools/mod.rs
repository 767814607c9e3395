pub mod errors;
pub mod local;
pub mod recording;
pub mod registry;
pub mod traits;

pub use errors::ToolError;
pub use local::LocalProvider;
pub use recording::RecordingProvider;
pub use registry::{SkippedProvider, ToolRegistry};
pub use traits::{Tool, ToolDescriptor, ToolProvider};

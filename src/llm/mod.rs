pub mod errors;
pub mod handle;
pub mod inference;
pub mod scripted;

pub use errors::LlmError;
pub use handle::{LanguageModel, ModelHandle, SamplingParams};
pub use inference::InferenceClient;
pub use scripted::ScriptedModel;

use crate::config::OrganizerConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the model handle from configuration. An unusable `[llm]` section
/// yields an uninitialized handle rather than an error.
pub fn model_from_config(config: &OrganizerConfig) -> ModelHandle {
    if !config.llm_configured() {
        info!("No language model configured; only fixed commands are available");
        return ModelHandle::Uninitialized;
    }
    match InferenceClient::new(
        &config.llm.api_url,
        &config.llm.api_key,
        &config.llm.model,
        config.llm.timeout_secs,
    ) {
        Ok(client) => {
            info!("Language model: {} at {}", config.llm.model, config.llm.api_url);
            ModelHandle::ready(Arc::new(client))
        }
        Err(e) => {
            warn!("Failed to build inference client: {}", e);
            ModelHandle::Uninitialized
        }
    }
}

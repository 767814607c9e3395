pub mod schema;

pub use schema::{ArxivConfig, LlmConfig, OrganizerConfig, ProviderConfig, ProviderKind};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Name of the config file inside the home directory.
pub const CONFIG_FILE: &str = "organizer.toml";

/// Default home directory (~/.research-organizer).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".research-organizer"))
        .unwrap_or_else(|| PathBuf::from(".research-organizer"))
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<OrganizerConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read organizer config file")?;
        let config: OrganizerConfig =
            toml::from_str(&contents).context("Failed to parse organizer config (TOML)")?;
        Ok(config)
    } else {
        Ok(OrganizerConfig::default())
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &OrganizerConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

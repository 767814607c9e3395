//! First-run interactive setup wizard.
//!
//! Steps:
//! 1. Language model endpoint
//! 2. Database location
//! 3. How the built-in tool servers are hosted
//! 4. Write organizer.toml

use crate::config::{self, OrganizerConfig, ProviderKind, CONFIG_FILE};
use crate::dispatch::confirm::is_yes;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::Path;

const BANNER: &str = r#"
  ╔══════════════════════════════════════════════════════════╗
  ║              Research Organizer - Setup                  ║
  ╚══════════════════════════════════════════════════════════╝
"#;

/// Run the interactive setup wizard on stdin.
pub fn run_setup_wizard(home: &Path) -> Result<OrganizerConfig> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    run_setup_wizard_with(&mut reader, home)
}

/// Run the wizard reading answers from `reader`. Existing settings are
/// offered as defaults.
pub fn run_setup_wizard_with(reader: &mut impl BufRead, home: &Path) -> Result<OrganizerConfig> {
    println!("{}", BANNER);
    println!("Welcome to Research Organizer setup.\n");

    let config_path = home.join(CONFIG_FILE);
    let mut config = config::load_config(&config_path)?;

    // Step 1: Language model
    println!("[1/4] Language model");
    println!("  Without a model only fixed commands (see `help`) are understood.");
    config.llm.enabled = prompt_yes_no(reader, "  Use a language model", config.llm.enabled)?;
    if config.llm.enabled {
        config.llm.api_url =
            prompt_with_default(reader, "  OpenAI-compatible API URL", &config.llm.api_url)?;
        config.llm.model = prompt_with_default(reader, "  Model name", &config.llm.model)?;
        let key = prompt(reader, "  API key (press Enter for none)")?;
        if !key.is_empty() {
            config.llm.api_key = key;
        }
    }

    // Step 2: Database
    println!("\n[2/4] Storage");
    let default_db = config.resolved_db_path(home).display().to_string();
    let db_path = prompt_with_default(reader, "  Database path", &default_db)?;
    config.db_path = if db_path == home.join("research.db").display().to_string() {
        String::new()
    } else {
        db_path
    };

    // Step 3: Providers
    println!("\n[3/4] Tool servers");
    let out_of_process = prompt_yes_no(
        reader,
        "  Run built-in tool servers as child processes",
        !config
            .providers
            .iter()
            .any(|p| p.kind == ProviderKind::InProcess),
    )?;
    for provider in config.providers.iter_mut().filter(|p| p.server.is_some()) {
        provider.kind = if out_of_process {
            ProviderKind::Builtin
        } else {
            ProviderKind::InProcess
        };
    }

    // Step 4: Write
    println!("\n[4/4] Writing configuration...");
    std::fs::create_dir_all(home)?;
    config::save_config(&config, &config_path)?;
    println!("  Written: {}", config_path.display());

    println!("\nSetup complete! Run `research-organizer run` to start.\n");
    Ok(config)
}

/// Prompt the user for input with a label.
fn prompt(reader: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompt with a default value.
fn prompt_with_default(reader: &mut impl BufRead, label: &str, default: &str) -> Result<String> {
    print!("{} [{}]: ", label, default);
    io::stdout().flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn prompt_yes_no(reader: &mut impl BufRead, label: &str, default: bool) -> Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    print!("{} [{}]: ", label, hint);
    io::stdout().flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(default)
    } else {
        Ok(is_yes(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_wizard_writes_config() {
        let dir = tempfile::tempdir().unwrap();
        let answers = "y\nhttp://gpu:9000\nllama-3\nsecret\n\nn\n";
        let config = run_setup_wizard_with(&mut Cursor::new(answers), dir.path()).unwrap();

        assert_eq!(config.llm.api_url, "http://gpu:9000");
        assert_eq!(config.llm.model, "llama-3");
        assert_eq!(config.llm.api_key, "secret");
        assert!(config.db_path.is_empty());
        assert!(config
            .providers
            .iter()
            .all(|p| p.kind == ProviderKind::InProcess));

        let saved = config::load_config(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(saved.llm.model, "llama-3");
    }

    #[test]
    fn test_wizard_without_model_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            run_setup_wizard_with(&mut Cursor::new("n\n/tmp/papers.db\n\n"), dir.path()).unwrap();
        assert!(!config.llm.enabled);
        assert_eq!(config.db_path, "/tmp/papers.db");
        assert!(config
            .providers
            .iter()
            .all(|p| p.kind == ProviderKind::Builtin));
    }
}

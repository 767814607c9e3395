//! Research Organizer — console research-paper assistant.
//!
//! Usage:
//!   research-organizer run               Start the interactive session
//!   research-organizer ask <text>        Process one request, print JSON
//!   research-organizer tools             Show discovered tools and intents
//!   research-organizer demo              Run the scripted walkthrough
//!   research-organizer serve <server>    Host a built-in tool server on stdio
//!   research-organizer setup             Run the setup wizard

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use research_organizer::config::{self, OrganizerConfig, CONFIG_FILE};
use research_organizer::dispatch::{Confirmer, ConsoleConfirmer};
use research_organizer::intent::{IntentSet, CATALOG};
use research_organizer::llm;
use research_organizer::mcp::serve_provider;
use research_organizer::providers::{builtin_provider, BuiltinServer, ProviderContext};
use research_organizer::session::{discover_tools, run_demo, DemoOutcome, Session};
use research_organizer::ui::{ConsoleInput, Ui};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "research-organizer")]
#[command(version)]
#[command(about = "Research paper assistant with natural-language commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the organizer home directory.
    #[arg(long, global = true)]
    home: Option<String>,

    /// Log level (debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive session.
    Run,

    /// Process a single request and print the result as JSON.
    Ask {
        /// The request, e.g. "list topics" or "show me papers about vision".
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Discover tools and show which intents they enable.
    Tools,

    /// Run a scripted natural-language walkthrough on a fresh demo database.
    Demo,

    /// Host a built-in tool server over stdin/stdout.
    Serve {
        #[arg(value_enum)]
        server: BuiltinServer,
    },

    /// Run the setup wizard.
    Setup,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let home_dir = match &cli.home {
        Some(home) => PathBuf::from(shellexpand::tilde(home).into_owned()),
        None => config::default_home_dir(),
    };
    let config_path = home_dir.join(CONFIG_FILE);
    let cfg = config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Logs go to stderr: stdout carries the REPL and the stdio tool protocol.
    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run => cmd_run(&home_dir, &cfg).await,
        Commands::Ask { text } => cmd_ask(&home_dir, &cfg, &text.join(" ")).await,
        Commands::Tools => cmd_tools(&home_dir, &cfg).await,
        Commands::Demo => cmd_demo(&home_dir, &cfg).await,
        Commands::Serve { server } => cmd_serve(&home_dir, &cfg, server).await,
        Commands::Setup => cmd_setup(&home_dir),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_setup(home_dir: &Path) -> Result<()> {
    research_organizer::setup::run_setup_wizard(home_dir)?;
    Ok(())
}

async fn cmd_run(home_dir: &Path, cfg: &OrganizerConfig) -> Result<()> {
    ensure_home(home_dir)?;
    let ui = Ui::stdout();
    if !home_dir.join(CONFIG_FILE).exists() {
        ui.info("No configuration found; using defaults. Run `research-organizer setup` to customize.");
    }

    let input = ConsoleInput::new(ui);
    let confirmer: Arc<dyn Confirmer> = Arc::new(ConsoleConfirmer::new(input.clone()));
    let session = Session::from_config(cfg, home_dir, confirmer, ui).await?;

    println!(
        "{} {} tool(s) available, {} intent(s) enabled",
        ">>>".green().bold(),
        session.registry().tool_names().len(),
        session.intents().names().len(),
    );
    session.run(&input).await
}

async fn cmd_ask(home_dir: &Path, cfg: &OrganizerConfig, text: &str) -> Result<()> {
    ensure_home(home_dir)?;
    let ui = Ui::stderr();
    let input = ConsoleInput::new(ui);
    let confirmer: Arc<dyn Confirmer> = Arc::new(ConsoleConfirmer::new(input));
    let session = Session::from_config(cfg, home_dir, confirmer, ui).await?;

    let result = session.handle_input(text).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize result")?
    );
    Ok(())
}

async fn cmd_tools(home_dir: &Path, cfg: &OrganizerConfig) -> Result<()> {
    ensure_home(home_dir)?;
    let model = llm::model_from_config(cfg);
    let registry = discover_tools(cfg, home_dir, model.clone()).await?;

    let mut by_provider: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for descriptor in registry.descriptors() {
        let provider = registry.provider_of(&descriptor.name).unwrap_or("?");
        by_provider
            .entry(provider)
            .or_default()
            .push(descriptor.name.as_str());
    }

    println!();
    println!("{}", "=== Tools ===".bold());
    for (provider, tools) in &by_provider {
        println!("  {}:", provider.bold());
        for tool in tools {
            let description = registry
                .descriptor(tool)
                .map(|d| d.description.as_str())
                .unwrap_or("");
            println!("    {} {}", format!("{tool:<24}").cyan(), description);
        }
    }
    for skipped in registry.skipped_providers() {
        println!("  {} {} ({})", "skipped".red(), skipped.name, skipped.reason);
    }

    let intents = IntentSet::resolve(&CATALOG, |name| registry.contains(name));
    println!();
    println!("{}", "=== Intents ===".bold());
    for name in intents.names() {
        println!("  {} {}", "enabled ".green(), name);
    }
    for disabled in intents.disabled() {
        println!(
            "  {} {} (missing: {})",
            "disabled".red(),
            disabled.name,
            disabled.missing_tools.join(", ")
        );
    }
    println!(
        "\n  Natural language: {}",
        if model.is_ready() {
            "on".green()
        } else {
            "off (fixed commands only)".yellow()
        }
    );
    println!();
    Ok(())
}

/// The demo gets its own home so the user's database is never touched. The
/// config is written there too, since out-of-process servers read it.
async fn cmd_demo(home_dir: &Path, cfg: &OrganizerConfig) -> Result<()> {
    let demo_home = home_dir.join("demo");
    ensure_home(&demo_home)?;

    let mut demo_cfg = cfg.clone();
    demo_cfg.db_path = String::new();
    let db_path = demo_cfg.resolved_db_path(&demo_home);
    if db_path.exists() {
        std::fs::remove_file(&db_path).with_context(|| {
            format!("Failed to reset demo database: {}", db_path.display())
        })?;
    }
    config::save_config(&demo_cfg, &demo_home.join(CONFIG_FILE))?;

    let ui = Ui::stdout();
    ui.info("Running Research Organizer demo...");
    let input = ConsoleInput::new(ui);
    let confirmer: Arc<dyn Confirmer> = Arc::new(ConsoleConfirmer::new(input));
    let session = Session::from_config(&demo_cfg, &demo_home, confirmer, ui).await?;
    ui.success(&format!("Database initialized at {}", db_path.display()));

    match run_demo(&session).await {
        DemoOutcome::Completed(steps) => {
            let failed = steps.iter().filter(|s| !s.result.success).count();
            info!("Demo ran {} step(s), {} failed", steps.len(), failed);
            Ok(())
        }
        DemoOutcome::NoModel => anyhow::bail!("Demo needs a language model"),
        DemoOutcome::MissingIntents(missing) => {
            anyhow::bail!("Demo intents unavailable: {}", missing.join(", "))
        }
    }
}

async fn cmd_serve(home_dir: &Path, cfg: &OrganizerConfig, server: BuiltinServer) -> Result<()> {
    ensure_home(home_dir)?;
    let model = llm::model_from_config(cfg);
    let ctx = Arc::new(ProviderContext::from_config(cfg, home_dir, model));
    let provider = builtin_provider(server, ctx)?;

    info!("Serving built-in '{}' on stdio", server);
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    serve_provider(&provider, reader, tokio::io::stdout())
        .await
        .with_context(|| format!("Tool server '{}' failed", server))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ensure_home(home_dir: &Path) -> Result<()> {
    if !home_dir.exists() {
        std::fs::create_dir_all(home_dir).with_context(|| {
            format!("Failed to create home directory: {}", home_dir.display())
        })?;
    }
    Ok(())
}

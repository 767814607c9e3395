//! Colored terminal output.

pub mod input;
pub mod render;

pub use input::ConsoleInput;

use colored::Colorize;
use serde_json::Value;
use std::fmt::Display;
use std::io::Write;

/// Where user-facing output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiTarget {
    Stdout,
    /// Keeps stdout free for machine-readable output.
    Stderr,
    Silent,
}

/// User-facing output sink. Cheap to copy into handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ui {
    target: UiTarget,
}

const BANNER: &str = r#"
  ╔══════════════════════════════════════════════════════════╗
  ║        Research Organizer - AI Research Assistant        ║
  ╚══════════════════════════════════════════════════════════╝
"#;

const COMMANDS: &[(&str, &str)] = &[
    ("add topic <name> [description]", "Add a new research topic"),
    ("list topics", "Show all topics"),
    ("remove topic <name>", "Remove a topic"),
    ("add paper <arxiv_url>", "Add a paper from ArXiv"),
    ("list papers [topic]", "List all papers or papers for a topic"),
    ("summarize topic <name>", "Summarize the papers on a topic"),
    ("help", "Show this help message"),
    ("exit | quit", "Exit the application"),
];

const NATURAL_EXAMPLES: &[&str] = &[
    "add machine learning as a topic",
    "show me papers about neural networks",
    "summarize deep learning papers",
    "add this paper: https://arxiv.org/abs/1706.03762",
];

impl Ui {
    pub fn new(target: UiTarget) -> Self {
        Self { target }
    }

    pub fn stdout() -> Self {
        Self::new(UiTarget::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(UiTarget::Stderr)
    }

    pub fn silent() -> Self {
        Self::new(UiTarget::Silent)
    }

    pub fn target(&self) -> UiTarget {
        self.target
    }

    fn emit(&self, text: impl Display) {
        match self.target {
            UiTarget::Stdout => println!("{text}"),
            UiTarget::Stderr => eprintln!("{text}"),
            UiTarget::Silent => {}
        }
    }

    /// Write `text` without a newline and flush.
    pub fn prompt(&self, text: &str) -> std::io::Result<()> {
        let text = text.cyan().bold();
        match self.target {
            UiTarget::Stdout => {
                let mut out = std::io::stdout();
                write!(out, "{text}")?;
                out.flush()
            }
            UiTarget::Stderr => {
                let mut out = std::io::stderr();
                write!(out, "{text}")?;
                out.flush()
            }
            UiTarget::Silent => Ok(()),
        }
    }

    pub fn blank(&self) {
        self.emit("");
    }

    pub fn success(&self, message: &str) {
        self.emit(format!("{} {}", "✔".green().bold(), message.green().bold()));
    }

    pub fn error(&self, message: &str) {
        self.emit(format!("{} {}", "✘".red().bold(), message.red().bold()));
    }

    pub fn warning(&self, message: &str) {
        self.emit(format!("{} {}", "!".yellow().bold(), message.yellow().bold()));
    }

    pub fn info(&self, message: &str) {
        self.emit(format!("{} {}", "i".blue().bold(), message.blue().bold()));
    }

    pub fn divider(&self) {
        self.emit("─".repeat(60).dimmed());
    }

    /// Echo a scripted utterance as if the user had typed it.
    pub fn user_said(&self, text: &str) {
        self.emit(format!("{} {}", "You:".cyan().bold(), text));
    }

    /// Progress of a multi-step action.
    pub fn step(&self, message: &str) {
        self.emit(format!("{} {}", ">>>".magenta().bold(), message));
    }

    pub fn topics(&self, topics: &[Value]) {
        if topics.is_empty() {
            self.info("No topics found.");
            return;
        }
        self.emit(render::topics_table(topics));
    }

    pub fn papers(&self, papers: &[Value], topic: Option<&str>) {
        if papers.is_empty() {
            match topic {
                Some(topic) => self.info(&format!("No papers found for topic '{topic}'.")),
                None => self.info("No papers found."),
            }
            return;
        }
        self.emit(render::papers_table(papers, topic));
    }

    pub fn article_card(&self, title: &str, abstract_text: &str, topics: &[String]) {
        self.emit(render::article_card(title, abstract_text, topics));
    }

    pub fn markdown(&self, text: &str) {
        self.emit(render::markdown(text));
    }

    pub fn help(&self) {
        self.emit("Research Organizer Commands".bold());
        for (usage, description) in COMMANDS {
            self.emit(format!("  {} {}", format!("{usage:<34}").cyan(), description));
        }
    }

    /// Banner plus usage. With a model, natural-language examples are shown too.
    pub fn welcome(&self, natural_language: bool) {
        self.emit(BANNER.cyan().bold());
        if natural_language {
            self.emit("Talk naturally:".bold());
            for example in NATURAL_EXAMPLES {
                self.emit(format!("  \"{example}\""));
            }
            self.blank();
            self.emit("Or use commands:".bold());
        } else {
            self.emit("Commands:".bold());
        }
        for (usage, description) in COMMANDS {
            self.emit(format!("  {} {}", format!("{usage:<34}").cyan(), description));
        }
        self.blank();
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::stdout()
    }
}

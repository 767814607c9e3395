//! Line input from the terminal, shared by the REPL and confirmations.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::Ui;

/// One stdin line reader for the whole process. Cloning shares the reader,
/// so prompts and confirmations never race for buffered input.
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
    ui: Ui,
}

impl ConsoleInput {
    /// Prompts are written through `ui`.
    pub fn new(ui: Ui) -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
            ui,
        }
    }

    /// Show `prompt` and read one line. `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        self.ui.prompt(prompt)?;
        let mut lines = self.lines.lock().await;
        lines.next_line().await
    }
}

//! Yes/no confirmation from the user.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::ui::ConsoleInput;

/// Asks the user a yes/no question.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// `true` only on an explicit yes.
    async fn confirm(&self, question: &str) -> bool;
}

/// Confirms on the terminal: `y`/`yes` is a yes, anything else a no.
#[derive(Clone)]
pub struct ConsoleConfirmer {
    input: ConsoleInput,
}

impl ConsoleConfirmer {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Confirmer for ConsoleConfirmer {
    async fn confirm(&self, question: &str) -> bool {
        match self.input.read_line(&format!("{question} [y/n]: ")).await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

/// Answers from a script and records the questions. An exhausted script
/// answers no.
#[derive(Clone, Default)]
pub struct ScriptedConfirmer {
    answers: Arc<Mutex<VecDeque<bool>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
            asked: Arc::default(),
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, question: &str) -> bool {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
        assert!(!is_yes("yep"));
    }

    #[tokio::test]
    async fn test_scripted_answers_then_no() {
        let confirmer = ScriptedConfirmer::new([true]);
        assert!(confirmer.confirm("first?").await);
        assert!(!confirmer.confirm("second?").await);
        assert_eq!(confirmer.asked(), vec!["first?", "second?"]);
    }
}

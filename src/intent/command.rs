//! Fixed command syntax, recognised before any model call.

use std::collections::BTreeMap;

use super::catalog::{EXIT, HELP};
use super::classifier::Classification;
use crate::types::Confidence;

/// Strip a case-insensitive command prefix that ends at a word boundary.
/// Returns the trimmed remainder.
fn strip_command<'a>(input: &'a str, command: &str) -> Option<&'a str> {
    let head = input.get(..command.len())?;
    if !head.eq_ignore_ascii_case(command) {
        return None;
    }
    let rest = &input[command.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

fn with_params(intent: &str, pairs: &[(&str, &str)]) -> Classification {
    let parameters: BTreeMap<String, String> = pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Classification::new(intent, parameters, Confidence::High)
}

/// Parse `input` as a fixed command. A recognised command becomes a
/// high-confidence classification; anything else is `None`.
///
/// `add topic <name> [description]` takes the first word as the name and the
/// rest as the description.
pub fn parse_command(input: &str) -> Option<Classification> {
    let input = input.trim();

    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return Some(with_params(EXIT, &[]));
    }
    if input.eq_ignore_ascii_case("help") {
        return Some(with_params(HELP, &[]));
    }

    if let Some(rest) = strip_command(input, "add topic") {
        let (name, description) = match rest.split_once(char::is_whitespace) {
            Some((name, description)) => (name, description.trim()),
            None => (rest, ""),
        };
        return Some(with_params(
            "add_topic",
            &[("topic_name", name), ("topic_description", description)],
        ));
    }
    if strip_command(input, "list topics") == Some("") {
        return Some(with_params("list_topics", &[]));
    }
    if let Some(name) = strip_command(input, "remove topic") {
        return Some(with_params("remove_topic", &[("topic_name", name)]));
    }
    if let Some(url) = strip_command(input, "add paper") {
        return Some(with_params("add_paper", &[("arxiv_url", url)]));
    }
    if let Some(topic) = strip_command(input, "list papers") {
        return Some(with_params("list_papers", &[("topic_name", topic)]));
    }
    if let Some(topic) = strip_command(input, "summarize topic") {
        return Some(with_params("summarize_topic", &[("topic_name", topic)]));
    }
    None
}

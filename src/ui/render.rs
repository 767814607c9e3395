//! Plain-text rendering of tool payloads: tables, the article card, markdown.

use colored::Colorize;
use serde_json::Value;

use crate::agents::structured::truncate_chars;

const DESCRIPTION_WIDTH: usize = 60;
const TITLE_WIDTH: usize = 50;
const CARD_ABSTRACT_CHARS: usize = 500;

fn text_field<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("")
}

fn id_field(row: &Value) -> String {
    match row.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Column-aligned table. Widths fit the widest cell per column.
fn table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let rule: String = widths
        .iter()
        .map(|w| "─".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("┼");

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(title.bold().to_string());
    let header: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!(" {} ", pad(h, *w).magenta().bold()))
        .collect();
    out.push(header.join("│"));
    out.push(rule);
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!(" {} ", pad(cell, *w)))
            .collect();
        out.push(cells.join("│"));
    }
    out.join("\n")
}

/// Topics as an `ID | Name | Description` table.
pub fn topics_table(topics: &[Value]) -> String {
    let rows: Vec<Vec<String>> = topics
        .iter()
        .map(|topic| {
            vec![
                id_field(topic),
                text_field(topic, "name").to_string(),
                truncate_chars(text_field(topic, "description"), DESCRIPTION_WIDTH, "..."),
            ]
        })
        .collect();
    table("Research Topics", &["ID", "Name", "Description"], &rows)
}

/// Papers as an `ID | Title | ArXiv URL` table.
pub fn papers_table(papers: &[Value], topic: Option<&str>) -> String {
    let title = match topic {
        Some(topic) => format!("Papers - {topic}"),
        None => "All Papers".to_string(),
    };
    let rows: Vec<Vec<String>> = papers
        .iter()
        .map(|paper| {
            let title = text_field(paper, "title");
            let title = if title.chars().count() > TITLE_WIDTH {
                truncate_chars(title, TITLE_WIDTH - 3, "...")
            } else {
                title.to_string()
            };
            vec![
                id_field(paper),
                title,
                text_field(paper, "arxiv_url").to_string(),
            ]
        })
        .collect();
    table(&title, &["ID", "Title", "ArXiv URL"], &rows)
}

/// The card shown after a paper is stored.
pub fn article_card(title: &str, abstract_text: &str, topics: &[String]) -> String {
    let mut out = vec![
        "── Paper Added ──".green().bold().to_string(),
        "Title:".cyan().bold().to_string(),
        title.to_string(),
        String::new(),
        "Abstract:".cyan().bold().to_string(),
        truncate_chars(abstract_text, CARD_ABSTRACT_CHARS, "..."),
    ];
    if !topics.is_empty() {
        let names: Vec<String> = topics.iter().map(|t| t.green().to_string()).collect();
        out.push(String::new());
        out.push(format!("{} {}", "Topics:".cyan().bold(), names.join(", ")));
    }
    out.join("\n")
}

/// Light terminal styling for the markdown the summarizer produces:
/// headings in bold cyan, `**strong**` lines in bold.
pub fn markdown(text: &str) -> String {
    text.lines()
        .map(|line| {
            if let Some(heading) = line.strip_prefix("## ") {
                heading.cyan().bold().to_string()
            } else if let Some(heading) = line.strip_prefix("# ") {
                heading.cyan().bold().underline().to_string()
            } else if line.len() > 4 && line.starts_with("**") && line.ends_with("**") {
                line[2..line.len() - 2].bold().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topics_table_truncates_description() {
        colored::control::set_override(false);
        let long = "d".repeat(80);
        let out = topics_table(&[json!({"id": 3, "name": "nlp", "description": long})]);
        assert!(out.starts_with("Research Topics"));
        assert!(out.contains(" 3  │ nlp "));
        assert!(out.contains(&format!("{}...", "d".repeat(60))));
        assert!(!out.contains(&"d".repeat(61)));
    }

    #[test]
    fn test_papers_table_title_and_truncation() {
        colored::control::set_override(false);
        let long = "t".repeat(60);
        let out = papers_table(
            &[json!({"id": 1, "title": long, "arxiv_url": "https://arxiv.org/abs/1"})],
            Some("nlp"),
        );
        assert!(out.starts_with("Papers - nlp"));
        assert!(out.contains(&format!("{}...", "t".repeat(47))));
        assert!(out.contains("https://arxiv.org/abs/1"));
    }

    #[test]
    fn test_article_card_lists_topics() {
        colored::control::set_override(false);
        let out = article_card("Attention", "Abstract body", &["nlp".into(), "ml".into()]);
        assert!(out.contains("Title:\nAttention"));
        assert!(out.contains("Topics: nlp, ml"));
        let out = article_card("Attention", "Abstract body", &[]);
        assert!(!out.contains("Topics:"));
    }

    #[test]
    fn test_markdown_headings() {
        colored::control::set_override(false);
        let out = markdown("## Overview\ntext\n**Paper**\n  point");
        assert_eq!(out, "Overview\ntext\nPaper\n  point");
    }
}

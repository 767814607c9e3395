//! ArXiv metadata fetcher.
//!
//! Resolves an ArXiv URL or bare identifier, queries the export API and reads
//! the first Atom `<entry>` of the response.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::types::ArxivPaper;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"arxiv\.org/(?:abs|pdf)/(\d+\.\d+)").expect("valid arxiv url pattern")
});

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+)(?:v\d+)?$").expect("valid arxiv id pattern"));

/// Errors from fetching paper metadata.
#[derive(Debug, Error)]
pub enum ArxivError {
    #[error("Invalid ArXiv URL or ID: {0}")]
    InvalidIdentifier(String),

    #[error("Error fetching paper from ArXiv: {0}")]
    Http(String),

    #[error("Paper not found: {0}")]
    NotFound(String),

    #[error("Error parsing ArXiv response: {0}")]
    Parse(String),
}

/// Extract the ArXiv identifier from a URL (`/abs/` or `/pdf/`) or a bare id.
/// Version suffixes are dropped.
pub fn extract_arxiv_id(input: &str) -> Option<String> {
    let input = input.trim();
    URL_ID
        .captures(input)
        .or_else(|| BARE_ID.captures(input))
        .map(|caps| caps[1].to_string())
}

/// Canonical abstract-page URL for an identifier.
pub fn canonical_url(arxiv_id: &str) -> String {
    format!("https://arxiv.org/abs/{arxiv_id}")
}

/// HTTP client for the ArXiv export API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    api_url: String,
    http: reqwest::Client,
}

impl ArxivClient {
    pub fn new(api_url: &str, timeout_secs: u64) -> Result<Self, ArxivError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArxivError::Http(e.to_string()))?;
        Ok(Self {
            api_url: api_url.to_string(),
            http,
        })
    }

    /// Fetch metadata for an ArXiv URL or identifier.
    pub async fn fetch(&self, url_or_id: &str) -> Result<ArxivPaper, ArxivError> {
        let arxiv_id = extract_arxiv_id(url_or_id)
            .ok_or_else(|| ArxivError::InvalidIdentifier(url_or_id.to_string()))?;

        debug!("Fetching ArXiv metadata for {}", arxiv_id);

        let resp = self
            .http
            .get(&self.api_url)
            .query(&[("id_list", arxiv_id.as_str())])
            .send()
            .await
            .map_err(|e| ArxivError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ArxivError::Http(format!("HTTP {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ArxivError::Http(e.to_string()))?;

        parse_feed(&body, &arxiv_id)
    }
}

/// Read the first entry of an export API Atom feed.
pub fn parse_feed(xml: &str, arxiv_id: &str) -> Result<ArxivPaper, ArxivError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| ArxivError::Parse(e.to_string()))?;

    let entry = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name((ATOM_NS, "entry")))
        .ok_or_else(|| ArxivError::NotFound(arxiv_id.to_string()))?;

    let child_text = |name: &str| {
        entry
            .children()
            .find(|n| n.has_tag_name((ATOM_NS, name)))
            .and_then(|n| n.text())
            .map(collapse_whitespace)
    };

    // The API answers unknown ids with a single entry pointing at its error page.
    if child_text("id").is_some_and(|id| id.contains("/api/errors")) {
        return Err(ArxivError::NotFound(arxiv_id.to_string()));
    }

    let authors = entry
        .children()
        .filter(|n| n.has_tag_name((ATOM_NS, "author")))
        .filter_map(|author| {
            author
                .children()
                .find(|n| n.has_tag_name((ATOM_NS, "name")))
                .and_then(|n| n.text())
                .map(collapse_whitespace)
        })
        .collect();

    Ok(ArxivPaper {
        arxiv_id: arxiv_id.to_string(),
        title: child_text("title").unwrap_or_else(|| "Unknown Title".to_string()),
        abstract_text: child_text("summary").unwrap_or_default(),
        arxiv_url: canonical_url(arxiv_id),
        authors,
        published: child_text("published"),
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models
      are based on recurrent networks.  </summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_extract_id_forms() {
        assert_eq!(
            extract_arxiv_id("https://arxiv.org/abs/2412.01234").as_deref(),
            Some("2412.01234")
        );
        assert_eq!(
            extract_arxiv_id("https://arxiv.org/pdf/2412.01234v2").as_deref(),
            Some("2412.01234")
        );
        assert_eq!(extract_arxiv_id("2412.01234").as_deref(), Some("2412.01234"));
        assert_eq!(extract_arxiv_id(" 2412.01234v3 ").as_deref(), Some("2412.01234"));
        assert!(extract_arxiv_id("https://example.com/paper").is_none());
        assert!(extract_arxiv_id("").is_none());
    }

    #[test]
    fn test_parse_feed_collapses_whitespace() {
        let paper = parse_feed(FEED, "1706.03762").unwrap();
        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(
            paper.abstract_text,
            "The dominant sequence transduction models are based on recurrent networks."
        );
        assert_eq!(paper.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(paper.arxiv_url, "https://arxiv.org/abs/1706.03762");
        assert_eq!(paper.published.as_deref(), Some("2017-06-12T17:57:34Z"));
    }

    #[test]
    fn test_parse_feed_without_entry_is_not_found() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title></feed>"#;
        assert!(matches!(
            parse_feed(xml, "9999.99999"),
            Err(ArxivError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_feed_error_entry_is_not_found() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
            <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234.5</id>
            <title>Error</title></entry></feed>"#;
        assert!(matches!(parse_feed(xml, "1234.5"), Err(ArxivError::NotFound(_))));
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(matches!(
            parse_feed("not xml <", "1.1"),
            Err(ArxivError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_queries_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("id_list", "1706.03762"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArxivClient::new(&server.uri(), 5).unwrap();
        let paper = client
            .fetch("https://arxiv.org/abs/1706.03762v7")
            .await
            .unwrap();
        assert_eq!(paper.arxiv_id, "1706.03762");
    }

    #[tokio::test]
    async fn test_fetch_invalid_identifier_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .expect(0)
            .mount(&server)
            .await;

        let client = ArxivClient::new(&server.uri(), 5).unwrap();
        let err = client.fetch("not-an-id").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid ArXiv URL or ID: not-an-id");
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ArxivClient::new(&server.uri(), 5).unwrap();
        assert!(matches!(
            client.fetch("1706.03762").await,
            Err(ArxivError::Http(_))
        ));
    }
}

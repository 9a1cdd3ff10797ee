//! Data models for discovered articles, retrieved content, and drafts.
//!
//! This module defines the core data structures that flow through the
//! generation pipeline:
//! - [`ScrapedPage`]: rendered article content returned by the scraping service
//! - [`RetrievedContent`]: per-link retrieval outcome, success or contained failure
//! - [`DraftPost`]: the structured draft (title + body) produced by the model
//! - [`GeneratedPost`]: one result row handed to the caller (url + title + content)
//! - [`DraftBatch`]: the full batch for a single pipeline run
//!
//! Failures are carried as values of the same nominal shape as successes
//! (an error-flavored [`RetrievedContent`] or [`DraftPost`]) so that one bad
//! article can never abort the rest of the batch.

use serde::{Deserialize, Serialize};

/// Rendered content for a single article page, as returned by the
/// page-retrieval service.
///
/// The markdown rendering is the primary payload and is what gets fed to
/// the drafting model. The raw HTML rendering and the page title are kept
/// when the service reports them.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    /// Markdown rendering of the page, suitable for text extraction.
    pub markdown: String,
    /// Raw HTML rendering, when requested and returned.
    pub html: Option<String>,
    /// Page title from the scrape metadata, when available.
    pub title: Option<String>,
}

/// Outcome of retrieving one article link: either the rendered page or a
/// contained failure carrying a human-readable cause.
///
/// Exactly one variant applies; a failed retrieval still occupies its slot
/// in the batch so every discovered link produces one result row.
#[derive(Debug, Clone)]
pub enum RetrievedContent {
    /// The page was retrieved and rendered successfully.
    Page(ScrapedPage),
    /// Retrieval failed; the string is the human-readable cause.
    Failed(String),
}

impl RetrievedContent {
    /// The failure cause, if this slot holds one.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            RetrievedContent::Failed(msg) => Some(msg),
            RetrievedContent::Page(_) => None,
        }
    }
}

/// A structured draft blog post produced by the drafting model.
///
/// A successful draft has a non-empty title and non-empty content; the
/// synthesis stage rejects model output that parses but leaves either
/// field empty. Failed rows carry an error-flavored draft built with
/// [`DraftPost::error`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DraftPost {
    /// The headline of the draft post.
    pub title: String,
    /// The body of the draft post.
    pub content: String,
}

impl DraftPost {
    /// Build the error-flavored draft that stands in for a failed row.
    ///
    /// The title is the literal `"Error"` so failed rows are immediately
    /// recognizable in any rendering; the content carries the failure
    /// detail so the caller can see why the row failed.
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            content: detail.into(),
        }
    }
}

/// One result row: a discovered article link paired with its draft.
///
/// Rows are emitted in discovery order, one per discovered link, including
/// links whose retrieval or synthesis failed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratedPost {
    /// The normalized absolute URL the draft was generated from.
    pub url: String,
    /// The draft headline (or `"Error"` for failed rows).
    pub title: String,
    /// The draft body (or the failure detail for failed rows).
    pub content: String,
}

impl GeneratedPost {
    /// Extract the domain name (before .com/.org/etc) from the source URL.
    /// For example: "https://news.google.com/articles/abc" -> "google"
    pub fn source_tag(&self) -> Option<String> {
        if let Ok(parsed) = url::Url::parse(&self.url) {
            if let Some(host) = parsed.host_str() {
                // Split by dots and get the domain before the TLD,
                // handling hosts like "news.google.com" -> "google"
                let parts: Vec<&str> = host.split('.').collect();
                if parts.len() >= 2 {
                    return Some(parts[parts.len() - 2].to_string());
                }
            }
        }
        None
    }
}

/// The complete output of one pipeline run.
///
/// Each run produces one `DraftBatch`, which the shell renders to stdout
/// and optionally serializes to JSON and Markdown files.
#[derive(Debug, Deserialize, Serialize)]
pub struct DraftBatch {
    /// The free-text query the batch was generated for.
    pub query: String,
    /// The local date of generation in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of generation in `HH-MM-SS` format.
    pub local_time: String,
    /// One row per discovered link, in discovery order.
    pub posts: Vec<GeneratedPost>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraped_page_creation() {
        let page = ScrapedPage {
            markdown: "# Headline\n\nBody text".to_string(),
            html: Some("<h1>Headline</h1>".to_string()),
            title: Some("Headline".to_string()),
        };
        assert_eq!(page.markdown, "# Headline\n\nBody text");
        assert_eq!(page.title.as_deref(), Some("Headline"));
    }

    #[test]
    fn test_retrieved_content_page_accessors() {
        let content = RetrievedContent::Page(ScrapedPage {
            markdown: "text".to_string(),
            html: None,
            title: None,
        });
        assert_eq!(content.failure_message(), None);
    }

    #[test]
    fn test_retrieved_content_failed_accessors() {
        let content = RetrievedContent::Failed("Error scraping content: timeout".to_string());
        assert_eq!(
            content.failure_message(),
            Some("Error scraping content: timeout")
        );
    }

    #[test]
    fn test_draft_post_error_flavor() {
        let draft = DraftPost::error("Draft generation failed: empty model response");
        assert_eq!(draft.title, "Error");
        assert_eq!(
            draft.content,
            "Draft generation failed: empty model response"
        );
    }

    #[test]
    fn test_draft_post_deserialization() {
        let json = r#"{"title": "AI in 2025", "content": "The year ahead."}"#;
        let draft: DraftPost = serde_json::from_str(json).unwrap();
        assert_eq!(draft.title, "AI in 2025");
        assert_eq!(draft.content, "The year ahead.");
    }

    #[test]
    fn test_draft_post_missing_content_field_fails() {
        let json = r#"{"title": "AI in 2025"}"#;
        let result: Result<DraftPost, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_generated_post_serialization() {
        let post = GeneratedPost {
            url: "https://news.google.com/articles/abc".to_string(),
            title: "Title".to_string(),
            content: "Content".to_string(),
        };
        let json = serde_json::to_string(&post).unwrap();
        let deserialized: GeneratedPost = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.url, "https://news.google.com/articles/abc");
        assert_eq!(deserialized.title, "Title");
    }

    #[test]
    fn test_batch_serialization() {
        let batch = DraftBatch {
            query: "AI in 2025".to_string(),
            local_date: "2025-05-06".to_string(),
            local_time: "20:30:00".to_string(),
            posts: vec![],
        };
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains("AI in 2025"));
        assert!(json.contains("2025-05-06"));
    }

    #[test]
    fn test_batch_deserialization() {
        let json = r#"{
            "query": "quantum computing",
            "local_date": "2025-05-06",
            "local_time": "08:00:00",
            "posts": [
                {"url": "https://news.google.com/articles/a", "title": "T", "content": "C"}
            ]
        }"#;
        let batch: DraftBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.query, "quantum computing");
        assert_eq!(batch.posts.len(), 1);
        assert_eq!(batch.posts[0].url, "https://news.google.com/articles/a");
    }

    #[test]
    fn test_source_tag_google_news() {
        let post = GeneratedPost {
            url: "https://news.google.com/articles/CBMiabc".to_string(),
            title: "Test".to_string(),
            content: "Body".to_string(),
        };
        assert_eq!(post.source_tag(), Some("google".to_string()));
    }

    #[test]
    fn test_source_tag_simple_domain() {
        let post = GeneratedPost {
            url: "https://example.com/article".to_string(),
            title: "Test".to_string(),
            content: "Body".to_string(),
        };
        assert_eq!(post.source_tag(), Some("example".to_string()));
    }

    #[test]
    fn test_source_tag_unparseable_url() {
        let post = GeneratedPost {
            url: "not a url".to_string(),
            title: "Error".to_string(),
            content: "detail".to_string(),
        };
        assert_eq!(post.source_tag(), None);
    }
}

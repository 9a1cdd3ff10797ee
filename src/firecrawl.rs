//! Firecrawl scraping client.
//!
//! Thin REST client for the Firecrawl v1 `/scrape` endpoint. Each call
//! requests markdown and raw HTML for one URL, waiting a configurable
//! interval for client-side rendering before capture.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::models::{RetrievedContent, ScrapedPage};
use crate::pipeline::RetrievePage;

pub const FIRECRAWL_BASE_URL: &str = "https://api.firecrawl.dev/v1";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("scrape reported failure: {0}")]
    Unsuccessful(String),

    #[error("scrape response missing markdown content")]
    MissingContent,
}

impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        ScrapeError::Network(e.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest {
    url: String,
    formats: Vec<String>,
    wait_for: u64,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
}

/// Client for the Firecrawl scraping API.
pub struct FirecrawlClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    render_wait_ms: u64,
}

impl FirecrawlClient {
    pub fn new(api_key: impl Into<String>, render_wait_ms: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: FIRECRAWL_BASE_URL.to_string(),
            render_wait_ms,
        }
    }

    /// Scrape one URL, returning its markdown alongside optional HTML and title.
    #[instrument(level = "debug", skip(self))]
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage, ScrapeError> {
        let request = ScrapeRequest {
            url: url.to_string(),
            formats: vec!["markdown".to_string(), "html".to_string()],
            wait_for: self.render_wait_ms,
        };

        let response = self
            .http
            .post(format!("{}/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ScrapeResponse = response.json().await?;
        page_from_response(body)
    }
}

fn page_from_response(body: ScrapeResponse) -> Result<ScrapedPage, ScrapeError> {
    if !body.success {
        let reason = body.error.unwrap_or_else(|| "no error detail".to_string());
        return Err(ScrapeError::Unsuccessful(reason));
    }
    let data = body.data.ok_or(ScrapeError::MissingContent)?;
    let markdown = data.markdown.ok_or(ScrapeError::MissingContent)?;
    Ok(ScrapedPage {
        markdown,
        html: data.html,
        title: data.metadata.and_then(|m| m.title),
    })
}

impl RetrievePage for FirecrawlClient {
    /// Retrieve one page as data, folding any failure into the result.
    async fn retrieve(&self, url: &str) -> RetrievedContent {
        match self.scrape(url).await {
            Ok(page) => {
                debug!(
                    %url,
                    markdown_len = page.markdown.len(),
                    page_title = ?page.title,
                    has_html = page.html.is_some(),
                    "Scraped article"
                );
                RetrievedContent::Page(page)
            }
            Err(e) => {
                warn!(%url, error = %e, "Scrape failed; recording error content");
                RetrievedContent::Failed(format!("Error scraping content: {e}"))
            }
        }
    }
}

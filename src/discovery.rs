//! Google News link discovery.
//!
//! This module turns a free-text search query into a bounded, ordered list
//! of article URLs by scraping the [Google News](https://news.google.com)
//! search results page.
//!
//! # URL Pattern
//!
//! Articles in the listing are linked with relative hrefs like
//! `./articles/CBMi...` or `./read/CBMi...`, which are rewritten to
//! absolute URLs under `https://news.google.com`. Already-absolute hrefs
//! pass through unchanged, so normalization is idempotent.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::pipeline::DiscoverLinks;

/// Base URL of the news aggregator; relative article links are resolved
/// against it.
pub const GOOGLE_NEWS_BASE_URL: &str = "https://news.google.com";

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Percent-escape the characters Google News search treats specially.
///
/// The query is lowercased first; only `&`, `=`, `+`, and space are
/// escaped, everything else passes through unchanged.
pub fn encode_special_characters(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        match ch {
            '&' => encoded.push_str("%26"),
            '=' => encoded.push_str("%3D"),
            '+' => encoded.push_str("%2B"),
            ' ' => encoded.push_str("%20"),
            other => encoded.push(other),
        }
    }
    encoded
}

/// Build the search results URL for a query.
pub fn search_url(query: &str) -> String {
    format!(
        "{}/search?q={}&hl=en-US&gl=US&ceid=US%3Aen",
        GOOGLE_NEWS_BASE_URL,
        encode_special_characters(query)
    )
}

/// Rewrite a listing href into a normalized absolute URL.
///
/// Two rules apply: an `./articles/` path becomes an absolute article URL
/// under the aggregator domain, and any other `./` path is prefixed with
/// the aggregator base URL. Anything else is returned unchanged, which
/// makes re-normalizing an absolute URL a no-op.
pub fn normalize_link(href: &str) -> String {
    if let Some(rest) = href.strip_prefix("./articles/") {
        format!("{GOOGLE_NEWS_BASE_URL}/articles/{rest}")
    } else if let Some(rest) = href.strip_prefix("./") {
        format!("{GOOGLE_NEWS_BASE_URL}/{rest}")
    } else {
        href.to_string()
    }
}

/// Extract up to `limit` normalized article links from a search results page.
///
/// Takes the first `limit` `article` elements in document order. Entries
/// whose first anchor is missing, has no `href`, or normalizes to an
/// unparseable URL are skipped, so the result may hold fewer than `limit`
/// links but never more.
fn extract_article_links(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    for article in document.select(&ARTICLE_SELECTOR).take(limit) {
        let Some(anchor) = article.select(&ANCHOR_SELECTOR).next() else {
            debug!("Article entry has no anchor; skipping");
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            debug!("Article anchor has no href; skipping");
            continue;
        };
        let link = normalize_link(href);
        if Url::parse(&link).is_err() {
            debug!(%href, "Article href is not a valid URL after normalization; skipping");
            continue;
        }
        links.push(link);
    }
    links
}

/// Discovers article links from the Google News search page.
pub struct GoogleNewsDiscoverer {
    client: reqwest::Client,
}

impl GoogleNewsDiscoverer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_listing(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

impl Default for GoogleNewsDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoverLinks for GoogleNewsDiscoverer {
    /// Index the search results page and extract up to `limit` article URLs.
    ///
    /// Network failures degrade to an empty list rather than erroring, so
    /// downstream stages can proceed on whatever was found.
    #[instrument(level = "info", skip(self))]
    async fn discover(&self, query: &str, limit: usize) -> Vec<String> {
        let url = search_url(query);
        let html = match self.fetch_listing(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, %url, "News search fetch failed; continuing with no links");
                return Vec::new();
            }
        };

        let links = extract_article_links(&html, limit);
        info!(count = links.len(), limit, "Indexed article links");
        debug!(?links, "Discovered article URLs");
        links
    }
}

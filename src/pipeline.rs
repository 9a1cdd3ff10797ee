//! Draft generation pipeline.
//!
//! One run turns a free-text query into a batch of drafted blog posts:
//!
//! 1. Discover article links for the query (bounded, ordered).
//! 2. Retrieve each article's content strictly serially, with a fixed
//!    pause between consecutive scrape calls.
//! 3. Synthesize drafts for the retrieved articles concurrently.
//! 4. Aggregate links and drafts positionally into one row per link.
//!
//! Per-article failures are data, not errors: a link whose retrieval or
//! synthesis failed still produces a row, carrying an error-flavored
//! draft. The only hard failure is a missing credential, checked up front
//! before any network activity.

use std::time::{Duration, Instant};

use chrono::Local;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::api::GeminiSynthesizer;
use crate::config::{PipelineConfig, DEFAULT_SCRAPE_DELAY_SECS};
use crate::discovery::GoogleNewsDiscoverer;
use crate::firecrawl::FirecrawlClient;
use crate::gemini::{DraftError, GeminiClient};
use crate::models::{DraftBatch, DraftPost, GeneratedPost, RetrievedContent};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

/// Finds article links for a query.
pub trait DiscoverLinks {
    /// Return up to `limit` article URLs in listing order. Failures
    /// degrade to an empty list.
    async fn discover(&self, query: &str, limit: usize) -> Vec<String>;
}

/// Fetches one article's content.
pub trait RetrievePage {
    /// Retrieve one URL. Failures come back as
    /// [`RetrievedContent::Failed`], never as an error.
    async fn retrieve(&self, url: &str) -> RetrievedContent;
}

/// Drafts one blog post from article content.
pub trait SynthesizeDraft {
    /// Produce a draft for the content. A per-item failure comes back
    /// as an error for the orchestrator to fold into an error-flavored
    /// [`DraftPost`].
    async fn synthesize(&self, content: &str) -> Result<DraftPost, DraftError>;
}

/// The generation pipeline over pluggable stage implementations.
pub struct Pipeline<D, R, S> {
    discoverer: D,
    retriever: R,
    synthesizer: S,
    scrape_delay: Duration,
    max_concurrent_drafts: Option<usize>,
}

impl<D, R, S> Pipeline<D, R, S>
where
    D: DiscoverLinks,
    R: RetrievePage,
    S: SynthesizeDraft,
{
    pub fn new(discoverer: D, retriever: R, synthesizer: S) -> Self {
        Self {
            discoverer,
            retriever,
            synthesizer,
            scrape_delay: Duration::from_secs(DEFAULT_SCRAPE_DELAY_SECS),
            max_concurrent_drafts: None,
        }
    }

    /// Set the pause inserted between consecutive scrape calls.
    pub fn with_scrape_delay(mut self, delay: Duration) -> Self {
        self.scrape_delay = delay;
        self
    }

    /// Bound how many drafting calls run at once. Unbounded by default.
    pub fn with_max_concurrent_drafts(mut self, limit: usize) -> Self {
        self.max_concurrent_drafts = Some(limit);
        self
    }

    /// Run the full pipeline for one query.
    ///
    /// Always produces exactly one row per discovered link, in discovery
    /// order, whatever happened to the individual articles.
    #[instrument(level = "info", skip_all, fields(query = %query, pages = limit))]
    pub async fn run(&self, query: &str, limit: usize) -> DraftBatch {
        let t0 = Instant::now();

        let links = self.discoverer.discover(query, limit).await;
        if links.is_empty() {
            warn!("No article links discovered; producing an empty batch");
        }

        let contents = self.retrieve_all(&links).await;
        let (drafts, failed) = self.synthesize_all(&contents).await;

        let posts: Vec<GeneratedPost> = links
            .into_iter()
            .zip_eq(drafts)
            .map(|(url, draft)| GeneratedPost {
                url,
                title: draft.title,
                content: draft.content,
            })
            .collect();

        info!(
            posts = posts.len(),
            failed,
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Draft batch complete"
        );

        let now = Local::now();
        DraftBatch {
            query: query.to_string(),
            local_date: now.format("%Y-%m-%d").to_string(),
            local_time: now.format("%H-%M-%S").to_string(),
            posts,
        }
    }

    /// Retrieve every link one at a time, pausing between calls.
    ///
    /// The pause applies between consecutive calls whether the previous
    /// one succeeded or failed; there is no pause before the first call
    /// or after the last.
    async fn retrieve_all(&self, links: &[String]) -> Vec<RetrievedContent> {
        let mut contents = Vec::with_capacity(links.len());
        for (index, url) in links.iter().enumerate() {
            if index > 0 {
                debug!(delay = ?self.scrape_delay, "Pausing before next scrape");
                sleep(self.scrape_delay).await;
            }
            info!(index, %url, "Scraping article");
            let content = self.retriever.retrieve(url).await;
            if let Some(cause) = content.failure_message() {
                warn!(index, %url, cause, "Article retrieval failed; its row will carry the error");
            }
            contents.push(content);
        }
        contents
    }

    /// Draft all retrieved articles concurrently, then restore input order.
    ///
    /// Rows whose retrieval failed never reach the model; they complete
    /// immediately with an error-flavored draft carrying the retrieval
    /// failure message. A drafting error is folded the same way. Returns
    /// the ordered drafts along with how many of them are error rows.
    async fn synthesize_all(&self, contents: &[RetrievedContent]) -> (Vec<DraftPost>, usize) {
        let cap = match self.max_concurrent_drafts {
            Some(limit) => limit.max(1),
            None => contents.len().max(1),
        };
        info!(
            articles = contents.len(),
            max_concurrent = cap,
            "Synthesizing drafts"
        );

        let mut indexed: Vec<(usize, DraftPost, bool)> = stream::iter(contents.iter().enumerate())
            .map(|(index, content)| async move {
                match content {
                    RetrievedContent::Page(page) => {
                        match self.synthesizer.synthesize(&page.markdown).await {
                            Ok(post) => (index, post, false),
                            Err(e) => {
                                error!(index, error = %e, "Draft synthesis failed; its row will carry the error");
                                let post = DraftPost::error(format!("Draft generation failed: {e}"));
                                (index, post, true)
                            }
                        }
                    }
                    RetrievedContent::Failed(msg) => {
                        debug!(index, "Skipping synthesis for failed retrieval");
                        (index, DraftPost::error(msg.clone()), true)
                    }
                }
            })
            .buffer_unordered(cap)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _, _)| *index);
        let failed = indexed.iter().filter(|(_, _, failed)| *failed).count();
        let drafts = indexed.into_iter().map(|(_, post, _)| post).collect();
        (drafts, failed)
    }
}

/// Build the production pipeline from configuration and run it once.
///
/// Credentials are checked before any client is constructed, so a missing
/// key fails fast with zero side effects.
#[instrument(level = "info", skip_all, fields(query = %config.query, pages = config.page_count))]
pub async fn run_generation_pipeline(config: &PipelineConfig) -> Result<DraftBatch, PipelineError> {
    let credentials = config.require_credentials()?;

    let discoverer = GoogleNewsDiscoverer::new();
    let retriever = FirecrawlClient::new(credentials.firecrawl_api_key, config.render_wait_ms);
    let synthesizer = GeminiSynthesizer::new(GeminiClient::new(
        credentials.gemini_api_key,
        &config.model,
    ));

    let mut pipeline = Pipeline::new(discoverer, retriever, synthesizer)
        .with_scrape_delay(Duration::from_secs(config.scrape_delay_secs));
    if let Some(limit) = config.max_concurrent_drafts {
        pipeline = pipeline.with_max_concurrent_drafts(limit);
    }

    Ok(pipeline.run(&config.query, config.page_count).await)
}

//! Draft synthesis with exponential backoff retry logic.
//!
//! This module turns scraped article markdown into structured blog post
//! drafts by calling the Gemini API, with automatic retry logic to handle
//! transient failures gracefully.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`DraftAsync`]: Core trait defining one async drafting call
//! - [`GeminiDraftWrapper`]: Adapts [`GeminiClient`] to the trait
//! - [`RetryDraft`]: Decorator that adds retry logic to any `DraftAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Truncated model output is handled above the retry layer: if the
//! response parses as JSON cut off mid-stream, the synthesizer asks once
//! more before declaring the draft malformed.

use rand::{rng, Rng};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::gemini::{draft_response_schema, DraftError, GeminiClient};
use crate::models::DraftPost;
use crate::pipeline::SynthesizeDraft;
use crate::utils::{looks_truncated, truncate_for_log};

/// System instruction sent with every drafting call.
pub const DRAFTING_SYSTEM_PROMPT: &str = r#"You are an experienced news drafting writer with a sharp sense for current events and trends. Your writing is engaging, insightful, and aimed at a general audience that skews Gen-Z, while keeping professional standards.

You will be given the scraped content of one news article. Draft a blog post from it:
- Extract the substance of the article, ignoring navigation links, ads, and leftover boilerplate.
- Write an engaging, well-structured, informative post in Markdown with a logical flow.
- Work in relevant statistics, quotes, or anecdotes from the article for depth.
- Give the post an attention-grabbing, clear, SEO-friendly headline.

Respond with a JSON object carrying the headline as `title` and the complete post in Markdown as `content`."#;

/// Build the user prompt for one article's scraped markdown.
pub fn build_draft_prompt(content: &str) -> String {
    format!("Generate a draft blog post based on the following content:\n\n{content}")
}

/// Trait for one async drafting call against a language model.
///
/// Implementors send text to a model and receive a response. The
/// abstraction exists so decorators (like retry logic) and test doubles
/// can stand in for the real client.
pub trait DraftAsync {
    /// The type of response returned by the model.
    type Response;

    /// Send text to the model and receive a response.
    async fn draft(&self, text: &str) -> Result<Self::Response, DraftError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`DraftAsync`]
/// implementation.
///
/// This decorator transparently retries transient API failures. It's
/// designed to be resilient against rate limiting, network issues, and
/// temporary server errors.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryDraft<T> {
    /// The underlying drafting client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryDraft<T>
where
    T: DraftAsync,
{
    /// Create a new retry wrapper around an existing [`DraftAsync`]
    /// implementation.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryDraft<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDraft")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> DraftAsync for RetryDraft<T>
where
    T: DraftAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn draft(&self, text: &str) -> Result<Self::Response, DraftError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.draft(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "draft() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "draft() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Adapter that implements [`DraftAsync`] on top of a [`GeminiClient`].
///
/// Every call carries the drafting system prompt and the JSON response
/// schema, so the raw response text should parse as a [`DraftPost`].
pub struct GeminiDraftWrapper<'a> {
    /// The underlying Gemini client.
    pub client: &'a GeminiClient,
}

impl fmt::Debug for GeminiDraftWrapper<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiDraftWrapper")
            .field("model", &self.client.model())
            .finish()
    }
}

impl<'a> DraftAsync for GeminiDraftWrapper<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn draft(&self, text: &str) -> Result<Self::Response, DraftError> {
        let t0 = Instant::now();
        let res = self
            .client
            .generate_structured(DRAFTING_SYSTEM_PROMPT, text, draft_response_schema())
            .await;
        let dt = t0.elapsed();

        match &res {
            Ok(_) => {}
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed"),
        }
        res
    }
}

fn parse_draft(raw: &str) -> Result<DraftPost, serde_json::Error> {
    serde_json::from_str(raw)
}

fn validate_draft(post: DraftPost) -> Result<DraftPost, DraftError> {
    if post.title.trim().is_empty() || post.content.trim().is_empty() {
        return Err(DraftError::Malformed(
            "draft has an empty title or content".to_string(),
        ));
    }
    Ok(post)
}

/// Run one drafting call over `api` and parse the result.
///
/// If the first response parses as JSON cut off mid-stream, asks once
/// more with the same prompt; a re-ask that fails outright keeps the
/// original parse error. Any other parse failure, or a second truncated
/// response, is reported as [`DraftError::Malformed`].
async fn synthesize_with<D>(api: &D, content: &str) -> Result<DraftPost, DraftError>
where
    D: DraftAsync<Response = String>,
{
    let prompt = build_draft_prompt(content);
    let raw = api.draft(&prompt).await?;

    let post = match parse_draft(&raw) {
        Ok(post) => post,
        Err(e) if looks_truncated(&e) => {
            warn!(
                error = %e,
                raw = %truncate_for_log(&raw, 200),
                "Draft output looks truncated; asking once more"
            );
            match api.draft(&prompt).await {
                Ok(second) => {
                    parse_draft(&second).map_err(|e| DraftError::Malformed(e.to_string()))?
                }
                Err(reask_err) => {
                    warn!(error = %reask_err, "Re-ask failed; keeping the original parse error");
                    return Err(DraftError::Malformed(e.to_string()));
                }
            }
        }
        Err(e) => return Err(DraftError::Malformed(e.to_string())),
    };

    validate_draft(post)
}

/// Synthesizes drafts by calling the Gemini API with retries.
pub struct GeminiSynthesizer {
    client: GeminiClient,
}

impl GeminiSynthesizer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

impl SynthesizeDraft for GeminiSynthesizer {
    /// Draft one post from scraped markdown.
    ///
    /// Transport errors retry with backoff; a response that survives the
    /// retries but cannot be parsed and validated is reported as an error
    /// for the pipeline to contain.
    #[instrument(level = "info", skip_all)]
    async fn synthesize(&self, content: &str) -> Result<DraftPost, DraftError> {
        let t0 = Instant::now();
        let wrapper = GeminiDraftWrapper {
            client: &self.client,
        };
        let api = RetryDraft::new(wrapper, 5, StdDuration::from_secs(1));
        let res = synthesize_with(&api, content).await;
        let dt = t0.elapsed();

        match &res {
            Ok(post) => info!(
                elapsed_ms_total = dt.as_millis() as u128,
                title = %post.title,
                "Draft synthesized"
            ),
            Err(e) => {
                error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "Draft failed")
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Test double that replays a scripted sequence of responses.
    #[derive(Debug)]
    struct ScriptedDraft {
        responses: Mutex<VecDeque<Result<String, DraftError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedDraft {
        fn new(responses: Vec<Result<String, DraftError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DraftAsync for ScriptedDraft {
        type Response = String;

        async fn draft(&self, _text: &str) -> Result<String, DraftError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted draft called more times than expected")
        }
    }

    fn network_err() -> Result<String, DraftError> {
        Err(DraftError::Network("connection reset".to_string()))
    }

    fn valid_json() -> Result<String, DraftError> {
        Ok(r#"{"title":"A Title","content":"Some body."}"#.to_string())
    }

    #[test]
    fn test_build_draft_prompt() {
        let prompt = build_draft_prompt("# Headline\n\nBody.");
        assert_eq!(
            prompt,
            "Generate a draft blog post based on the following content:\n\n# Headline\n\nBody."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_transient_failures() {
        let inner = ScriptedDraft::new(vec![network_err(), network_err(), valid_json()]);
        let api = RetryDraft::new(inner, 5, StdDuration::from_secs(1));

        let raw = api.draft("prompt").await.expect("retried to success");
        assert!(raw.contains("A Title"));
        assert_eq!(api.inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_attempts() {
        let inner = ScriptedDraft::new(vec![network_err(), network_err(), network_err()]);
        let api = RetryDraft::new(inner, 2, StdDuration::from_secs(1));

        let err = api.draft("prompt").await.expect_err("expected exhaustion");
        assert!(matches!(err, DraftError::Network(_)));
        assert_eq!(api.inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_synthesize_with_parses_valid_draft() {
        let api = ScriptedDraft::new(vec![valid_json()]);
        let post = synthesize_with(&api, "article markdown").await.unwrap();
        assert_eq!(post.title, "A Title");
        assert_eq!(post.content, "Some body.");
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_synthesize_with_reasks_once_on_truncation() {
        let truncated = Ok(r#"{"title":"A Title","content":"cut off"#.to_string());
        let api = ScriptedDraft::new(vec![truncated, valid_json()]);

        let post = synthesize_with(&api, "article markdown").await.unwrap();
        assert_eq!(post.title, "A Title");
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_with_fails_after_second_truncation() {
        let truncated = || Ok(r#"{"title":"A Title","content":"cut off"#.to_string());
        let api = ScriptedDraft::new(vec![truncated(), truncated()]);

        let err = api_err(synthesize_with(&api, "article markdown").await);
        assert!(matches!(err, DraftError::Malformed(_)));
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_with_keeps_parse_error_when_reask_fails() {
        let truncated = Ok(r#"{"title":"A Title","content":"cut off"#.to_string());
        let api = ScriptedDraft::new(vec![truncated, network_err()]);

        let err = api_err(synthesize_with(&api, "article markdown").await);
        assert!(matches!(err, DraftError::Malformed(_)));
        assert!(err.to_string().contains("EOF"));
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_with_rejects_malformed_without_reask() {
        // A type mismatch is complete JSON, so no second ask happens.
        let wrong_shape = Ok(r#"{"title": 42, "content": "x"}"#.to_string());
        let api = ScriptedDraft::new(vec![wrong_shape]);

        let err = api_err(synthesize_with(&api, "article markdown").await);
        assert!(matches!(err, DraftError::Malformed(_)));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_synthesize_with_rejects_empty_fields() {
        let empty_title = Ok(r#"{"title":"  ","content":"body"}"#.to_string());
        let api = ScriptedDraft::new(vec![empty_title]);

        let err = api_err(synthesize_with(&api, "article markdown").await);
        assert!(matches!(err, DraftError::Malformed(_)));
    }

    fn api_err(res: Result<DraftPost, DraftError>) -> DraftError {
        res.expect_err("expected a draft error")
    }
}

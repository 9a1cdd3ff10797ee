//! Runtime configuration.
//!
//! Settings are merged from three layers in order of precedence: command
//! line flags (with their environment-variable fallbacks), an optional
//! YAML settings file, and built-in defaults. Credentials are validated
//! once up front so a misconfigured run fails before touching the network.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::cli::Cli;
use crate::gemini::DEFAULT_MODEL;
use crate::pipeline::PipelineError;

/// Query used when none is given on the command line or in the file.
pub const DEFAULT_QUERY: &str = "AI in 2025";

/// Number of articles drafted per run by default.
pub const DEFAULT_PAGE_COUNT: usize = 2;

/// Pause between consecutive scrape calls, in seconds.
pub const DEFAULT_SCRAPE_DELAY_SECS: u64 = 30;

/// How long the scraper waits for client-side rendering, in milliseconds.
pub const DEFAULT_RENDER_WAIT_MS: u64 = 20000;

/// Fully resolved settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub query: String,
    pub page_count: usize,
    pub model: String,
    pub firecrawl_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub scrape_delay_secs: u64,
    pub render_wait_ms: u64,
    pub max_concurrent_drafts: Option<usize>,
    pub json_dir: Option<PathBuf>,
    pub markdown_dir: Option<PathBuf>,
}

/// Both API keys, borrowed from a validated [`PipelineConfig`].
pub struct Credentials<'a> {
    pub firecrawl_api_key: &'a str,
    pub gemini_api_key: &'a str,
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("firecrawl_api_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}

impl PipelineConfig {
    /// Check both credentials are present and non-empty.
    ///
    /// The scraping key is checked before the model key, so a run missing
    /// both reports the scraping key first.
    pub fn require_credentials(&self) -> Result<Credentials<'_>, PipelineError> {
        let firecrawl_api_key = self
            .firecrawl_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(PipelineError::MissingCredential("FIRECRAWL_API_KEY"))?;
        let gemini_api_key = self
            .gemini_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(PipelineError::MissingCredential("GEMINI_API_KEY"))?;
        Ok(Credentials {
            firecrawl_api_key,
            gemini_api_key,
        })
    }

    /// Merge CLI arguments over file settings over defaults.
    pub fn resolve(cli: &Cli, file: FileSettings) -> Result<Self, Box<dyn Error>> {
        let page_count = cli
            .pages
            .map(usize::from)
            .or(file.pages)
            .unwrap_or(DEFAULT_PAGE_COUNT);
        if !(1..=10).contains(&page_count) {
            return Err(format!("pages must be between 1 and 10, got {page_count}").into());
        }

        Ok(Self {
            query: cli
                .query
                .clone()
                .or(file.query)
                .unwrap_or_else(|| DEFAULT_QUERY.to_string()),
            page_count,
            model: cli
                .model
                .clone()
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            firecrawl_api_key: cli.firecrawl_api_key.clone().or(file.firecrawl_api_key),
            gemini_api_key: cli.gemini_api_key.clone().or(file.gemini_api_key),
            scrape_delay_secs: cli
                .scrape_delay_secs
                .or(file.scrape_delay_secs)
                .unwrap_or(DEFAULT_SCRAPE_DELAY_SECS),
            render_wait_ms: cli
                .render_wait_ms
                .or(file.render_wait_ms)
                .unwrap_or(DEFAULT_RENDER_WAIT_MS),
            max_concurrent_drafts: cli.max_concurrent_drafts.or(file.max_concurrent_drafts),
            json_dir: cli.json_output_dir.clone().or(file.json_dir),
            markdown_dir: cli.markdown_output_dir.clone().or(file.markdown_dir),
        })
    }
}

/// Optional YAML settings file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    pub query: Option<String>,
    pub pages: Option<usize>,
    pub model: Option<String>,
    pub firecrawl_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub scrape_delay_secs: Option<u64>,
    pub render_wait_ms: Option<u64>,
    pub max_concurrent_drafts: Option<usize>,
    pub json_dir: Option<PathBuf>,
    pub markdown_dir: Option<PathBuf>,
}

impl FileSettings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let settings = serde_yaml::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> Cli {
        Cli {
            query: None,
            pages: None,
            model: None,
            firecrawl_api_key: None,
            gemini_api_key: None,
            scrape_delay_secs: None,
            render_wait_ms: None,
            max_concurrent_drafts: None,
            json_output_dir: None,
            markdown_output_dir: None,
            config: None,
        }
    }

    #[test]
    fn test_defaults_when_nothing_provided() {
        let config = PipelineConfig::resolve(&empty_cli(), FileSettings::default())
            .expect("resolve with defaults");
        assert_eq!(config.query, "AI in 2025");
        assert_eq!(config.page_count, 2);
        assert_eq!(config.model, "gemini-2.0-flash-exp");
        assert_eq!(config.scrape_delay_secs, 30);
        assert_eq!(config.render_wait_ms, 20000);
        assert!(config.max_concurrent_drafts.is_none());
        assert!(config.json_dir.is_none());
    }

    #[test]
    fn test_cli_overrides_file_which_overrides_defaults() {
        let mut cli = empty_cli();
        cli.query = Some("rust web frameworks".to_string());

        let file = FileSettings {
            query: Some("ignored".to_string()),
            pages: Some(4),
            scrape_delay_secs: Some(5),
            ..FileSettings::default()
        };

        let config = PipelineConfig::resolve(&cli, file).expect("resolve merged");
        assert_eq!(config.query, "rust web frameworks");
        assert_eq!(config.page_count, 4);
        assert_eq!(config.scrape_delay_secs, 5);
        assert_eq!(config.render_wait_ms, 20000);
    }

    #[test]
    fn test_file_can_supply_credentials() {
        let file = FileSettings {
            firecrawl_api_key: Some("fc-123".to_string()),
            gemini_api_key: Some("gm-456".to_string()),
            ..FileSettings::default()
        };

        let config = PipelineConfig::resolve(&empty_cli(), file).expect("resolve with keys");
        let credentials = config.require_credentials().expect("both keys present");
        assert_eq!(credentials.firecrawl_api_key, "fc-123");
        assert_eq!(credentials.gemini_api_key, "gm-456");
    }

    #[test]
    fn test_page_count_out_of_range_is_rejected() {
        let too_many = FileSettings {
            pages: Some(11),
            ..FileSettings::default()
        };
        assert!(PipelineConfig::resolve(&empty_cli(), too_many).is_err());

        let zero = FileSettings {
            pages: Some(0),
            ..FileSettings::default()
        };
        assert!(PipelineConfig::resolve(&empty_cli(), zero).is_err());
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let file = FileSettings {
            firecrawl_api_key: Some("   ".to_string()),
            gemini_api_key: Some("gm-456".to_string()),
            ..FileSettings::default()
        };
        let config = PipelineConfig::resolve(&empty_cli(), file).expect("resolve");

        let err = config.require_credentials().expect_err("blank key rejected");
        assert_eq!(
            err.to_string(),
            "missing credential: FIRECRAWL_API_KEY is not set"
        );
    }

    #[test]
    fn test_credentials_debug_never_prints_key_material() {
        let file = FileSettings {
            firecrawl_api_key: Some("fc-secret-123".to_string()),
            gemini_api_key: Some("gm-secret-456".to_string()),
            ..FileSettings::default()
        };
        let config = PipelineConfig::resolve(&empty_cli(), file).expect("resolve");
        let credentials = config.require_credentials().expect("both keys present");

        let printed = format!("{credentials:?}");
        assert!(!printed.contains("fc-secret-123"));
        assert!(!printed.contains("gm-secret-456"));
    }

    #[test]
    fn test_parse_settings_file_yaml() {
        let yaml = r#"
query: self-hosted ci
pages: 3
model: gemini-2.0-flash-exp
firecrawl_api_key: fc-abc
scrape_delay_secs: 10
markdown_dir: ./out/markdown
"#;
        let settings: FileSettings = serde_yaml::from_str(yaml).expect("parse settings yaml");
        assert_eq!(settings.query.as_deref(), Some("self-hosted ci"));
        assert_eq!(settings.pages, Some(3));
        assert_eq!(settings.firecrawl_api_key.as_deref(), Some("fc-abc"));
        assert_eq!(settings.scrape_delay_secs, Some(10));
        assert_eq!(
            settings.markdown_dir,
            Some(PathBuf::from("./out/markdown"))
        );
        assert!(settings.gemini_api_key.is_none());
    }
}

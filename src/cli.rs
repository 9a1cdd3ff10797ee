//! Command-line interface definitions for the draft generator.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! API keys can be provided via command-line flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the draft generator.
///
/// Every option is optional on the command line; anything omitted falls
/// back to the settings file (if one is given) and then to built-in
/// defaults.
///
/// # Examples
///
/// ```sh
/// # Draft two posts for the default query
/// news_draft_gen
///
/// # Five posts on a chosen topic, writing JSON and Markdown files
/// news_draft_gen "rust async runtimes" --pages 5 -j ./json -m ./markdown
///
/// # Keys from the environment
/// FIRECRAWL_API_KEY=fc-... GEMINI_API_KEY=gm-... news_draft_gen "local llms"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Topic to search for and draft posts about
    pub query: Option<String>,

    /// How many articles to draft (1-10)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub pages: Option<u8>,

    /// Gemini model used for drafting
    #[arg(long)]
    pub model: Option<String>,

    /// Firecrawl API key for article scraping
    #[arg(long, env = "FIRECRAWL_API_KEY", hide_env_values = true)]
    pub firecrawl_api_key: Option<String>,

    /// Gemini API key for draft generation
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Seconds to pause between consecutive scrape calls
    #[arg(long)]
    pub scrape_delay_secs: Option<u64>,

    /// Milliseconds the scraper waits for client-side rendering
    #[arg(long)]
    pub render_wait_ms: Option<u64>,

    /// Bound on how many drafting calls run at once (unbounded if unset)
    #[arg(long)]
    pub max_concurrent_drafts: Option<usize>,

    /// Output directory for the JSON batch file
    #[arg(short, long)]
    pub json_output_dir: Option<PathBuf>,

    /// Output directory for the Markdown file
    #[arg(short, long)]
    pub markdown_output_dir: Option<PathBuf>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

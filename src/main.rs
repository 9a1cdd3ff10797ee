//! # News Draft Generator
//!
//! A drafting pipeline that turns a free-text topic into AI-drafted blog
//! posts: it searches Google News for the topic, scrapes the matching
//! articles, and asks a Gemini model to draft one post per article.
//!
//! ## Features
//!
//! - Discovers article links from the Google News search page
//! - Scrapes article content via the Firecrawl API (strictly one at a
//!   time, with a fixed pause between calls)
//! - Drafts posts through the Gemini API in parallel
//! - Prints the finished batch as Markdown, with optional JSON and
//!   Markdown file outputs
//!
//! ## Usage
//!
//! ```sh
//! news_draft_gen "rust async runtimes" --pages 5 -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Discovery**: Find article URLs for the query (bounded, ordered)
//! 2. **Retrieval**: Scrape each article serially with a fixed pause
//! 3. **Synthesis**: Send articles to the model for drafting (parallel)
//! 4. **Aggregation**: Pair links with drafts, one row per link, and render

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod discovery;
mod firecrawl;
mod gemini;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use config::{FileSettings, PipelineConfig};
use outputs::{json, markdown};
use pipeline::run_generation_pipeline;
use utils::{ensure_writable_dir, slugify_title};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_draft_gen starting up");

    // Parse CLI and resolve configuration
    let args = Cli::parse();
    debug!(query = ?args.query, pages = ?args.pages, config = ?args.config, "Parsed CLI arguments");

    let file_settings = match &args.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let config = PipelineConfig::resolve(&args, file_settings)?;
    info!(
        query = %config.query,
        pages = config.page_count,
        model = %config.model,
        "Configuration resolved"
    );

    // Early check: requested output directories must be writable
    for dir in [config.json_dir.as_deref(), config.markdown_dir.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Run the pipeline ----
    let batch = run_generation_pipeline(&config).await?;

    // ---- Render to stdout ----
    let md = markdown::batch_to_markdown(&batch);
    println!("{md}");

    // ---- Optional file outputs ----
    if let Some(ref json_dir) = config.json_dir {
        if let Err(e) = json::write_batch(&batch, json_dir).await {
            error!(error = %e, "Failed to write JSON output");
        }
    }

    if let Some(ref markdown_dir) = config.markdown_dir {
        let output_markdown_filename = markdown_dir.join(format!(
            "{}_{}.md",
            batch.local_date,
            slugify_title(&batch.query)
        ));
        info!(path = %output_markdown_filename.display(), "Writing Markdown");
        if let Err(e) = tokio::fs::write(&output_markdown_filename, &md).await {
            error!(path = %output_markdown_filename.display(), error = %e, "Failed writing Markdown");
        } else {
            info!(path = %output_markdown_filename.display(), "Wrote draft batch Markdown");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

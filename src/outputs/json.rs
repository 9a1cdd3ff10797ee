//! JSON output generation.
//!
//! This module serializes a finished draft batch to JSON for consumption
//! by external clients.
//!
//! # Output Structure
//!
//! Files are organized by date, named after the slugged query:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── ai-in-2025.json
//! ```
//! Running the same query again on the same day overwrites the file.

use std::error::Error;
use std::path::Path;

use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::DraftBatch;
use crate::utils::slugify_title;

/// Write a [`DraftBatch`] to a JSON file with date-based directory structure.
///
/// Creates the necessary directory structure and writes the serialized
/// batch as JSON to `{json_output_dir}/{date}/{query-slug}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_batch(batch: &DraftBatch, json_output_dir: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(batch)?;

    let full_json_dir = json_output_dir.join(&batch.local_date);
    info!(dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = full_json_dir.join(format!("{}.json", slugify_title(&batch.query)));
    info!(path = %output_json_filename.display(), "Writing JSON");
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename.display(), "Wrote JSON batch file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeneratedPost;

    #[tokio::test]
    async fn test_write_batch_creates_dated_file() {
        let batch = DraftBatch {
            query: "AI in 2025".to_string(),
            local_date: "2025-05-06".to_string(),
            local_time: "09-15-00".to_string(),
            posts: vec![GeneratedPost {
                url: "https://news.google.com/articles/abc".to_string(),
                title: "A Draft".to_string(),
                content: "Body.".to_string(),
            }],
        };

        let base = std::env::temp_dir().join(format!("draft_json_test_{}", std::process::id()));
        write_batch(&batch, &base).await.expect("write batch");

        let written = base.join("2025-05-06").join("ai-in-2025.json");
        let raw = fs::read_to_string(&written).await.expect("read back");
        let parsed: DraftBatch = serde_json::from_str(&raw).expect("parse written batch");
        assert_eq!(parsed.query, "AI in 2025");
        assert_eq!(parsed.posts.len(), 1);
        assert_eq!(parsed.posts[0].title, "A Draft");

        fs::remove_dir_all(&base).await.expect("cleanup");
    }
}

//! Markdown rendering for a draft batch.
//!
//! Turns a [`DraftBatch`] into one readable Markdown document: a header
//! naming the query and generation time, then one numbered section per
//! post with its content and a link back to the source article. Failed
//! rows render the same way, with `Error` as the title and the failure
//! detail as the body.

use std::fmt::Write;

use crate::models::DraftBatch;
use crate::utils::normalize_model_newlines;

/// Render a [`DraftBatch`] as a Markdown document.
pub fn batch_to_markdown(batch: &DraftBatch) -> String {
    let mut md = String::new();

    writeln!(md, "# Draft blog posts: {}\n", batch.query).unwrap();
    writeln!(
        md,
        "_Generated on {} at {}_\n",
        batch.local_date, batch.local_time
    )
    .unwrap();

    if batch.posts.is_empty() {
        writeln!(md, "No articles were discovered for this query.").unwrap();
        return md;
    }

    for (i, post) in batch.posts.iter().enumerate() {
        writeln!(md, "## Post #{}: {}\n", i + 1, post.title).unwrap();

        if let Some(tag) = post.source_tag() {
            writeln!(md, "<small>`{}`</small>\n", tag).unwrap();
        }

        writeln!(md, "{}\n", normalize_model_newlines(&post.content)).unwrap();
        writeln!(md, "[**View Source**]({})\n", post.url).unwrap();
        writeln!(md, "---\n").unwrap();
    }

    md
}

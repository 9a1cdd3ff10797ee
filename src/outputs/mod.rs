//! Output generation modules for JSON and Markdown files.
//!
//! This module contains submodules responsible for writing a finished
//! draft batch to the optional output formats:
//!
//! # Submodules
//!
//! - [`json`]: Writes `DraftBatch` data to JSON files for API consumption
//! - [`markdown`]: Converts a `DraftBatch` to a Markdown document
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── ai-in-2025.json
//!
//! markdown_output_dir/
//! └── 2025-05-06_ai-in-2025.md
//! ```

pub mod json;
pub mod markdown;

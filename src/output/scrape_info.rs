//! Last-run information file
//!
//! A one-line, human-readable file read by external monitoring and by the
//! archive front-end. It is overwritten after every completed run.

use chrono::NaiveDateTime;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats the last-run line
pub fn format_scrape_info(finished_at: NaiveDateTime, total_posts: u64) -> String {
    format!(
        "Last updated on: {}. Total posts in database: {}.\n",
        finished_at.format(TIMESTAMP_FORMAT),
        total_posts
    )
}

/// Writes the last-run file, replacing any previous content
pub fn write_scrape_info(
    path: &Path,
    finished_at: NaiveDateTime,
    total_posts: u64,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, format_scrape_info(finished_at, total_posts))
}

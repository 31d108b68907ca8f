//! Statistics generation from the archive database
//!
//! This module provides functionality for extracting and displaying
//! archive statistics from the storage layer.

use crate::storage::{RunRecord, SourceRunRecord, Storage};
use crate::HarvestError;

/// Number of categories listed in the statistics output
const TOP_CATEGORIES: usize = 10;

/// Archive statistics summary
#[derive(Debug, Clone)]
pub struct ArchiveStatistics {
    /// Total number of stored posts
    pub total_posts: u64,

    /// Posts seen in a featured source at least once
    pub featured_posts: u64,

    /// Posts whose listing date could not be parsed
    pub undated_posts: u64,

    /// Earliest and latest stored dates
    pub date_range: Option<(String, String)>,

    /// Most common categories with their post counts
    pub top_categories: Vec<(String, u64)>,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Per-source results of the most recent run
    pub latest_sources: Vec<SourceRunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<ArchiveStatistics, HarvestError> {
    let latest_run = storage.get_latest_run()?;
    let latest_sources = match &latest_run {
        Some(run) => storage.get_source_runs(run.id)?,
        None => Vec::new(),
    };

    Ok(ArchiveStatistics {
        total_posts: storage.count_posts()?,
        featured_posts: storage.count_featured_posts()?,
        undated_posts: storage.count_undated_posts()?,
        date_range: storage.get_date_range()?,
        top_categories: storage.get_category_counts(TOP_CATEGORIES)?,
        latest_run,
        latest_sources,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("Overview:");
    println!("  Total posts: {}", stats.total_posts);
    println!(
        "  Featured posts: {} ({:.1}%)",
        stats.featured_posts,
        percentage(stats.featured_posts, stats.total_posts)
    );
    println!("  Posts without a date: {}", stats.undated_posts);
    if let Some((earliest, latest)) = &stats.date_range {
        println!("  Date range: {} to {}", earliest, latest);
    }
    println!();

    if !stats.top_categories.is_empty() {
        println!("Top Categories:");
        for (category, count) in &stats.top_categories {
            println!(
                "  {}: {} ({:.1}%)",
                category,
                count,
                percentage(*count, stats.total_posts)
            );
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Run ID: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            for source in &stats.latest_sources {
                println!(
                    "  - {}{}: {} pages, {} inserted, {} merged, {} failed pages, stopped: {}",
                    source.source,
                    if source.featured { " (featured)" } else { "" },
                    source.pages_fetched,
                    source.inserted,
                    source.merged,
                    source.failed_pages,
                    source
                        .stop_reason
                        .map(|r| r.description())
                        .unwrap_or("not recorded")
                );
            }
        }
        None => println!("No harvest runs recorded yet."),
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

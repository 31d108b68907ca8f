//! End-of-run report

use crate::storage::SourceRunRecord;
use chrono::NaiveDateTime;

/// Summary of one completed harvest run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub run_id: i64,
    /// One record per source, in harvest order
    pub sources: Vec<SourceRunRecord>,
    /// Archive size after the run
    pub total_posts: u64,
    /// Local wall-clock time the run finished
    pub finished_at: NaiveDateTime,
}

impl HarvestReport {
    pub fn total_inserted(&self) -> u32 {
        self.sources.iter().map(|s| s.inserted).sum()
    }

    pub fn total_merged(&self) -> u32 {
        self.sources.iter().map(|s| s.merged).sum()
    }

    pub fn total_failed_pages(&self) -> u32 {
        self.sources.iter().map(|s| s.failed_pages).sum()
    }

    /// Logs the per-source breakdown and the totals
    pub fn log(&self) {
        for source in &self.sources {
            tracing::info!(
                "Source '{}': {} pages ({} failed), {} inserted, {} merged, {} duplicates, stopped: {}",
                source.source,
                source.pages_fetched,
                source.failed_pages,
                source.inserted,
                source.merged,
                source.skipped,
                source
                    .stop_reason
                    .map(|r| r.description())
                    .unwrap_or("not stopped")
            );
        }

        tracing::info!(
            "Run {} finished: {} new posts, {} featured updates, {} failed pages, {} posts in database",
            self.run_id,
            self.total_inserted(),
            self.total_merged(),
            self.total_failed_pages(),
            self.total_posts
        );
    }
}

//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::{Post, PostRecord};
use crate::state::NoveltyOutcome;
use crate::storage::{RunRecord, SourceRunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Posts are keyed by link. Apart from the featured flag, a stored post is
/// never modified, and the featured flag can only go from false to true.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new harvest run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed and records the archive size at that point
    fn complete_run(&mut self, run_id: i64, total_posts: u64) -> StorageResult<()>;

    /// Marks a run as failed
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Records how one source went during a run
    fn record_source_run(&mut self, run_id: i64, record: &SourceRunRecord) -> StorageResult<()>;

    /// Gets the per-source records of a run, in the order they were recorded
    fn get_source_runs(&self, run_id: i64) -> StorageResult<Vec<SourceRunRecord>>;

    // ===== Posts =====

    /// Looks up a post's featured flag by link
    ///
    /// Returns `None` if no post with this link is stored.
    fn find_featured(&self, link: &str) -> StorageResult<Option<bool>>;

    /// Inserts a full post row
    ///
    /// Fails with `StorageError::ConstraintViolation` if the link is already stored.
    fn insert_post(&mut self, post: &Post, featured: bool) -> StorageResult<()>;

    /// Raises the featured flag of a stored post
    fn mark_featured(&mut self, link: &str) -> StorageResult<()>;

    /// Merges one observed post into the archive
    ///
    /// * unseen link: the full row is inserted with `featured` -> `Inserted`
    /// * stored, `featured` is true and the stored flag is false: only the
    ///   flag is raised -> `Merged`
    /// * otherwise nothing is written -> `Skipped`
    fn upsert_post(&mut self, post: &Post, featured: bool) -> StorageResult<NoveltyOutcome>;

    /// Gets a stored post by link
    fn get_post(&self, link: &str) -> StorageResult<Option<PostRecord>>;

    // ===== Statistics =====

    /// Gets total post count
    fn count_posts(&self) -> StorageResult<u64>;

    /// Counts posts flagged as featured
    fn count_featured_posts(&self) -> StorageResult<u64>;

    /// Counts posts whose date could not be parsed
    fn count_undated_posts(&self) -> StorageResult<u64>;

    /// Gets the earliest and latest stored dates
    fn get_date_range(&self) -> StorageResult<Option<(String, String)>>;

    /// Gets the most common categories with their post counts
    fn get_category_counts(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;
}

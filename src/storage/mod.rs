//! Storage module for persisting harvested posts
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Deduplicating post writes and merging the featured flag
//! - Run and per-source bookkeeping
//! - Statistics queries

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::StopReason;
use crate::HarvestError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    /// Archive size when the run completed
    pub total_posts: Option<u64>,
}

/// Outcome of one source within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRunRecord {
    pub source: String,
    pub featured: bool,
    /// Pages processed, including abandoned ones
    pub pages_fetched: u32,
    pub failed_pages: u32,
    pub inserted: u32,
    pub merged: u32,
    pub skipped: u32,
    pub stop_reason: Option<StopReason>,
}

impl SourceRunRecord {
    /// Creates an empty record for a source about to be harvested
    pub fn new(source: &str, featured: bool) -> Self {
        Self {
            source: source.to_string(),
            featured,
            pages_fetched: 0,
            failed_pages: 0,
            inserted: 0,
            merged: 0,
            skipped: 0,
            stop_reason: None,
        }
    }
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::record::{Post, PostRecord};
use crate::state::{NoveltyOutcome, StopReason};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, SourceRunRecord};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Missing parent directories of `path` are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
        total_posts: row.get::<_, Option<i64>>(5)?.map(|n| n as u64),
    })
}

// Rows seeded from a spreadsheet export may carry NULL text columns.
fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        title: row.get(0)?,
        link: row.get(1)?,
        authors: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        date: row.get(3)?,
        summary: row.get(4)?,
        thumbnail: row.get(5)?,
        time_to_read: row.get(6)?,
        category_name: row.get(7)?,
        featured: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, total_posts
                 FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, total_posts
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, total_posts: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, total_posts = ?3 WHERE id = ?4",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                total_posts as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Failed.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    fn record_source_run(&mut self, run_id: i64, record: &SourceRunRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO source_runs (run_id, source, featured, pages_fetched, failed_pages,
             inserted, merged, skipped, stop_reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(run_id, source) DO UPDATE SET
                featured = excluded.featured,
                pages_fetched = excluded.pages_fetched,
                failed_pages = excluded.failed_pages,
                inserted = excluded.inserted,
                merged = excluded.merged,
                skipped = excluded.skipped,
                stop_reason = excluded.stop_reason",
            params![
                run_id,
                record.source,
                record.featured,
                record.pages_fetched,
                record.failed_pages,
                record.inserted,
                record.merged,
                record.skipped,
                record.stop_reason.map(|r| r.to_db_string()),
            ],
        )?;
        Ok(())
    }

    fn get_source_runs(&self, run_id: i64) -> StorageResult<Vec<SourceRunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, featured, pages_fetched, failed_pages, inserted, merged, skipped,
             stop_reason FROM source_runs WHERE run_id = ?1 ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                Ok(SourceRunRecord {
                    source: row.get(0)?,
                    featured: row.get(1)?,
                    pages_fetched: row.get(2)?,
                    failed_pages: row.get(3)?,
                    inserted: row.get(4)?,
                    merged: row.get(5)?,
                    skipped: row.get(6)?,
                    stop_reason: row
                        .get::<_, Option<String>>(7)?
                        .and_then(|s| StopReason::from_db_string(&s)),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Posts =====

    fn find_featured(&self, link: &str) -> StorageResult<Option<bool>> {
        let featured = self
            .conn
            .query_row(
                "SELECT Featured FROM posts WHERE Link = ?1",
                params![link],
                |row| row.get::<_, Option<bool>>(0),
            )
            .optional()?;
        Ok(featured.map(|f| f.unwrap_or(false)))
    }

    fn insert_post(&mut self, post: &Post, featured: bool) -> StorageResult<()> {
        let result = self.conn.execute(
            "INSERT INTO posts (Title, Link, Authors, Date, Summary, Thumbnail, TimeToRead,
             CategoryName, Featured)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                post.title,
                post.link,
                post.authors,
                post.date_string(),
                post.summary,
                post.thumbnail,
                post.time_to_read,
                post.category_name,
                featured,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::ConstraintViolation(format!(
                    "post already stored: {}",
                    post.link
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn mark_featured(&mut self, link: &str) -> StorageResult<()> {
        // No code path ever writes Featured = 0 on an existing row.
        self.conn.execute(
            "UPDATE posts SET Featured = 1 WHERE Link = ?1 AND (Featured IS NULL OR Featured = 0)",
            params![link],
        )?;
        Ok(())
    }

    fn upsert_post(&mut self, post: &Post, featured: bool) -> StorageResult<NoveltyOutcome> {
        match self.find_featured(&post.link)? {
            None => {
                self.insert_post(post, featured)?;
                Ok(NoveltyOutcome::Inserted)
            }
            Some(false) if featured => {
                self.mark_featured(&post.link)?;
                Ok(NoveltyOutcome::Merged)
            }
            Some(_) => Ok(NoveltyOutcome::Skipped),
        }
    }

    fn get_post(&self, link: &str) -> StorageResult<Option<PostRecord>> {
        let post = self
            .conn
            .query_row(
                "SELECT Title, Link, Authors, Date, Summary, Thumbnail, TimeToRead, CategoryName,
                 Featured FROM posts WHERE Link = ?1",
                params![link],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    // ===== Statistics =====

    fn count_posts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_featured_posts(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM posts WHERE Featured = 1", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }

    fn count_undated_posts(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM posts WHERE Date IS NULL", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }

    fn get_date_range(&self) -> StorageResult<Option<(String, String)>> {
        let (earliest, latest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(Date), MAX(Date) FROM posts WHERE Date IS NOT NULL",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(earliest.zip(latest))
    }

    fn get_category_counts(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT CategoryName, COUNT(*) AS n FROM posts WHERE CategoryName IS NOT NULL
             GROUP BY CategoryName ORDER BY n DESC, CategoryName LIMIT ?1",
        )?;

        let counts = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}

//! Database schema definitions
//!
//! The `posts` table keeps the column names used by the archive front-end and
//! by tables converted from the spreadsheet export, so either can seed the
//! other.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Archived posts, one row per link
CREATE TABLE IF NOT EXISTS posts (
    Title TEXT,
    Link TEXT PRIMARY KEY,
    Authors TEXT,
    Date TEXT,
    Summary TEXT,
    Thumbnail TEXT,
    TimeToRead TEXT,
    CategoryName TEXT,
    Featured BOOLEAN
);

CREATE INDEX IF NOT EXISTS idx_date ON posts(Date);
CREATE INDEX IF NOT EXISTS idx_title ON posts(Title);
CREATE INDEX IF NOT EXISTS idx_authors ON posts(Authors);

-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    total_posts INTEGER
);

-- Per-source results of each run
CREATE TABLE IF NOT EXISTS source_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    source TEXT NOT NULL,
    featured INTEGER NOT NULL,
    pages_fetched INTEGER NOT NULL,
    failed_pages INTEGER NOT NULL,
    inserted INTEGER NOT NULL,
    merged INTEGER NOT NULL,
    skipped INTEGER NOT NULL,
    stop_reason TEXT,
    UNIQUE(run_id, source)
);

CREATE INDEX IF NOT EXISTS idx_source_runs_run ON source_runs(run_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

//! SQLite timestamp store
//!
//! A WAL-mode SQLite file shared by every process that serves the farm.

use super::{CacheKey, TimestampStore};
use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Shared invalidation timestamp cache backed by SQLite
pub struct SqliteTimestampStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteTimestampStore {
    /// Open or create the store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Opening timestamp store");

        let conn = Connection::open(&path)?;

        // Other processes write concurrently
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let store = Self { conn, path };
        store.init_schema()?;

        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS timestamps (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TimestampStore for SqliteTimestampStore {
    fn get(&self, key: &CacheKey) -> Result<Option<i64>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM timestamps WHERE key = ?",
                [key.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &CacheKey, timestamp: i64) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        self.conn.execute(
            "INSERT OR REPLACE INTO timestamps (key, value, updated_at) VALUES (?, ?, ?)",
            params![key.to_string(), timestamp, now],
        )?;

        tracing::debug!(key = %key, timestamp, "Invalidation timestamp stored");
        Ok(())
    }
}

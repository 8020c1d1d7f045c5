//! Reading, seeding and resetting invalidation timestamps
//!
//! Resets stamp the entry with the database server's clock so every node of
//! the farm agrees on ordering regardless of local clock drift.

use crate::database::WikiDatabase;
use crate::timestamps::{CacheKey, TimestampStore, DATABASES_ENTRY};
use crate::Result;
use chrono::{Duration, NaiveDateTime};
use std::rc::Rc;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// The `YYYYMMDDHHMMSS` timestamp one second after `timestamp`
///
/// Values that are not calendar timestamps are incremented as integers.
pub fn next_tick(timestamp: i64) -> i64 {
    NaiveDateTime::parse_from_str(&timestamp.to_string(), TIMESTAMP_FORMAT)
        .ok()
        .and_then(|dt| dt.checked_add_signed(Duration::seconds(1)))
        .and_then(|dt| dt.format(TIMESTAMP_FORMAT).to_string().parse().ok())
        .unwrap_or(timestamp + 1)
}

/// Invalidation timestamps of one farm namespace
#[derive(Clone)]
pub struct Invalidator {
    namespace: String,
    db: Rc<dyn WikiDatabase>,
    timestamps: Rc<dyn TimestampStore>,
}

impl Invalidator {
    pub fn new(
        namespace: impl Into<String>,
        db: Rc<dyn WikiDatabase>,
        timestamps: Rc<dyn TimestampStore>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            db,
            timestamps,
        }
    }

    pub fn key(&self, entry: &str) -> CacheKey {
        CacheKey::global(&self.namespace, entry)
    }

    pub fn database(&self) -> &dyn WikiDatabase {
        self.db.as_ref()
    }

    /// Current invalidation timestamp of `entry`
    ///
    /// Unset, zero and unreadable values all come back as `None`.
    pub fn current(&self, entry: &str) -> Option<i64> {
        let key = self.key(entry);
        match self.timestamps.get(&key) {
            Ok(Some(timestamp)) if timestamp != 0 => Some(timestamp),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read invalidation timestamp");
                None
            }
        }
    }

    /// Store `at` as the baseline of an entry that had no timestamp
    ///
    /// A failed write is logged; the caller keeps using `at` locally.
    pub fn seed(&self, entry: &str, at: i64) -> i64 {
        let key = self.key(entry);
        match self.timestamps.set(&key, at) {
            Ok(()) => tracing::debug!(key = %key, timestamp = at, "Seeded invalidation timestamp"),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to seed invalidation timestamp")
            }
        }
        at
    }

    /// Mark `entry` stale as of the database server's current time
    ///
    /// The stored value always moves forward: when the server clock has not
    /// passed the previous timestamp, the reset lands one second after it.
    /// Snapshots are stamped with earlier values, so they all become stale.
    pub fn reset(&self, entry: &str) -> Result<i64> {
        let now = self.db.server_time()?;
        let key = self.key(entry);

        let at = match self.timestamps.get(&key)? {
            Some(previous) if previous >= now => next_tick(previous),
            _ => now,
        };
        self.timestamps.set(&key, at)?;

        tracing::info!(key = %key, timestamp = at, server_time = now, "Invalidation timestamp reset");
        Ok(at)
    }

    pub fn reset_database_list(&self) -> Result<i64> {
        self.reset(DATABASES_ENTRY)
    }

    pub fn reset_wiki(&self, wiki: &str) -> Result<i64> {
        self.reset(wiki)
    }
}

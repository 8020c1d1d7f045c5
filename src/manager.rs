//! Snapshot regeneration for one wiki and the farm list
//!
//! [`WikiJson`] is built per request for the wiki being served. Construction
//! reads the snapshots' generation stamps and the invalidation timestamps,
//! seeding the latter with the database server time when they are missing.
//! [`WikiJson::update`] then rewrites whatever is stale.

use crate::config::WikiJsonConfig;
use crate::database::{SqliteWikiDatabase, WikiDatabase};
use crate::hooks::JsonBuilderHook;
use crate::invalidation::Invalidator;
use crate::snapshot::{
    partition_farm, wiki_file, SnapshotStore, WikiSnapshot, DATABASES_FILE, DELETED_FILE,
};
use crate::staleness::Changes;
use crate::timestamps::{SqliteTimestampStore, TimestampStore, DATABASES_ENTRY};
use crate::{Result, WikiJsonError};
use std::rc::Rc;

/// Check that `wiki` can be used as a snapshot file name and cache key
///
/// Database names are ASCII letters, digits and underscores. The names of
/// the farm list files are reserved.
pub fn validate_wiki_id(wiki: &str) -> Result<()> {
    let valid_chars = !wiki.is_empty()
        && wiki
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    let reserved = wiki == DATABASES_ENTRY || wiki == "deleted";

    if valid_chars && !reserved {
        Ok(())
    } else {
        Err(WikiJsonError::InvalidWikiId(wiki.to_string()))
    }
}

/// Write the farm list files stamped with `timestamp`
///
/// Failures are logged and reported as `false` in the returned [`ListWrite`].
pub fn regenerate_farm_list(
    db: &dyn WikiDatabase,
    snapshots: &SnapshotStore,
    timestamp: i64,
) -> ListWrite {
    let wikis = match db.all_wikis() {
        Ok(wikis) => wikis,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to query farm wiki list");
            return ListWrite::default();
        }
    };

    let (active, deleted) = partition_farm(&wikis, timestamp);
    let mut written = ListWrite::default();

    match snapshots.write(DATABASES_FILE, &active) {
        Ok(()) => written.databases = true,
        Err(e) => tracing::warn!(file = DATABASES_FILE, error = %e, "Skipped snapshot write"),
    }

    match snapshots.write(DELETED_FILE, &deleted) {
        Ok(()) => written.deleted = true,
        Err(e) => tracing::warn!(file = DELETED_FILE, error = %e, "Skipped snapshot write"),
    }

    tracing::info!(
        timestamp,
        active = active.combi.len(),
        deleted = deleted.databases.len(),
        "Regenerated farm list"
    );

    written
}

/// Which farm list files were rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListWrite {
    pub databases: bool,
    pub deleted: bool,
}

/// Outcome of [`WikiJson::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// What the staleness check asked for
    pub changes: Changes,
    pub databases: ListWrite,
    /// `<wiki>.json` was rewritten
    pub wiki: bool,
}

/// Snapshot cache manager for one wiki
pub struct WikiJson {
    wiki: String,
    invalidator: Invalidator,
    snapshots: SnapshotStore,
    hook: Option<Box<dyn JsonBuilderHook>>,
    databases_snapshot: i64,
    deleted_snapshot: i64,
    wiki_snapshot: i64,
    databases_timestamp: Option<i64>,
    wiki_timestamp: Option<i64>,
}

impl WikiJson {
    /// Load the current state for `wiki`, seeding missing invalidation timestamps
    ///
    /// # Errors
    /// `InvalidWikiId` for unusable ids, or the database error if the server
    /// time cannot be read.
    pub fn new(
        wiki: &str,
        namespace: &str,
        db: Rc<dyn WikiDatabase>,
        timestamps: Rc<dyn TimestampStore>,
        snapshots: SnapshotStore,
    ) -> Result<Self> {
        validate_wiki_id(wiki)?;

        let invalidator = Invalidator::new(namespace, db, timestamps);

        let databases_snapshot = snapshots.read_timestamp(DATABASES_FILE);
        let deleted_snapshot = snapshots.read_timestamp(DELETED_FILE);
        let wiki_snapshot = snapshots.read_timestamp(&wiki_file(wiki));

        let mut databases_timestamp = invalidator.current(DATABASES_ENTRY);
        let mut wiki_timestamp = invalidator.current(wiki);

        let init_time = invalidator.database().server_time()?;

        if databases_timestamp.is_none() {
            databases_timestamp = Some(invalidator.seed(DATABASES_ENTRY, init_time));
        }

        if wiki_timestamp.is_none() {
            wiki_timestamp = Some(invalidator.seed(wiki, init_time));
        }

        tracing::debug!(
            wiki = %wiki,
            databases_snapshot,
            deleted_snapshot,
            wiki_snapshot,
            ?databases_timestamp,
            ?wiki_timestamp,
            "Loaded snapshot state"
        );

        Ok(Self {
            wiki: wiki.to_string(),
            invalidator,
            snapshots,
            hook: None,
            databases_snapshot,
            deleted_snapshot,
            wiki_snapshot,
            databases_timestamp,
            wiki_timestamp,
        })
    }

    /// Open the SQLite database, timestamp store and cache directory named by `config`
    pub fn from_config(wiki: &str, config: &WikiJsonConfig) -> Result<Self> {
        let db = SqliteWikiDatabase::open(&config.database)?;
        let timestamps = SqliteTimestampStore::open(&config.timestamp_store)?;
        let snapshots = SnapshotStore::open(&config.cache_directory)?;

        Self::new(
            wiki,
            &config.cache_namespace,
            Rc::new(db),
            Rc::new(timestamps),
            snapshots,
        )
    }

    /// Register the JSON builder hook, replacing any previous one
    pub fn with_hook(mut self, hook: impl JsonBuilderHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn wiki(&self) -> &str {
        &self.wiki
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn databases_timestamp(&self) -> Option<i64> {
        self.databases_timestamp
    }

    pub fn wiki_timestamp(&self) -> Option<i64> {
        self.wiki_timestamp
    }

    /// Generation stamp of the farm list, the older of its two files
    pub fn databases_snapshot_timestamp(&self) -> i64 {
        self.databases_snapshot.min(self.deleted_snapshot)
    }

    pub fn wiki_snapshot_timestamp(&self) -> i64 {
        self.wiki_snapshot
    }

    /// Invalidate this wiki's snapshot
    pub fn reset_wiki(&mut self) -> Result<()> {
        self.wiki_timestamp = Some(self.invalidator.reset_wiki(&self.wiki)?);
        Ok(())
    }

    /// Invalidate the farm list
    pub fn reset_database_list(&mut self) -> Result<()> {
        self.databases_timestamp = Some(self.invalidator.reset_database_list()?);
        Ok(())
    }

    /// Entries whose snapshot is older than their invalidation timestamp
    pub fn changes(&self) -> Changes {
        Changes::detect(
            self.databases_snapshot_timestamp(),
            self.databases_timestamp,
            self.wiki_snapshot,
            self.wiki_timestamp,
        )
    }

    /// Regenerate every stale snapshot
    ///
    /// The farm list and the wiki are handled independently: the farm list
    /// is always attempted, and its failures are only logged.
    ///
    /// # Errors
    /// `WikiNotFound` when the wiki is stale but has no database row, or the
    /// error of a failing database read or builder hook.
    pub fn update(&mut self) -> Result<UpdateReport> {
        let changes = self.changes();
        let mut report = UpdateReport {
            changes,
            ..Default::default()
        };

        if changes.databases {
            report.databases = self.generate_database_list();
        }

        if changes.wiki {
            report.wiki = self.generate_wiki()?;
        }

        Ok(report)
    }

    /// Rewrite `databases.json` and `deleted.json` from the wikis table
    ///
    /// Best effort: a failed query or write leaves the affected files as
    /// they were, and the next update retries.
    pub fn generate_database_list(&mut self) -> ListWrite {
        let timestamp = self.databases_timestamp.unwrap_or_default();
        let written =
            regenerate_farm_list(self.invalidator.database(), &self.snapshots, timestamp);

        if written.databases {
            self.databases_snapshot = timestamp;
        }
        if written.deleted {
            self.deleted_snapshot = timestamp;
        }

        written
    }

    /// Rewrite `<wiki>.json` from its database row
    ///
    /// Returns `false` when the write failed and the previous file was kept.
    /// A wiki generated for the first time is stamped 0, so the following
    /// update regenerates it again with the real invalidation timestamp.
    ///
    /// # Errors
    /// `WikiNotFound` when the wiki has no row; nothing is written then.
    pub fn generate_wiki(&mut self) -> Result<bool> {
        let record = self
            .invalidator
            .database()
            .wiki(&self.wiki)?
            .ok_or_else(|| WikiJsonError::WikiNotFound(self.wiki.clone()))?;

        let file_name = wiki_file(&self.wiki);
        let timestamp = if self.snapshots.exists(&file_name) {
            self.wiki_timestamp.unwrap_or_default()
        } else {
            0
        };

        let mut snapshot = WikiSnapshot::from_record(&record, timestamp);

        if let Some(hook) = &self.hook {
            hook.build(&self.wiki, self.invalidator.database(), &mut snapshot)?;
        }

        match self.snapshots.write(&file_name, &snapshot) {
            Ok(()) => {
                self.wiki_snapshot = timestamp;
                tracing::info!(wiki = %self.wiki, timestamp, "Regenerated wiki snapshot");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Skipped snapshot write");
                Ok(false)
            }
        }
    }
}

//! Snapshot directory I/O
//!
//! Writes go to a uniquely named temporary file in the cache directory,
//! held under an exclusive lock while written and synced, then renamed over
//! the final name. Readers either see the previous snapshot or the new one.

use super::payload::{DatabaseListSnapshot, DeletedListSnapshot, WikiSnapshot};
use crate::Result;
use fs4::fs_std::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Active wiki list
pub const DATABASES_FILE: &str = "databases.json";

/// Deleted wiki list
pub const DELETED_FILE: &str = "deleted.json";

/// File name of a wiki's snapshot
pub fn wiki_file(wiki: &str) -> String {
    format!("{}.json", wiki)
}

/// Only the generation stamp, so any snapshot kind can be checked cheaply
#[derive(Deserialize)]
struct SnapshotHeader {
    #[serde(default)]
    timestamp: i64,
}

/// Directory holding the JSON snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Use `dir` as the snapshot directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.path(file_name).is_file()
    }

    /// Generation stamp of a snapshot, 0 when missing or unreadable
    pub fn read_timestamp(&self, file_name: &str) -> i64 {
        self.read::<SnapshotHeader>(file_name)
            .map(|header| header.timestamp)
            .unwrap_or(0)
    }

    /// Parse a snapshot, `None` when missing or malformed
    pub fn read<T: DeserializeOwned>(&self, file_name: &str) -> Option<T> {
        let path = self.path(file_name);
        let content = fs::read(&path).ok()?;

        match serde_json::from_slice(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Ignoring malformed snapshot");
                None
            }
        }
    }

    pub fn read_database_list(&self) -> Option<DatabaseListSnapshot> {
        self.read(DATABASES_FILE)
    }

    pub fn read_deleted_list(&self) -> Option<DeletedListSnapshot> {
        self.read(DELETED_FILE)
    }

    pub fn read_wiki(&self, wiki: &str) -> Option<WikiSnapshot> {
        self.read(&wiki_file(wiki))
    }

    /// Atomically replace `file_name` with the JSON encoding of `value`
    ///
    /// On error the previous file is left in place and the temporary file
    /// is removed.
    pub fn write<T: Serialize>(&self, file_name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        let target = self.path(file_name);

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;

        temp.as_file().lock_exclusive()?;
        temp.write_all(&json)?;
        temp.as_file().sync_all()?;

        // Snapshots are read by other users than the writer
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644))?;
        }

        temp.persist(&target).map_err(|e| e.error)?;

        tracing::debug!(path = %target.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }
}

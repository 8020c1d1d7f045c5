//! Extension point of wiki snapshot generation
//!
//! A single hook may be registered on [`WikiJson`](crate::WikiJson). It runs
//! once per wiki regeneration, after the core fields are filled in and before
//! the snapshot is serialized, and can add feature-specific fields:
//!
//! ```no_run
//! use serde_json::json;
//! use wikijson::database::WikiDatabase;
//! use wikijson::hooks::JsonBuilderHook;
//! use wikijson::snapshot::WikiSnapshot;
//!
//! struct Extensions;
//!
//! impl JsonBuilderHook for Extensions {
//!     fn build(
//!         &self,
//!         wiki: &str,
//!         _db: &dyn WikiDatabase,
//!         snapshot: &mut WikiSnapshot,
//!     ) -> wikijson::Result<()> {
//!         snapshot.insert_extension("extensions", json!([format!("{}-visualeditor", wiki)]))
//!     }
//! }
//! ```

use crate::database::WikiDatabase;
use crate::snapshot::WikiSnapshot;
use crate::Result;

/// Augments a wiki snapshot before it is written
pub trait JsonBuilderHook {
    /// Add fields to `snapshot`
    ///
    /// Core fields cannot be changed. An error aborts the regeneration and
    /// leaves the previous snapshot on disk.
    fn build(&self, wiki: &str, db: &dyn WikiDatabase, snapshot: &mut WikiSnapshot) -> Result<()>;
}

impl<F> JsonBuilderHook for F
where
    F: Fn(&str, &dyn WikiDatabase, &mut WikiSnapshot) -> Result<()>,
{
    fn build(&self, wiki: &str, db: &dyn WikiDatabase, snapshot: &mut WikiSnapshot) -> Result<()> {
        self(wiki, db, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryWikiDatabase, WikiRecord};

    #[test]
    fn test_closure_hook() {
        let db = MemoryWikiDatabase::new(20240101000000);
        let record = WikiRecord::new("testwiki", "Test Wiki");
        let mut snapshot = WikiSnapshot::from_record(&record, 1);

        let hook = |wiki: &str, db: &dyn WikiDatabase, snapshot: &mut WikiSnapshot| -> Result<()> {
            snapshot.insert_extension("generated_for", wiki)?;
            snapshot.insert_extension("server_time", db.server_time()?)
        };

        hook.build("testwiki", &db, &mut snapshot).unwrap();
        assert_eq!(snapshot.extension("generated_for").unwrap(), "testwiki");
        assert_eq!(snapshot.extension("server_time").unwrap(), 20240101000000_i64);
    }
}

//! Read access to the farm's wikis table
//!
//! Regeneration only ever reads. Rows are decoded into plain records up
//! front; payload building never touches the database row itself.

mod memory;
mod sqlite;

pub use memory::MemoryWikiDatabase;
pub use sqlite::SqliteWikiDatabase;

use crate::Result;
use serde::{Deserialize, Serialize};

/// One row of the wikis table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiRecord {
    pub dbname: String,
    pub dbcluster: String,
    pub sitename: String,
    pub language: String,
    /// Creation time, `YYYYMMDDHHMMSS`
    pub creation: String,
    pub category: String,
    pub url: Option<String>,
    pub private: bool,
    pub closed_timestamp: Option<String>,
    pub inactive_exempt: bool,
    pub inactive_timestamp: Option<String>,
    pub deleted: bool,
}

impl WikiRecord {
    /// A public, open, active wiki with placeholder cluster and creation data
    pub fn new(dbname: impl Into<String>, sitename: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            dbcluster: "c1".to_string(),
            sitename: sitename.into(),
            language: "en".to_string(),
            creation: "20240101000000".to_string(),
            category: "uncategorised".to_string(),
            url: None,
            private: false,
            closed_timestamp: None,
            inactive_exempt: false,
            inactive_timestamp: None,
            deleted: false,
        }
    }

    /// Project onto the columns the farm list needs
    pub fn listing(&self) -> WikiListing {
        WikiListing {
            dbname: self.dbname.clone(),
            dbcluster: self.dbcluster.clone(),
            sitename: self.sitename.clone(),
            url: self.url.clone(),
            deleted: self.deleted,
        }
    }
}

/// The subset of a wiki row used for `databases.json` and `deleted.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiListing {
    pub dbname: String,
    pub dbcluster: String,
    pub sitename: String,
    pub url: Option<String>,
    pub deleted: bool,
}

/// Replica read interface of the wikis database
pub trait WikiDatabase {
    /// Current time on the database server as `YYYYMMDDHHMMSS`
    fn server_time(&self) -> Result<i64>;

    /// Every wiki in the farm, deleted ones included
    fn all_wikis(&self) -> Result<Vec<WikiListing>>;

    /// A single wiki by database name
    fn wiki(&self, dbname: &str) -> Result<Option<WikiRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_projection() {
        let mut record = WikiRecord::new("testwiki", "Test Wiki");
        record.url = Some("test.example.org".to_string());
        record.deleted = true;

        let listing = record.listing();
        assert_eq!(listing.dbname, "testwiki");
        assert_eq!(listing.sitename, "Test Wiki");
        assert_eq!(listing.dbcluster, "c1");
        assert_eq!(listing.url.as_deref(), Some("test.example.org"));
        assert!(listing.deleted);
    }
}

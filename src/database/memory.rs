//! In-memory wikis table with a settable server clock

use super::{WikiDatabase, WikiListing, WikiRecord};
use crate::Result;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Wikis table held in memory
#[derive(Debug)]
pub struct MemoryWikiDatabase {
    wikis: RefCell<BTreeMap<String, WikiRecord>>,
    now: Cell<i64>,
}

impl MemoryWikiDatabase {
    /// Empty table whose clock reads `now`
    pub fn new(now: i64) -> Self {
        Self {
            wikis: RefCell::new(BTreeMap::new()),
            now: Cell::new(now),
        }
    }

    /// Insert or replace a wiki row
    pub fn insert(&self, record: WikiRecord) {
        self.wikis
            .borrow_mut()
            .insert(record.dbname.clone(), record);
    }

    pub fn remove(&self, dbname: &str) -> Option<WikiRecord> {
        self.wikis.borrow_mut().remove(dbname)
    }

    /// Move the server clock
    pub fn set_time(&self, now: i64) {
        self.now.set(now);
    }
}

impl WikiDatabase for MemoryWikiDatabase {
    fn server_time(&self) -> Result<i64> {
        Ok(self.now.get())
    }

    fn all_wikis(&self) -> Result<Vec<WikiListing>> {
        Ok(self.wikis.borrow().values().map(WikiRecord::listing).collect())
    }

    fn wiki(&self, dbname: &str) -> Result<Option<WikiRecord>> {
        Ok(self.wikis.borrow().get(dbname).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let db = MemoryWikiDatabase::new(20240101000000);
        db.insert(WikiRecord::new("testwiki", "Test Wiki"));
        db.insert(WikiRecord::new("otherwiki", "Other Wiki"));

        assert_eq!(db.all_wikis().unwrap().len(), 2);
        assert_eq!(db.wiki("testwiki").unwrap().unwrap().sitename, "Test Wiki");
        assert!(db.wiki("missingwiki").unwrap().is_none());

        db.remove("otherwiki");
        assert_eq!(db.all_wikis().unwrap().len(), 1);
    }

    #[test]
    fn test_clock() {
        let db = MemoryWikiDatabase::new(20240101000000);
        assert_eq!(db.server_time().unwrap(), 20240101000000);

        db.set_time(20240101000100);
        assert_eq!(db.server_time().unwrap(), 20240101000100);
    }
}

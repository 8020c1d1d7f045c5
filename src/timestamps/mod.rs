//! Invalidation timestamp store
//!
//! A farm-wide key-value cache holding one invalidation timestamp per cache
//! entry: the `databases` list, or a single wiki id. Every process serving
//! the farm must see the same store. Writes are plain overwrites, so no
//! compare-and-swap is needed.

mod sqlite;

pub use sqlite::SqliteTimestampStore;

use crate::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Entry key of the farm-wide database list
pub const DATABASES_ENTRY: &str = "databases";

/// Composite key: namespace plus cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    entry: String,
}

impl CacheKey {
    /// Farm-wide key for `entry` under `namespace`
    pub fn global(namespace: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entry: entry.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "global:{}:{}", self.namespace, self.entry)
    }
}

/// Shared storage for invalidation timestamps
pub trait TimestampStore {
    /// Current timestamp for `key`, `None` when it was never set
    fn get(&self, key: &CacheKey) -> Result<Option<i64>>;

    /// Overwrite the timestamp for `key`
    fn set(&self, key: &CacheKey, timestamp: i64) -> Result<()>;
}

/// Process-local store, for tests and single-process embedding
#[derive(Debug, Default)]
pub struct InMemoryTimestampStore {
    entries: RefCell<HashMap<String, i64>>,
}

impl InMemoryTimestampStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the timestamp for `key`, as if the cache had evicted it
    pub fn evict(&self, key: &CacheKey) {
        self.entries.borrow_mut().remove(&key.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl TimestampStore for InMemoryTimestampStore {
    fn get(&self, key: &CacheKey) -> Result<Option<i64>> {
        Ok(self.entries.borrow().get(&key.to_string()).copied())
    }

    fn set(&self, key: &CacheKey, timestamp: i64) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), timestamp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::global("wikijson", "testwiki");
        assert_eq!(key.to_string(), "global:wikijson:testwiki");
        assert_eq!(key.namespace(), "wikijson");
        assert_eq!(key.entry(), "testwiki");
    }

    #[test]
    fn test_in_memory_get_set() {
        let store = InMemoryTimestampStore::new();
        let key = CacheKey::global("wikijson", DATABASES_ENTRY);

        assert_eq!(store.get(&key).unwrap(), None);

        store.set(&key, 20240101000000).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(20240101000000));

        // Plain overwrite, no ordering check
        store.set(&key, 20230101000000).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(20230101000000));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_in_memory_namespaces_are_separate() {
        let store = InMemoryTimestampStore::new();
        store
            .set(&CacheKey::global("farm-a", "testwiki"), 1)
            .unwrap();

        assert_eq!(
            store.get(&CacheKey::global("farm-b", "testwiki")).unwrap(),
            None
        );
    }

    #[test]
    fn test_in_memory_evict() {
        let store = InMemoryTimestampStore::new();
        let key = CacheKey::global("wikijson", "testwiki");
        store.set(&key, 5).unwrap();
        store.evict(&key);
        assert!(store.is_empty());
    }
}

//! Staleness checks
//!
//! A snapshot is stale when the timestamp it was generated for is older than
//! the entry's invalidation timestamp. A missing invalidation timestamp never
//! makes a snapshot stale: construction seeds one, so a missing value means
//! the store could not be read, not that the entry was invalidated.

/// Whether a snapshot generated at `snapshot` must be regenerated
pub fn is_stale(snapshot: i64, invalidated: Option<i64>) -> bool {
    match invalidated {
        Some(invalidated) if invalidated != 0 => snapshot < invalidated,
        _ => false,
    }
}

/// Entries that need regeneration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    /// `databases.json` and `deleted.json`
    pub databases: bool,
    /// `<wiki>.json`
    pub wiki: bool,
}

impl Changes {
    pub fn detect(
        databases_snapshot: i64,
        databases_invalidated: Option<i64>,
        wiki_snapshot: i64,
        wiki_invalidated: Option<i64>,
    ) -> Self {
        Self {
            databases: is_stale(databases_snapshot, databases_invalidated),
            wiki: is_stale(wiki_snapshot, wiki_invalidated),
        }
    }

    pub fn any(&self) -> bool {
        self.databases || self.wiki
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_older_snapshot_is_stale() {
        assert!(is_stale(20240101000000, Some(20240101000001)));
        assert!(is_stale(0, Some(20240101000000)));
    }

    #[test]
    fn test_equal_or_newer_snapshot_is_fresh() {
        assert!(!is_stale(20240101000000, Some(20240101000000)));
        assert!(!is_stale(20240101000005, Some(20240101000000)));
    }

    #[test]
    fn test_missing_invalidation_never_stale() {
        assert!(!is_stale(0, None));
        assert!(!is_stale(0, Some(0)));
        assert!(!is_stale(i64::MIN, None));
    }

    #[test]
    fn test_detect_is_independent_per_entry() {
        let changes = Changes::detect(5, Some(10), 10, Some(10));
        assert_eq!(
            changes,
            Changes {
                databases: true,
                wiki: false
            }
        );
        assert!(changes.any());

        let changes = Changes::detect(10, None, 0, Some(3));
        assert!(!changes.databases);
        assert!(changes.wiki);

        assert!(!Changes::detect(1, Some(1), 1, None).any());
    }
}

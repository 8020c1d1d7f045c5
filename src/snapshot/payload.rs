//! JSON payloads of the snapshot files
//!
//! Key names and the `false` placeholders for unset values are the format
//! the farm's settings loader reads, so they are pinned with serde attributes.

use crate::database::{WikiListing, WikiRecord};
use crate::{Result, WikiJsonError};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level keys owned by the core wiki snapshot
pub const CORE_FIELDS: &[&str] = &[
    "timestamp",
    "database",
    "created",
    "dbcluster",
    "category",
    "url",
    "core",
    "states",
];

/// One wiki in `databases.json` or `deleted.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(rename = "s")]
    pub sitename: String,

    #[serde(rename = "c")]
    pub dbcluster: String,

    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `databases.json`: every wiki that is not deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseListSnapshot {
    pub timestamp: i64,
    pub combi: BTreeMap<String, ListEntry>,
}

/// `deleted.json`: every deleted wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedListSnapshot {
    pub timestamp: i64,
    pub databases: BTreeMap<String, ListEntry>,
}

/// Split the farm into the active and deleted snapshots, both stamped with `timestamp`
pub fn partition_farm(
    wikis: &[WikiListing],
    timestamp: i64,
) -> (DatabaseListSnapshot, DeletedListSnapshot) {
    let mut combi = BTreeMap::new();
    let mut deleted = BTreeMap::new();

    for wiki in wikis {
        if wiki.deleted {
            // Deleted wikis are not served, their url is dropped
            deleted.insert(
                wiki.dbname.clone(),
                ListEntry {
                    sitename: wiki.sitename.clone(),
                    dbcluster: wiki.dbcluster.clone(),
                    url: None,
                },
            );
        } else {
            combi.insert(
                wiki.dbname.clone(),
                ListEntry {
                    sitename: wiki.sitename.clone(),
                    dbcluster: wiki.dbcluster.clone(),
                    url: wiki.url.clone(),
                },
            );
        }
    }

    (
        DatabaseListSnapshot { timestamp, combi },
        DeletedListSnapshot {
            timestamp,
            databases: deleted,
        },
    )
}

/// Settings the farm loads into every request for the wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSettings {
    #[serde(rename = "wgSitename")]
    pub sitename: String,

    #[serde(rename = "wgLanguageCode")]
    pub language_code: String,
}

/// Inactivity state of a wiki
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InactiveState {
    /// Never marked inactive
    Exempt,
    /// Marked inactive at this `YYYYMMDDHHMMSS` time
    Since(String),
    Active,
}

impl InactiveState {
    fn from_record(record: &WikiRecord) -> Self {
        if record.inactive_exempt {
            InactiveState::Exempt
        } else {
            match &record.inactive_timestamp {
                Some(ts) => InactiveState::Since(ts.clone()),
                None => InactiveState::Active,
            }
        }
    }
}

impl Serialize for InactiveState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            InactiveState::Exempt => serializer.serialize_str("exempt"),
            InactiveState::Since(ts) => serializer.serialize_str(ts),
            InactiveState::Active => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for InactiveState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match string_or_false::deserialize(deserializer)? {
            Some(s) if s == "exempt" => InactiveState::Exempt,
            Some(ts) => InactiveState::Since(ts),
            None => InactiveState::Active,
        })
    }
}

/// Private, closed and inactive flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiStates {
    pub private: bool,

    #[serde(with = "string_or_false", default)]
    pub closed: Option<String>,

    pub inactive: InactiveState,
}

/// `<wiki>.json`
///
/// Core fields are read-only once built. Extensions may only add new
/// top-level keys through [`WikiSnapshot::insert_extension`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiSnapshot {
    timestamp: i64,
    database: String,
    created: String,
    dbcluster: String,
    category: String,

    #[serde(with = "string_or_false", default)]
    url: Option<String>,

    core: CoreSettings,
    states: WikiStates,

    #[serde(flatten)]
    extensions: Map<String, Value>,
}

impl WikiSnapshot {
    /// Build the core payload of `record`, stamped with `timestamp`
    pub fn from_record(record: &WikiRecord, timestamp: i64) -> Self {
        Self {
            timestamp,
            database: record.dbname.clone(),
            created: record.creation.clone(),
            dbcluster: record.dbcluster.clone(),
            category: record.category.clone(),
            url: record.url.clone(),
            core: CoreSettings {
                sitename: record.sitename.clone(),
                language_code: record.language.clone(),
            },
            states: WikiStates {
                private: record.private,
                closed: record.closed_timestamp.clone(),
                inactive: InactiveState::from_record(record),
            },
            extensions: Map::new(),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn dbcluster(&self) -> &str {
        &self.dbcluster
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn core(&self) -> &CoreSettings {
        &self.core
    }

    pub fn states(&self) -> &WikiStates {
        &self.states
    }

    /// Add or replace an extension field
    ///
    /// # Errors
    /// `ReservedField` if `key` names a core field
    pub fn insert_extension(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        if CORE_FIELDS.contains(&key.as_str()) {
            return Err(WikiJsonError::ReservedField(key));
        }

        self.extensions.insert(key, value.into());
        Ok(())
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

/// `Option<String>` stored as the string or as `false`
mod string_or_false {
    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Flag(bool),
    }

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(text)) => Some(text),
            Some(Raw::Flag(_)) | None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(dbname: &str, url: Option<&str>, deleted: bool) -> WikiListing {
        WikiListing {
            dbname: dbname.to_string(),
            dbcluster: "c3".to_string(),
            sitename: format!("{} site", dbname),
            url: url.map(str::to_string),
            deleted,
        }
    }

    #[test]
    fn test_partition_farm() {
        let wikis = vec![
            listing("alphawiki", Some("alpha.example.org"), false),
            listing("betawiki", None, false),
            listing("gonewiki", Some("gone.example.org"), true),
        ];

        let (active, deleted) = partition_farm(&wikis, 20240101000000);

        assert_eq!(active.timestamp, 20240101000000);
        assert_eq!(deleted.timestamp, 20240101000000);
        assert_eq!(active.combi.len(), 2);
        assert!(!active.combi.contains_key("gonewiki"));
        assert_eq!(deleted.databases.len(), 1);
        assert!(deleted.databases["gonewiki"].url.is_none());
    }

    #[test]
    fn test_list_json_shape() {
        let wikis = vec![
            listing("alphawiki", Some("alpha.example.org"), false),
            listing("betawiki", None, false),
        ];
        let (active, _) = partition_farm(&wikis, 7);

        let value = serde_json::to_value(&active).unwrap();
        assert_eq!(
            value,
            json!({
                "timestamp": 7,
                "combi": {
                    "alphawiki": { "s": "alphawiki site", "c": "c3", "u": "alpha.example.org" },
                    "betawiki": { "s": "betawiki site", "c": "c3" }
                }
            })
        );
    }

    #[test]
    fn test_wiki_json_shape() {
        let mut record = WikiRecord::new("testwiki", "Test Wiki");
        record.private = true;
        record.closed_timestamp = Some("20240301000000".to_string());

        let snapshot = WikiSnapshot::from_record(&record, 20240401000000);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(
            value,
            json!({
                "timestamp": 20240401000000_i64,
                "database": "testwiki",
                "created": "20240101000000",
                "dbcluster": "c1",
                "category": "uncategorised",
                "url": false,
                "core": { "wgSitename": "Test Wiki", "wgLanguageCode": "en" },
                "states": { "private": true, "closed": "20240301000000", "inactive": false }
            })
        );
    }

    #[test]
    fn test_inactive_states() {
        let mut record = WikiRecord::new("testwiki", "Test Wiki");
        record.inactive_timestamp = Some("20240201000000".to_string());
        assert_eq!(
            InactiveState::from_record(&record),
            InactiveState::Since("20240201000000".to_string())
        );

        // Exemption wins over a recorded timestamp
        record.inactive_exempt = true;
        let snapshot = WikiSnapshot::from_record(&record, 1);
        assert_eq!(snapshot.states().inactive, InactiveState::Exempt);
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap()["states"]["inactive"],
            json!("exempt")
        );
    }

    #[test]
    fn test_extensions_round_trip() {
        let mut record = WikiRecord::new("testwiki", "Test Wiki");
        record.url = Some("test.example.org".to_string());

        let mut snapshot = WikiSnapshot::from_record(&record, 3);
        snapshot
            .insert_extension("settings", json!({ "wgLogo": "logo.png" }))
            .unwrap();

        let text = serde_json::to_string(&snapshot).unwrap();
        let parsed: WikiSnapshot = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.url(), Some("test.example.org"));
        assert_eq!(parsed.extension("settings").unwrap()["wgLogo"], "logo.png");
    }

    #[test]
    fn test_reserved_extension_keys() {
        let record = WikiRecord::new("testwiki", "Test Wiki");
        let mut snapshot = WikiSnapshot::from_record(&record, 3);

        for key in CORE_FIELDS {
            let err = snapshot.insert_extension(*key, 1).unwrap_err();
            assert!(matches!(err, WikiJsonError::ReservedField(_)));
        }
        assert!(snapshot.extensions().is_empty());
        assert_eq!(snapshot.timestamp(), 3);
    }
}

//! wikijson - JSON snapshot cache of wiki farm metadata
//!
//! Keeps one JSON file per cache entry (`databases.json`, `deleted.json`,
//! `<wiki>.json`) in front of the farm's wikis table. Each file records the
//! invalidation timestamp it was generated for; a shared timestamp store
//! says when each entry was last invalidated. Stale files are regenerated
//! and atomically swapped in.
//!
//! # Architecture
//!
//! - **timestamps**: Shared invalidation timestamp store (SQLite, in-memory)
//! - **database**: Read interface of the wikis table (SQLite, in-memory)
//! - **snapshot**: Payload types and atomic snapshot directory I/O
//! - **staleness**: Pure staleness comparison
//! - **invalidation**: Seeding and resetting invalidation timestamps
//! - **manager**: Per-wiki orchestration (`WikiJson`)
//! - **hooks**: The JSON builder extension point
//! - **config**: YAML configuration

pub mod config;
pub mod database;
pub mod error;
pub mod hooks;
pub mod invalidation;
pub mod logging;
pub mod manager;
pub mod snapshot;
pub mod staleness;
pub mod timestamps;

pub use error::{Result, WikiJsonError};
pub use manager::{ListWrite, UpdateReport, WikiJson};

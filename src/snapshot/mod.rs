//! On-disk JSON snapshots
//!
//! One file per cache entry in the configured directory:
//!
//! ```text
//! cache/
//!   databases.json   # active wikis, {"timestamp", "combi"}
//!   deleted.json     # deleted wikis, {"timestamp", "databases"}
//!   <wiki>.json      # one wiki's settings and states
//! ```
//!
//! Every file carries the `timestamp` it was generated for.

mod payload;
mod store;

pub use payload::{
    partition_farm, CoreSettings, DatabaseListSnapshot, DeletedListSnapshot, InactiveState,
    ListEntry, WikiSnapshot, WikiStates, CORE_FIELDS,
};
pub use store::{wiki_file, SnapshotStore, DATABASES_FILE, DELETED_FILE};

//! Persistence layer: JSON-file snapshot, ranking, and alert storage.
//!
//! Everything durable in the pipeline is a small JSON file under the
//! configured data directory. Runs are serialized by the scheduler's
//! overlap guard, so the stores use plain whole-file reads and writes
//! with no locking.

pub mod alert_history;
pub mod ranking_store;
pub mod snapshot_store;

pub use alert_history::{AlertHistory, AlertRecord};
pub use ranking_store::RankingStore;
pub use snapshot_store::SnapshotStore;

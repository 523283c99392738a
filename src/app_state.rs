//! Shared application state handed to the scheduler's concerns.

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::notify::Notifier;
use crate::persistence::SnapshotStore;
use crate::service::{RankingService, ScanService};

/// Everything a scheduled concern needs, bundled for cheap cloning
/// into the per-concern tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<MonitorConfig>,
    /// Competitor scan pipeline.
    pub scan_service: Arc<ScanService>,
    /// Keyword ranking pipeline.
    pub ranking_service: Arc<RankingService>,
    /// Alert sender (used directly by the queue drain concern).
    pub notifier: Notifier,
    /// Snapshot store (used directly by the cleanup concern).
    pub snapshot_store: SnapshotStore,
}

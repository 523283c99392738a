//! Alert history file.
//!
//! A single JSON array of `{kind, timestamp, change_count}` entries,
//! pruned to the last 24 hours on every write. The rate limiter is
//! reconstructed from these timestamps, so the history doubles as the
//! limiter's durable state. Whole-file read-modify-write, single
//! process; the scheduler serializes writers.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// One sent alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Alert kind (e.g. `"competitor_scan"`, `"ranking_check"`).
    pub kind: String,

    /// Send timestamp.
    pub timestamp: DateTime<Utc>,

    /// Number of change records the alert carried.
    pub change_count: usize,
}

/// File-backed alert history.
#[derive(Debug, Clone)]
pub struct AlertHistory {
    path: PathBuf,
}

impl AlertHistory {
    /// Creates a history persisted at `path` (usually
    /// `<data_dir>/alerts/history.json`).
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads all recorded alerts. A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the file exists but
    /// cannot be read or parsed.
    pub fn load(&self) -> Result<Vec<AlertRecord>, MonitorError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Appends a record and prunes entries older than 24 hours.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on read or write failure.
    pub fn record(
        &self,
        kind: &str,
        change_count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut history = self.load()?;
        history.push(AlertRecord {
            kind: kind.to_string(),
            timestamp: now,
            change_count,
        });
        let floor = now - Duration::hours(24);
        history.retain(|entry| entry.timestamp >= floor);
        let json = serde_json::to_vec_pretty(&history)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Timestamps of alerts sent in the window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on read/parse failure.
    pub fn send_times_since(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<DateTime<Utc>>, MonitorError> {
        let floor = now - window;
        Ok(self
            .load()?
            .into_iter()
            .filter(|entry| entry.timestamp >= floor && entry.timestamp <= now)
            .map(|entry| entry.timestamp)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).single().unwrap_or_default()
    }

    fn history() -> (tempfile::TempDir, AlertHistory) {
        let dir = tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir should be creatable");
        });
        let history = AlertHistory::new(dir.path().join("alerts").join("history.json"));
        (dir, history)
    }

    #[test]
    fn missing_file_is_empty_history() {
        let (_guard, history) = history();
        assert!(matches!(history.load(), Ok(ref h) if h.is_empty()));
    }

    #[test]
    fn record_appends_and_prunes_old_entries() {
        let (_guard, history) = history();
        let _ = history.record("competitor_scan", 3, at_hour(1));
        // 30 hours later: the first entry falls outside the 24 h window.
        let later = at_hour(1) + Duration::hours(30);
        let _ = history.record("ranking_check", 1, later);

        let entries = history.load().unwrap_or_default();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries.first(), Some(e) if e.kind == "ranking_check"));
    }

    #[test]
    fn send_times_filter_to_window() {
        let (_guard, history) = history();
        let _ = history.record("competitor_scan", 2, at_hour(8));
        let _ = history.record("competitor_scan", 2, at_hour(9));
        let _ = history.record("competitor_scan", 2, at_hour(10));

        let within = history
            .send_times_since(at_hour(10), Duration::hours(1))
            .unwrap_or_default();
        assert_eq!(within, vec![at_hour(9), at_hour(10)]);
    }
}

//! On-disk FIFO queue for rate-limited alerts.
//!
//! One JSON file per queued alert, named `{kind}_{timestamp_millis}.json`
//! with a zero-padded timestamp so lexicographic listing within a kind
//! matches arrival order; the drain path sorts on the parsed timestamp
//! across kinds. Queued alerts are never dropped: they wait until the
//! rate limiter frees capacity.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// A queued alert file's contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAlert {
    /// Alert kind (matches the alert history `kind`).
    pub kind: String,

    /// Alert payload (subject, body, change count), kept as JSON so
    /// the queue does not depend on the message shape.
    pub data: serde_json::Value,

    /// When the alert was queued.
    pub queued_at: DateTime<Utc>,
}

/// Directory-backed alert queue.
#[derive(Debug, Clone)]
pub struct AlertQueue {
    dir: PathBuf,
}

impl AlertQueue {
    /// Creates a queue stored in `dir` (usually `<data_dir>/alerts/queue`).
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Persists one alert to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on write failure.
    pub fn enqueue(
        &self,
        kind: &str,
        data: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, MonitorError> {
        fs::create_dir_all(&self.dir)?;
        let alert = QueuedAlert {
            kind: kind.to_string(),
            data,
            queued_at: now,
        };
        let path = self
            .dir
            .join(format!("{kind}_{:013}.json", now.timestamp_millis()));
        let json = serde_json::to_vec_pretty(&alert)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Loads all queued alerts in FIFO order (by queue timestamp, then
    /// file name). Unreadable files are skipped and left in place.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the queue directory
    /// exists but cannot be listed.
    pub fn entries(&self) -> Result<Vec<(PathBuf, QueuedAlert)>, MonitorError> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries: Vec<(PathBuf, QueuedAlert)> = Vec::new();
        for entry in dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let Ok(alert) = serde_json::from_slice::<QueuedAlert>(&bytes) else {
                continue;
            };
            entries.push((path, alert));
        }

        entries.sort_by(|a, b| (a.1.queued_at, &a.0).cmp(&(b.1.queued_at, &b.0)));
        Ok(entries)
    }

    /// Number of alerts currently queued.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the directory cannot
    /// be listed.
    pub fn len(&self) -> Result<usize, MonitorError> {
        Ok(self.entries()?.len())
    }

    /// Returns `true` when nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the directory cannot
    /// be listed.
    pub fn is_empty(&self) -> Result<bool, MonitorError> {
        Ok(self.entries()?.is_empty())
    }

    /// Removes a drained alert file.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on delete failure.
    pub fn remove(&self, path: &Path) -> Result<(), MonitorError> {
        fs::remove_file(path)?;
        Ok(())
    }
}

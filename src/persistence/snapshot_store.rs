//! File-backed snapshot storage with a per-page "latest" pointer.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<target-id>/<page>_<timestamp>.json   append-only records
//! <root>/<target-id>/<page>_latest.json        diff baseline
//! ```
//!
//! Snapshots for a target are totally ordered by wall-clock write time;
//! the pipeline processes targets sequentially and runs are serialized
//! by the scheduler's overlap guard, so there are no concurrent writers
//! for the same target and no file locking.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::{PageType, Snapshot, TargetId};
use crate::error::MonitorError;

/// Timestamp format embedded in snapshot file names. No separators that
/// collide with the `page_timestamp` split.
const FILE_TS_FORMAT: &str = "%Y%m%dT%H%M%S%3f";

const LATEST_SUFFIX: &str = "latest";

/// JSON-file snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `root` (usually `<data_dir>/snapshots`).
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn target_dir(&self, target_id: &TargetId) -> PathBuf {
        self.root.join(target_id.as_str())
    }

    fn latest_path(&self, target_id: &TargetId, page_type: &PageType) -> PathBuf {
        self.target_dir(target_id)
            .join(format!("{}_{LATEST_SUFFIX}.json", page_type.as_str()))
    }

    /// Writes a timestamped record and advances the latest pointer.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on directory creation,
    /// serialization, or write failure.
    pub fn save(&self, snapshot: &Snapshot) -> Result<PathBuf, MonitorError> {
        let path = self.write_record(snapshot)?;
        let json = serde_json::to_vec_pretty(snapshot)?;
        fs::write(self.latest_path(&snapshot.target_id, &snapshot.page_type), json)?;
        Ok(path)
    }

    /// Writes a timestamped record without touching the latest pointer.
    ///
    /// Used for errored snapshots: they are kept for audit, but the
    /// next successful scan must diff against the last good state.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on write failure.
    pub fn save_record_only(&self, snapshot: &Snapshot) -> Result<PathBuf, MonitorError> {
        self.write_record(snapshot)
    }

    fn write_record(&self, snapshot: &Snapshot) -> Result<PathBuf, MonitorError> {
        let dir = self.target_dir(&snapshot.target_id);
        fs::create_dir_all(&dir)?;
        let file_name = format!(
            "{}_{}.json",
            snapshot.page_type.as_str(),
            snapshot.captured_at.format(FILE_TS_FORMAT)
        );
        let path = dir.join(file_name);
        let json = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Loads the most recent snapshot for a target's page.
    ///
    /// No prior snapshot is a valid state, not an error: the first scan
    /// of a target has nothing to diff against, so a missing pointer
    /// file yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the pointer file
    /// exists but cannot be read or parsed.
    pub fn load_latest(
        &self,
        target_id: &TargetId,
        page_type: &PageType,
    ) -> Result<Option<Snapshot>, MonitorError> {
        let path = self.latest_path(target_id, page_type);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let snapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    /// Deletes timestamped records older than `max_age`, always
    /// preserving latest pointers and the `keep_recent` newest records
    /// per (target, page). Returns the number of files deleted.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the store cannot be
    /// listed or a stale record cannot be deleted. Files with
    /// unrecognized names are skipped, not fatal.
    pub fn cleanup(
        &self,
        now: DateTime<Utc>,
        max_age: chrono::Duration,
        keep_recent: usize,
    ) -> Result<u64, MonitorError> {
        let cutoff = now - max_age;
        let mut deleted = 0_u64;

        let targets = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        for target_entry in targets.flatten() {
            if !target_entry.path().is_dir() {
                continue;
            }
            deleted += cleanup_target_dir(&target_entry.path(), cutoff, keep_recent)?;
        }

        Ok(deleted)
    }
}

fn cleanup_target_dir(
    dir: &Path,
    cutoff: DateTime<Utc>,
    keep_recent: usize,
) -> Result<u64, MonitorError> {
    // (page, timestamp, path) for every timestamped record in the dir.
    let mut records: Vec<(String, DateTime<Utc>, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some((page, ts_part)) = stem.rsplit_once('_') else {
            continue;
        };
        if ts_part == LATEST_SUFFIX {
            continue;
        }
        let Ok(naive) = NaiveDateTime::parse_from_str(ts_part, FILE_TS_FORMAT) else {
            continue;
        };
        records.push((page.to_string(), naive.and_utc(), path));
    }

    // Newest first within each page group.
    records.sort_by(|a, b| (&a.0, b.1).cmp(&(&b.0, a.1)));

    let mut deleted = 0_u64;
    let mut group_index = 0_usize;
    let mut current_page: Option<&str> = None;

    for (page, timestamp, path) in &records {
        if current_page != Some(page.as_str()) {
            current_page = Some(page.as_str());
            group_index = 0;
        }
        if group_index >= keep_recent && *timestamp < cutoff {
            fs::remove_file(path)?;
            deleted += 1;
        }
        group_index += 1;
    }

    Ok(deleted)
}

//! Per-keyword ranking history files.
//!
//! One JSON array per keyword under the store root, appended on every
//! check. The last record for a given domain is the baseline for
//! ranking change detection.

use std::fs;
use std::path::PathBuf;

use crate::domain::RankingRecord;
use crate::error::MonitorError;

/// JSON-file ranking history store.
#[derive(Debug, Clone)]
pub struct RankingStore {
    root: PathBuf,
}

impl RankingStore {
    /// Creates a store rooted at `root` (usually `<data_dir>/rankings`).
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn keyword_path(&self, keyword: &str) -> PathBuf {
        let slug: String = keyword
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        self.root.join(format!("{slug}.json"))
    }

    /// Loads the full history for a keyword, oldest first. A keyword
    /// never checked before has an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the history file
    /// exists but cannot be read or parsed.
    pub fn load_history(&self, keyword: &str) -> Result<Vec<RankingRecord>, MonitorError> {
        let path = self.keyword_path(keyword);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Returns the most recent record for `domain` under `keyword`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on read/parse failure.
    pub fn latest_for(
        &self,
        keyword: &str,
        domain: &str,
    ) -> Result<Option<RankingRecord>, MonitorError> {
        let history = self.load_history(keyword)?;
        Ok(history.into_iter().rev().find(|r| r.domain == domain))
    }

    /// Appends records for one check to the keyword's history.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on read or write failure.
    pub fn append(&self, keyword: &str, records: &[RankingRecord]) -> Result<(), MonitorError> {
        fs::create_dir_all(&self.root)?;
        let mut history = self.load_history(keyword)?;
        history.extend_from_slice(records);
        let json = serde_json::to_vec_pretty(&history)?;
        fs::write(self.keyword_path(keyword), json)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::NOT_FOUND_POSITION;
    use chrono::{DateTime, TimeZone, Utc};

    fn at_day(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0).single().unwrap_or_default()
    }

    fn record(domain: &str, position: u32, day: u32) -> RankingRecord {
        RankingRecord {
            keyword: "dental software".to_string(),
            domain: domain.to_string(),
            position,
            checked_at: at_day(day),
        }
    }

    #[test]
    fn unknown_keyword_has_empty_history() {
        let dir = tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir should be creatable");
        });
        let store = RankingStore::new(dir.path().join("rankings"));
        let history = store.load_history("dental software");
        assert!(matches!(history, Ok(ref h) if h.is_empty()));
    }

    #[test]
    fn latest_for_returns_newest_record_per_domain() {
        let dir = tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir should be creatable");
        });
        let store = RankingStore::new(dir.path().join("rankings"));

        let _ = store.append(
            "dental software",
            &[record("acme.com", 7, 1), record("rival.com", 3, 1)],
        );
        let _ = store.append(
            "dental software",
            &[record("acme.com", NOT_FOUND_POSITION, 2), record("rival.com", 2, 2)],
        );

        let latest = store.latest_for("dental software", "acme.com").ok().flatten();
        let Some(latest) = latest else {
            panic!("acme.com should have a latest record");
        };
        assert_eq!(latest.position, NOT_FOUND_POSITION);
        assert_eq!(latest.checked_at, at_day(2));

        let history = store.load_history("dental software").unwrap_or_default();
        assert_eq!(history.len(), 4);
    }
}

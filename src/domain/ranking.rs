//! Keyword ranking records.
//!
//! The ranking tracker records, per keyword and per tracked domain, the
//! 1-based position of the domain in the search results. A domain that
//! does not appear in the top 100 is recorded at the
//! [`NOT_FOUND_POSITION`] sentinel so that "fell out of the top 100"
//! produces a large, correctly signed delta instead of an undefined
//! comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel position for "not found in the top 100".
pub const NOT_FOUND_POSITION: u32 = 101;

/// How often a keyword is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCadence {
    /// Checked by the daily ranking concern.
    #[default]
    Daily,
    /// Checked by the weekly ranking concern.
    Weekly,
}

/// A tracked keyword and how to read its results page.
///
/// The search URL and the selector for ordered organic result links are
/// configuration data, not code: results-page markup is brittle and
/// site-specific, so it lives in the targets file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSpec {
    /// Keyword phrase being tracked.
    pub keyword: String,

    /// URL of the results page to fetch for this keyword.
    pub search_url: String,

    /// CSS selector yielding organic result links in rank order.
    pub result_selector: String,

    /// Which ranking concern picks this keyword up.
    #[serde(default)]
    pub cadence: CheckCadence,
}

/// One observation of a domain's position for a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    /// Keyword phrase.
    pub keyword: String,

    /// Tracked domain.
    pub domain: String,

    /// 1-based position, or [`NOT_FOUND_POSITION`].
    pub position: u32,

    /// Observation timestamp.
    pub checked_at: DateTime<Utc>,
}

impl RankingRecord {
    /// Returns `true` when the domain was not found in the top 100.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.position >= NOT_FOUND_POSITION
    }
}

/// Signed position delta between two observations, computed as
/// `old - new` so a positive delta means the domain rose.
#[must_use]
pub fn position_delta(old_position: u32, new_position: u32) -> i64 {
    i64::from(old_position) - i64::from(new_position)
}

//! Extracted page snapshots.
//!
//! A [`Snapshot`] is the structured result of extracting one page of
//! one target at one point in time. Snapshots are immutable once
//! written; the snapshot store only ever appends new ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::target::{PageType, TargetId};

/// A heading extracted from a page, with its level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1 for `h1`, 2 for `h2`, ...).
    pub level: u8,
    /// Collapsed heading text.
    pub text: String,
}

/// Blog post metadata extracted from a blog index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    /// Post title (anchor text).
    pub title: String,
    /// Post link (`href` attribute, as found in the document).
    pub href: String,
}

/// One immutable extracted record of a target's page.
///
/// Produced by the extractor, persisted by the snapshot store, and
/// compared pairwise by the change detector. A snapshot whose fetch
/// failed carries the error in [`Snapshot::fetch_error`] with every
/// extracted field empty; it is kept for audit but never becomes the
/// diff baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Target this snapshot belongs to.
    pub target_id: TargetId,

    /// Page type that was scanned.
    pub page_type: PageType,

    /// Capture timestamp (immutable after creation).
    pub captured_at: DateTime<Utc>,

    /// Document title, empty when absent.
    #[serde(default)]
    pub title: String,

    /// Content of the description meta tag, empty when absent.
    #[serde(default)]
    pub meta_description: String,

    /// Headings in document order.
    #[serde(default)]
    pub headings: Vec<Heading>,

    /// Currency strings found in the visible text, deduplicated,
    /// first-appearance order.
    #[serde(default)]
    pub pricing: Vec<String>,

    /// Statistic claims (`"500+ clients"` and the like), deduplicated.
    #[serde(default)]
    pub statistics: Vec<String>,

    /// Blog post metadata, when a blog post selector is configured.
    #[serde(default)]
    pub blog_posts: Vec<BlogPost>,

    /// Truncated hex digest of the visible text; cheap equality proxy
    /// for "did anything change" without storing the full text.
    #[serde(default)]
    pub content_hash: String,

    /// Relative path of the screenshot file, when one was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    /// Fetch failure recorded for this page, if any. Partial-failure
    /// semantics: one page failing does not stop the rest of the scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl Snapshot {
    /// Creates an empty snapshot shell for the given target/page/time.
    /// The extractor fills in the content fields.
    #[must_use]
    pub fn empty(target_id: TargetId, page_type: PageType, captured_at: DateTime<Utc>) -> Self {
        Self {
            target_id,
            page_type,
            captured_at,
            title: String::new(),
            meta_description: String::new(),
            headings: Vec::new(),
            pricing: Vec::new(),
            statistics: Vec::new(),
            blog_posts: Vec::new(),
            content_hash: String::new(),
            screenshot: None,
            fetch_error: None,
        }
    }

    /// Creates a snapshot recording a fetch failure for this page.
    #[must_use]
    pub fn errored(
        target_id: TargetId,
        page_type: PageType,
        captured_at: DateTime<Utc>,
        error: String,
    ) -> Self {
        let mut snapshot = Self::empty(target_id, page_type, captured_at);
        snapshot.fetch_error = Some(error);
        snapshot
    }

    /// Returns `true` when this snapshot records a fetch failure and
    /// must not be used as a diff baseline.
    #[must_use]
    pub const fn is_errored(&self) -> bool {
        self.fetch_error.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn capture_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn empty_snapshot_has_no_error() {
        let snap = Snapshot::empty(TargetId::new("acme"), PageType::Home, capture_time());
        assert!(!snap.is_errored());
        assert!(snap.pricing.is_empty());
        assert!(snap.title.is_empty());
    }

    #[test]
    fn errored_snapshot_carries_message() {
        let snap = Snapshot::errored(
            TargetId::new("acme"),
            PageType::Pricing,
            capture_time(),
            "timed out fetching https://acme.com/pricing".to_string(),
        );
        assert!(snap.is_errored());
        assert_eq!(
            snap.fetch_error.as_deref(),
            Some("timed out fetching https://acme.com/pricing")
        );
    }

    #[test]
    fn serde_round_trip_preserves_fields() {
        let mut snap = Snapshot::empty(TargetId::new("acme"), PageType::Pricing, capture_time());
        snap.title = "Pricing — Acme".to_string();
        snap.pricing = vec!["$49.99/mo".to_string(), "$199/year".to_string()];
        snap.headings = vec![Heading {
            level: 1,
            text: "Plans".to_string(),
        }];
        snap.content_hash = "a1b2c3d4e5f60718".to_string();

        let json = serde_json::to_string(&snap).unwrap_or_default();
        let back: Snapshot = serde_json::from_str(&json).ok().unwrap_or_else(|| {
            panic!("snapshot should round-trip");
        });
        assert_eq!(back, snap);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{
            "target_id": "acme",
            "page_type": "home",
            "captured_at": "2025-06-01T12:00:00Z"
        }"#;
        let snap: Snapshot = serde_json::from_str(json).ok().unwrap_or_else(|| {
            panic!("minimal snapshot should deserialize");
        });
        assert!(snap.headings.is_empty());
        assert!(snap.screenshot.is_none());
    }
}

//! Typed change records emitted by the detector.
//!
//! Every field the detector compares has its own [`ChangeRecord`]
//! variant carrying the old and new values, so downstream consumers
//! (report renderer, notifier) never re-derive what changed.

use serde::{Deserialize, Serialize};

use super::target::{PageType, TargetId};

/// Significance tier attached to a change record.
///
/// Ordering is severity order: `Info` lowest, `High` highest. The alert
/// subject line is tagged with the emoji of the most severe record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    /// Routine change, informational only.
    Info,
    /// Hash inequality alone does not say what changed.
    CheckManually,
    /// Meaningful movement below the major threshold.
    Moderate,
    /// Large movement (ranking delta at or past the major threshold).
    Major,
    /// Commercially sensitive change (pricing).
    High,
}

impl Significance {
    /// Returns the emoji used to tag alert subjects at this tier.
    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::CheckManually => "👀",
            Self::Moderate => "📊",
            Self::Major => "📈",
            Self::High => "🚨",
        }
    }
}

/// A typed diff between two snapshots of the same target/page, or
/// between two ranking records of the same keyword/domain.
///
/// A record exists only when the compared field differs by the
/// detector's rule for that field. Records are transient: consumed by
/// the report renderer and notifier, persisted only in the alert
/// history count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "snake_case")]
pub enum ChangeRecord {
    /// Document title differs.
    TitleChange {
        /// Target whose page changed.
        target_id: TargetId,
        /// Page the change was seen on.
        page_type: PageType,
        /// Previous title.
        old: String,
        /// Current title.
        new: String,
    },

    /// Meta description differs.
    MetaChange {
        /// Target whose page changed.
        target_id: TargetId,
        /// Page the change was seen on.
        page_type: PageType,
        /// Previous meta description.
        old: String,
        /// Current meta description.
        new: String,
    },

    /// Visible-text content hash differs.
    ContentChange {
        /// Target whose page changed.
        target_id: TargetId,
        /// Page the change was seen on.
        page_type: PageType,
        /// Previous content hash.
        old_hash: String,
        /// Current content hash.
        new_hash: String,
    },

    /// Detected pricing string set differs.
    PricingChange {
        /// Target whose page changed.
        target_id: TargetId,
        /// Page the change was seen on.
        page_type: PageType,
        /// Previous pricing strings.
        old: Vec<String>,
        /// Current pricing strings.
        new: Vec<String>,
    },

    /// Detected statistic string set differs.
    StatisticsChange {
        /// Target whose page changed.
        target_id: TargetId,
        /// Page the change was seen on.
        page_type: PageType,
        /// Previous statistic strings.
        old: Vec<String>,
        /// Current statistic strings.
        new: Vec<String>,
    },

    /// Search ranking position moved at least the configured threshold.
    RankingChange {
        /// Tracked keyword.
        keyword: String,
        /// Domain whose position moved.
        domain: String,
        /// Previous position (101 = not found in the top 100).
        old_position: u32,
        /// Current position (101 = not found in the top 100).
        new_position: u32,
        /// Signed delta (`old - new`; positive means the domain rose).
        delta: i64,
    },
}

impl ChangeRecord {
    /// Returns the change kind as a static string slice.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::TitleChange { .. } => "title_change",
            Self::MetaChange { .. } => "meta_change",
            Self::ContentChange { .. } => "content_change",
            Self::PricingChange { .. } => "pricing_change",
            Self::StatisticsChange { .. } => "statistics_change",
            Self::RankingChange { .. } => "ranking_change",
        }
    }

    /// Returns the significance tier for this record.
    ///
    /// Pricing is the only field treated as high priority: it is the
    /// most commercially sensitive signal. Ranking significance depends
    /// on the magnitude of the delta (major at 10 or more).
    #[must_use]
    pub fn significance(&self) -> Significance {
        match self {
            Self::TitleChange { .. } | Self::MetaChange { .. } | Self::StatisticsChange { .. } => {
                Significance::Info
            }
            Self::ContentChange { .. } => Significance::CheckManually,
            Self::PricingChange { .. } => Significance::High,
            Self::RankingChange { delta, .. } => {
                if delta.unsigned_abs() >= 10 {
                    Significance::Major
                } else {
                    Significance::Moderate
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn pricing_change() -> ChangeRecord {
        ChangeRecord::PricingChange {
            target_id: TargetId::new("acme"),
            page_type: PageType::Pricing,
            old: vec!["$49/mo".to_string()],
            new: vec!["$59/mo".to_string()],
        }
    }

    #[test]
    fn pricing_is_high_priority() {
        assert_eq!(pricing_change().significance(), Significance::High);
        assert_eq!(pricing_change().kind_str(), "pricing_change");
    }

    #[test]
    fn ranking_significance_depends_on_delta() {
        let moderate = ChangeRecord::RankingChange {
            keyword: "dental software".to_string(),
            domain: "acmedental.com".to_string(),
            old_position: 8,
            new_position: 4,
            delta: 4,
        };
        assert_eq!(moderate.significance(), Significance::Moderate);

        let major = ChangeRecord::RankingChange {
            keyword: "dental software".to_string(),
            domain: "acmedental.com".to_string(),
            old_position: 12,
            new_position: 101,
            delta: -89,
        };
        assert_eq!(major.significance(), Significance::Major);
    }

    #[test]
    fn content_change_needs_manual_check() {
        let record = ChangeRecord::ContentChange {
            target_id: TargetId::new("acme"),
            page_type: PageType::Home,
            old_hash: "aaaa".to_string(),
            new_hash: "bbbb".to_string(),
        };
        assert_eq!(record.significance(), Significance::CheckManually);
    }

    #[test]
    fn serializes_with_change_type_tag() {
        let json = serde_json::to_string(&pricing_change()).unwrap_or_default();
        assert!(json.contains(r#""change_type":"pricing_change""#));
    }

    #[test]
    fn severity_ordering_puts_high_last() {
        assert!(Significance::Info < Significance::CheckManually);
        assert!(Significance::Moderate < Significance::Major);
        assert!(Significance::Major < Significance::High);
    }
}

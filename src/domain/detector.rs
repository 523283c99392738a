//! Field-by-field change detection between snapshots.
//!
//! [`detect`] is a pure, total function: every snapshot field has an
//! explicit comparison rule, and a change record exists only when the
//! rule says the field differs. The first-ever scan of a target has
//! nothing to compare against and yields zero records.

use std::collections::BTreeSet;

use super::change::ChangeRecord;
use super::ranking::{RankingRecord, position_delta};
use super::snapshot::Snapshot;

/// Compares two snapshots of the same target/page and returns the
/// typed change records.
///
/// Rules, in order:
/// - `previous == None` (first scan) yields no records.
/// - Errored snapshots are never compared; an errored side yields no
///   records.
/// - Title and meta description: any string inequality. A field empty
///   on both sides is equal, so absence in both emits nothing.
/// - Content hash: inequality only signals *something* changed, so the
///   record is tiered "check manually".
/// - Pricing and statistics: compared as sets; ordering differences
///   alone are not changes.
#[must_use]
pub fn detect(previous: Option<&Snapshot>, current: &Snapshot) -> Vec<ChangeRecord> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    if previous.is_errored() || current.is_errored() {
        return Vec::new();
    }

    let mut changes = Vec::new();

    if previous.title != current.title {
        changes.push(ChangeRecord::TitleChange {
            target_id: current.target_id.clone(),
            page_type: current.page_type.clone(),
            old: previous.title.clone(),
            new: current.title.clone(),
        });
    }

    if previous.meta_description != current.meta_description {
        changes.push(ChangeRecord::MetaChange {
            target_id: current.target_id.clone(),
            page_type: current.page_type.clone(),
            old: previous.meta_description.clone(),
            new: current.meta_description.clone(),
        });
    }

    if previous.content_hash != current.content_hash {
        changes.push(ChangeRecord::ContentChange {
            target_id: current.target_id.clone(),
            page_type: current.page_type.clone(),
            old_hash: previous.content_hash.clone(),
            new_hash: current.content_hash.clone(),
        });
    }

    if differs_as_set(&previous.pricing, &current.pricing) {
        changes.push(ChangeRecord::PricingChange {
            target_id: current.target_id.clone(),
            page_type: current.page_type.clone(),
            old: previous.pricing.clone(),
            new: current.pricing.clone(),
        });
    }

    if differs_as_set(&previous.statistics, &current.statistics) {
        changes.push(ChangeRecord::StatisticsChange {
            target_id: current.target_id.clone(),
            page_type: current.page_type.clone(),
            old: previous.statistics.clone(),
            new: current.statistics.clone(),
        });
    }

    changes
}

/// Compares two ranking observations of the same keyword/domain.
///
/// Emits a record only when the absolute position delta is at least
/// `threshold`. "Not found" sides arrive as position 101, so falling
/// out of the top 100 produces a large delta here rather than a
/// special case.
#[must_use]
pub fn detect_ranking(
    previous: &RankingRecord,
    current: &RankingRecord,
    threshold: u32,
) -> Option<ChangeRecord> {
    let delta = position_delta(previous.position, current.position);
    if delta.unsigned_abs() < u64::from(threshold) {
        return None;
    }
    Some(ChangeRecord::RankingChange {
        keyword: current.keyword.clone(),
        domain: current.domain.clone(),
        old_position: previous.position,
        new_position: current.position,
        delta,
    })
}

fn differs_as_set(old: &[String], new: &[String]) -> bool {
    let old_set: BTreeSet<&str> = old.iter().map(String::as_str).collect();
    let new_set: BTreeSet<&str> = new.iter().map(String::as_str).collect();
    old_set != new_set
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::change::Significance;
    use crate::domain::ranking::NOT_FOUND_POSITION;
    use crate::domain::target::{PageType, TargetId};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).single().unwrap_or_default()
    }

    fn base_snapshot() -> Snapshot {
        let mut snap = Snapshot::empty(TargetId::new("acme"), PageType::Pricing, at(8));
        snap.title = "Pricing — Acme".to_string();
        snap.meta_description = "Plans for every practice".to_string();
        snap.pricing = vec!["$49.99/mo".to_string(), "$199/year".to_string()];
        snap.statistics = vec!["500+ clients".to_string()];
        snap.content_hash = "a1b2c3d4e5f60718".to_string();
        snap
    }

    #[test]
    fn identical_snapshots_yield_no_changes() {
        let prev = base_snapshot();
        let mut cur = base_snapshot();
        cur.captured_at = at(14);
        assert!(detect(Some(&prev), &cur).is_empty());
    }

    #[test]
    fn first_scan_yields_no_changes() {
        let cur = base_snapshot();
        assert!(detect(None, &cur).is_empty());
    }

    #[test]
    fn pricing_only_difference_yields_one_high_record() {
        let prev = base_snapshot();
        let mut cur = base_snapshot();
        cur.pricing = vec!["$59.99/mo".to_string(), "$199/year".to_string()];

        let changes = detect(Some(&prev), &cur);
        assert_eq!(changes.len(), 1);
        let Some(change) = changes.first() else {
            panic!("expected one change record");
        };
        assert_eq!(change.kind_str(), "pricing_change");
        assert_eq!(change.significance(), Significance::High);
    }

    #[test]
    fn pricing_reorder_is_not_a_change() {
        let prev = base_snapshot();
        let mut cur = base_snapshot();
        cur.pricing = vec!["$199/year".to_string(), "$49.99/mo".to_string()];
        assert!(detect(Some(&prev), &cur).is_empty());
    }

    #[test]
    fn title_and_hash_changes_are_separate_records() {
        let prev = base_snapshot();
        let mut cur = base_snapshot();
        cur.title = "Plans — Acme".to_string();
        cur.content_hash = "ffff000011112222".to_string();

        let changes = detect(Some(&prev), &cur);
        let kinds: Vec<&str> = changes.iter().map(ChangeRecord::kind_str).collect();
        assert_eq!(kinds, vec!["title_change", "content_change"]);
    }

    #[test]
    fn fields_absent_in_both_emit_nothing() {
        let prev = Snapshot::empty(TargetId::new("acme"), PageType::Home, at(8));
        let cur = Snapshot::empty(TargetId::new("acme"), PageType::Home, at(14));
        assert!(detect(Some(&prev), &cur).is_empty());
    }

    #[test]
    fn errored_side_is_never_compared() {
        let prev = base_snapshot();
        let cur = Snapshot::errored(
            TargetId::new("acme"),
            PageType::Pricing,
            at(14),
            "timed out".to_string(),
        );
        assert!(detect(Some(&prev), &cur).is_empty());
    }

    fn ranking(position: u32, hour: u32) -> RankingRecord {
        RankingRecord {
            keyword: "dental software".to_string(),
            domain: "acmedental.com".to_string(),
            position,
            checked_at: at(hour),
        }
    }

    #[test]
    fn ranking_delta_below_threshold_is_silent() {
        assert!(detect_ranking(&ranking(8, 8), &ranking(6, 14), 3).is_none());
    }

    #[test]
    fn ranking_delta_at_threshold_emits() {
        let change = detect_ranking(&ranking(8, 8), &ranking(5, 14), 3);
        let Some(change) = change else {
            panic!("delta of exactly 3 should emit");
        };
        assert_eq!(change.kind_str(), "ranking_change");
        assert_eq!(change.significance(), Significance::Moderate);
    }

    #[test]
    fn ranking_delta_of_ten_or_more_is_major() {
        let change = detect_ranking(&ranking(15, 8), &ranking(5, 14), 3);
        let Some(change) = change else {
            panic!("delta of 10 should emit");
        };
        assert_eq!(change.significance(), Significance::Major);
    }

    #[test]
    fn falling_out_of_top_100_uses_sentinel_delta() {
        let change = detect_ranking(&ranking(7, 8), &ranking(NOT_FOUND_POSITION, 14), 3);
        let Some(ChangeRecord::RankingChange { delta, new_position, .. }) = change else {
            panic!("falling out should emit a ranking change");
        };
        assert_eq!(delta, -94);
        assert_eq!(new_position, NOT_FOUND_POSITION);
    }
}

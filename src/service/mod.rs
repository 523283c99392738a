//! Service layer: pipeline orchestration.
//!
//! [`ScanService`] runs the competitor pipeline (fetch → extract →
//! store → detect → report → notify) and [`RankingService`] runs the
//! keyword position checks. Both process their work sequentially with
//! fixed delays and recover from per-item failures locally.

pub mod ranking_service;
pub mod scan_service;

pub use ranking_service::{RankingOutcome, RankingService};
pub use scan_service::{ScanOutcome, ScanService};

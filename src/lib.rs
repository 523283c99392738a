//! # sitewatch
//!
//! Competitor website monitoring daemon: periodically fetches
//! configured competitor pages, extracts structured fields, stores
//! immutable snapshots, diffs them against the previous baseline, and
//! emails rate-limited alerts and HTML reports.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler (interval + overlap guard)
//!     │
//!     ├── ScanService / RankingService (service/)
//!     │       │
//!     │       ├── PageFetcher (fetch/)
//!     │       ├── Extractor (extract/)
//!     │       ├── Change detector (domain/)
//!     │       └── Report renderer (report/)
//!     │
//!     ├── SnapshotStore / RankingStore / AlertHistory (persistence/)
//!     │
//!     └── Notifier → Mailer + RateLimiter + AlertQueue (notify/)
//! ```
//!
//! Targets are processed sequentially with fixed delays between pages
//! and targets; the scheduler skips a concern's tick while a previous
//! run is still in flight, so no two scans ever overlap.

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod notify;
pub mod persistence;
pub mod report;
pub mod scheduler;
pub mod service;

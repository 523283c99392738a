//! Competitor scan orchestration.
//!
//! One scan walks every configured target sequentially: fetch each
//! page, extract a snapshot, persist it, diff it against the previous
//! baseline, then render a report to disk and push an alert through
//! the notifier when anything changed. Fixed delays between pages and
//! targets keep request rates low on the scraped sites; the ceiling is
//! deliberate, not an oversight.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::detector::detect;
use crate::domain::{ChangeRecord, PageSpec, PageType, Snapshot, Target};
use crate::error::MonitorError;
use crate::extract::extract_snapshot;
use crate::fetch::PageFetcher;
use crate::notify::Notifier;
use crate::persistence::SnapshotStore;
use crate::report::{PageReport, ReportInput, TargetReport, alert_subject, render_alert_email, render_report};

/// Summary of one scan run.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Targets processed.
    pub targets_scanned: usize,

    /// Pages fetched and extracted successfully.
    pub pages_fetched: usize,

    /// Pages whose fetch failed (recorded, not fatal).
    pub pages_failed: usize,

    /// All change records detected this run.
    pub changes: Vec<ChangeRecord>,

    /// Where the scan report was written, when the write succeeded.
    pub report_path: Option<PathBuf>,
}

/// Orchestrates the fetch → extract → store → detect → report → notify
/// pipeline for all competitor targets.
#[derive(Debug)]
pub struct ScanService {
    fetcher: Arc<dyn PageFetcher>,
    store: SnapshotStore,
    notifier: Notifier,
    targets: Vec<Target>,
    data_dir: PathBuf,
    page_delay: Duration,
    target_delay: Duration,
}

impl ScanService {
    /// Creates a scan service.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: SnapshotStore,
        notifier: Notifier,
        targets: Vec<Target>,
        data_dir: PathBuf,
        page_delay: Duration,
        target_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            targets,
            data_dir,
            page_delay,
            target_delay,
        }
    }

    /// Runs a full competitor scan.
    ///
    /// One page failing is recorded on that page's snapshot and does
    /// not stop other pages or targets. Persistence failures are
    /// logged and fatal only to their own step. A notification failure
    /// never blocks the report.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; the `Result` mirrors the other
    /// run entry points so the scheduler treats all concerns alike.
    pub async fn run_scan(&self) -> Result<ScanOutcome, MonitorError> {
        let started_at = Utc::now();
        tracing::info!(targets = self.targets.len(), "competitor scan started");

        let mut target_reports = Vec::with_capacity(self.targets.len());
        let mut all_changes = Vec::new();
        let mut pages_fetched = 0_usize;
        let mut pages_failed = 0_usize;

        for (target_index, target) in self.targets.iter().enumerate() {
            if target_index > 0 {
                tokio::time::sleep(self.target_delay).await;
            }

            let mut page_reports = Vec::with_capacity(target.pages.len());
            for (page_index, (page_type, spec)) in target.pages.iter().enumerate() {
                if page_index > 0 {
                    tokio::time::sleep(self.page_delay).await;
                }
                let report = self.scan_page(target, page_type, spec).await;
                if report.snapshot.is_errored() {
                    pages_failed += 1;
                } else {
                    pages_fetched += 1;
                }
                all_changes.extend(report.changes.iter().cloned());
                page_reports.push(report);
            }

            target_reports.push(TargetReport {
                name: target.name.clone(),
                domain: target.domain.clone(),
                pages: page_reports,
            });
        }

        let input = ReportInput {
            generated_at: started_at,
            targets: target_reports,
        };
        let report_path = self.write_report("scan", &render_report(&input), started_at);

        if !all_changes.is_empty() {
            let now = Utc::now();
            let subject = alert_subject("Competitor scan", &all_changes);
            let body = render_alert_email("Competitor scan", &all_changes, now);
            if let Err(err) = self
                .notifier
                .notify("competitor_scan", subject, body, all_changes.len(), now)
                .await
            {
                tracing::error!(error = %err, "scan alert failed");
            }
        }

        tracing::info!(
            pages_fetched,
            pages_failed,
            changes = all_changes.len(),
            "competitor scan complete"
        );

        Ok(ScanOutcome {
            targets_scanned: self.targets.len(),
            pages_fetched,
            pages_failed,
            changes: all_changes,
            report_path,
        })
    }

    async fn scan_page(&self, target: &Target, page_type: &PageType, spec: &PageSpec) -> PageReport {
        let captured_at = Utc::now();

        let fetched = match self.fetcher.fetch(&spec.url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::warn!(
                    target = %target.id,
                    page = %page_type,
                    error = %err,
                    "page fetch failed"
                );
                let snapshot = Snapshot::errored(
                    target.id.clone(),
                    page_type.clone(),
                    captured_at,
                    err.to_string(),
                );
                // Keep the record for audit; the latest pointer stays
                // on the last good snapshot.
                if let Err(err) = self.store.save_record_only(&snapshot) {
                    tracing::error!(target = %target.id, error = %err, "snapshot write failed");
                }
                return PageReport {
                    page_type: page_type.clone(),
                    snapshot,
                    changes: Vec::new(),
                };
            }
        };

        let mut snapshot = extract_snapshot(
            &fetched.html,
            target.id.clone(),
            page_type.clone(),
            &spec.selectors,
            captured_at,
        );

        if let Some(bytes) = fetched.screenshot {
            snapshot.screenshot = self.save_screenshot(target, page_type, &bytes, captured_at);
        }

        let previous = match self.store.load_latest(&target.id, page_type) {
            Ok(previous) => previous,
            Err(err) => {
                tracing::warn!(
                    target = %target.id,
                    page = %page_type,
                    error = %err,
                    "latest snapshot unreadable; diffing skipped"
                );
                None
            }
        };

        let changes = detect(previous.as_ref(), &snapshot);

        if let Err(err) = self.store.save(&snapshot) {
            tracing::error!(target = %target.id, error = %err, "snapshot write failed");
        }

        tracing::debug!(
            target = %target.id,
            page = %page_type,
            changes = changes.len(),
            "page scanned"
        );

        PageReport {
            page_type: page_type.clone(),
            snapshot,
            changes,
        }
    }

    fn save_screenshot(
        &self,
        target: &Target,
        page_type: &PageType,
        bytes: &[u8],
        captured_at: chrono::DateTime<Utc>,
    ) -> Option<String> {
        let relative = format!(
            "screenshots/{}/{}_{}.png",
            target.id,
            page_type.as_str(),
            captured_at.format("%Y%m%dT%H%M%S%3f")
        );
        let path = self.data_dir.join(&relative);
        let write = path
            .parent()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|()| fs::write(&path, bytes));
        match write {
            Ok(()) => Some(relative),
            Err(err) => {
                tracing::error!(target = %target.id, error = %err, "screenshot write failed");
                None
            }
        }
    }

    /// Renders a summary report from the latest stored snapshots (no
    /// fetching) and emails it.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the report cannot be
    /// written to disk.
    pub async fn run_report(&self) -> Result<PathBuf, MonitorError> {
        let generated_at = Utc::now();

        let mut target_reports = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let mut page_reports = Vec::with_capacity(target.pages.len());
            for page_type in target.pages.keys() {
                let snapshot = match self.store.load_latest(&target.id, page_type) {
                    Ok(Some(snapshot)) => snapshot,
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::warn!(target = %target.id, error = %err, "latest snapshot unreadable");
                        continue;
                    }
                };
                page_reports.push(PageReport {
                    page_type: page_type.clone(),
                    snapshot,
                    changes: Vec::new(),
                });
            }
            target_reports.push(TargetReport {
                name: target.name.clone(),
                domain: target.domain.clone(),
                pages: page_reports,
            });
        }

        let input = ReportInput {
            generated_at,
            targets: target_reports,
        };
        let html = render_report(&input);
        let path = self
            .write_report("summary", &html, generated_at)
            .ok_or_else(|| MonitorError::Persistence("summary report write failed".to_string()))?;

        let subject = alert_subject("Weekly summary", &[]);
        if let Err(err) = self
            .notifier
            .notify("weekly_report", subject, html, 0, Utc::now())
            .await
        {
            tracing::error!(error = %err, "summary report alert failed");
        }

        tracing::info!(path = %path.display(), "summary report written");
        Ok(path)
    }

    fn write_report(
        &self,
        label: &str,
        html: &str,
        generated_at: chrono::DateTime<Utc>,
    ) -> Option<PathBuf> {
        let dir = self.data_dir.join("reports");
        let path = dir.join(format!(
            "{label}_{}.html",
            generated_at.format("%Y%m%d_%H%M%S")
        ));
        let write = fs::create_dir_all(&dir).and_then(|()| fs::write(&path, html));
        match write {
            Ok(()) => Some(path),
            Err(err) => {
                tracing::error!(error = %err, "report write failed");
                None
            }
        }
    }
}

//! Keyword ranking checks.
//!
//! For each tracked keyword the service fetches the configured results
//! page, reads the organic result links in rank order, and records the
//! 1-based position of every tracked domain (101 when absent from the
//! top 100). New observations are appended to the keyword's history
//! and diffed against the previous one; movements past the threshold
//! become ranking change records and flow through the notifier like
//! any other change.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scraper::{Html, Selector};

use crate::domain::detector::detect_ranking;
use crate::domain::{CheckCadence, ChangeRecord, KeywordSpec, NOT_FOUND_POSITION, RankingRecord};
use crate::error::MonitorError;
use crate::fetch::PageFetcher;
use crate::notify::Notifier;
use crate::persistence::RankingStore;
use crate::report::{alert_subject, render_alert_email};

/// Summary of one ranking check run.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    /// Keywords whose results page was fetched and parsed.
    pub keywords_checked: usize,

    /// Keywords whose fetch failed (logged, skipped).
    pub keywords_failed: usize,

    /// Ranking change records detected this run.
    pub changes: Vec<ChangeRecord>,
}

/// Orchestrates keyword position tracking.
#[derive(Debug)]
pub struct RankingService {
    fetcher: Arc<dyn PageFetcher>,
    store: RankingStore,
    notifier: Notifier,
    keywords: Vec<KeywordSpec>,
    domains: Vec<String>,
    threshold: u32,
    keyword_delay: Duration,
}

impl RankingService {
    /// Creates a ranking service tracking `domains` across `keywords`.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: RankingStore,
        notifier: Notifier,
        keywords: Vec<KeywordSpec>,
        domains: Vec<String>,
        threshold: u32,
        keyword_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            keywords,
            domains,
            threshold,
            keyword_delay,
        }
    }

    /// Runs one ranking check over the keywords of the given cadence.
    ///
    /// A keyword whose results page cannot be fetched is skipped; the
    /// remaining keywords are still checked.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; the `Result` mirrors the other
    /// run entry points so the scheduler treats all concerns alike.
    pub async fn run_check(&self, cadence: CheckCadence) -> Result<RankingOutcome, MonitorError> {
        let selected = self.keywords.iter().filter(|k| k.cadence == cadence).count();
        tracing::info!(keywords = selected, ?cadence, "ranking check started");

        let mut keywords_checked = 0_usize;
        let mut keywords_failed = 0_usize;
        let mut all_changes = Vec::new();

        let picked = self.keywords.iter().filter(|k| k.cadence == cadence);
        for (index, keyword) in picked.enumerate() {
            if index > 0 {
                tokio::time::sleep(self.keyword_delay).await;
            }

            let page = match self.fetcher.fetch(&keyword.search_url).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(
                        keyword = %keyword.keyword,
                        error = %err,
                        "results page fetch failed"
                    );
                    keywords_failed += 1;
                    continue;
                }
            };

            let checked_at = Utc::now();
            let positions = extract_positions(&page.html, &keyword.result_selector, &self.domains);

            let mut records = Vec::with_capacity(positions.len());
            for (domain, position) in positions {
                let record = RankingRecord {
                    keyword: keyword.keyword.clone(),
                    domain,
                    position,
                    checked_at,
                };
                let previous = match self.store.latest_for(&keyword.keyword, &record.domain) {
                    Ok(previous) => previous,
                    Err(err) => {
                        tracing::warn!(
                            keyword = %keyword.keyword,
                            error = %err,
                            "ranking history unreadable; diffing skipped"
                        );
                        None
                    }
                };
                if let Some(previous) = previous
                    && let Some(change) = detect_ranking(&previous, &record, self.threshold)
                {
                    all_changes.push(change);
                }
                records.push(record);
            }

            if let Err(err) = self.store.append(&keyword.keyword, &records) {
                tracing::error!(keyword = %keyword.keyword, error = %err, "ranking write failed");
            }
            keywords_checked += 1;
        }

        if !all_changes.is_empty() {
            let now = Utc::now();
            let subject = alert_subject("Ranking check", &all_changes);
            let body = render_alert_email("Ranking check", &all_changes, now);
            if let Err(err) = self
                .notifier
                .notify("ranking_check", subject, body, all_changes.len(), now)
                .await
            {
                tracing::error!(error = %err, "ranking alert failed");
            }
        }

        tracing::info!(
            keywords_checked,
            keywords_failed,
            changes = all_changes.len(),
            "ranking check complete"
        );

        Ok(RankingOutcome {
            keywords_checked,
            keywords_failed,
            changes: all_changes,
        })
    }
}

/// Reads the ordered organic result links from a results page and
/// returns each tracked domain's 1-based position, or
/// [`NOT_FOUND_POSITION`] when the domain is absent from the first 100
/// results. Best-effort substring matching on the href, as flagged in
/// the extraction heuristics.
#[must_use]
pub fn extract_positions(
    html: &str,
    result_selector: &str,
    domains: &[String],
) -> Vec<(String, u32)> {
    let hrefs = result_links(html, result_selector);

    domains
        .iter()
        .map(|domain| {
            let position = hrefs
                .iter()
                .take(100)
                .position(|href| href.contains(domain.as_str()))
                .map_or(NOT_FOUND_POSITION, |index| (index as u32) + 1);
            (domain.clone(), position)
        })
        .collect()
}

fn result_links(html: &str, result_selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(result_selector) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::fetch::FetchedPage;
    use crate::notify::{AlertQueue, EmailMessage, Mailer};
    use crate::persistence::AlertHistory;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SERP: &str = r#"<html><body><ol>
        <li><a class="result" href="https://rival.com/dental">Rival</a></li>
        <li><a class="result" href="https://news.example.com/story">News</a></li>
        <li><a class="result" href="https://acmedental.com/pricing">Acme</a></li>
    </ol></body></html>"#;

    #[test]
    fn positions_are_one_based_in_result_order() {
        let domains = vec!["acmedental.com".to_string(), "rival.com".to_string()];
        let positions = extract_positions(SERP, "a.result", &domains);
        assert_eq!(
            positions,
            vec![("acmedental.com".to_string(), 3), ("rival.com".to_string(), 1)]
        );
    }

    #[test]
    fn absent_domain_gets_not_found_sentinel() {
        let domains = vec!["missing.com".to_string()];
        let positions = extract_positions(SERP, "a.result", &domains);
        assert_eq!(positions, vec![("missing.com".to_string(), NOT_FOUND_POSITION)]);
    }

    #[test]
    fn bad_selector_means_every_domain_is_not_found() {
        let domains = vec!["acmedental.com".to_string()];
        let positions = extract_positions(SERP, ":::nope", &domains);
        assert_eq!(
            positions,
            vec![("acmedental.com".to_string(), NOT_FOUND_POSITION)]
        );
    }

    #[derive(Debug)]
    struct SerpFetcher {
        body: String,
    }

    #[async_trait]
    impl PageFetcher for SerpFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage, MonitorError> {
            Ok(FetchedPage::from_html(self.body.clone()))
        }
    }

    #[derive(Debug, Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), MonitorError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(message.clone());
            }
            Ok(())
        }
    }

    fn service(dir: &tempfile::TempDir, body: &str) -> (Arc<RecordingMailer>, RankingService) {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            AlertHistory::new(dir.path().join("history.json")),
            AlertQueue::new(dir.path().join("queue")),
            vec!["ops@example.com".to_string()],
            10,
        );
        let service = RankingService::new(
            Arc::new(SerpFetcher {
                body: body.to_string(),
            }),
            RankingStore::new(dir.path().join("rankings")),
            notifier,
            vec![KeywordSpec {
                keyword: "dental software".to_string(),
                search_url: "https://search.example.com/?q=dental+software".to_string(),
                result_selector: "a.result".to_string(),
                cadence: CheckCadence::Daily,
            }],
            vec!["acmedental.com".to_string()],
            3,
            Duration::ZERO,
        );
        (mailer, service)
    }

    #[tokio::test]
    async fn first_check_records_history_without_changes() {
        let dir = tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir should be creatable");
        });
        let (mailer, service) = service(&dir, SERP);

        let outcome = service.run_check(CheckCadence::Daily).await;
        let Ok(outcome) = outcome else {
            panic!("check should succeed");
        };
        assert_eq!(outcome.keywords_checked, 1);
        assert!(outcome.changes.is_empty());

        let sent = mailer.sent.lock().map(|s| s.len()).unwrap_or_default();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn falling_out_of_results_emits_major_change() {
        let dir = tempfile::tempdir().ok().unwrap_or_else(|| {
            panic!("tempdir should be creatable");
        });

        {
            let (_mailer, service) = service(&dir, SERP);
            let _ = service.run_check(CheckCadence::Daily).await;
        }

        // Second check: acmedental.com vanished from the results.
        let empty_serp = "<html><body><ol></ol></body></html>";
        let (mailer, service) = service(&dir, empty_serp);
        let outcome = service.run_check(CheckCadence::Daily).await;
        let Ok(outcome) = outcome else {
            panic!("check should succeed");
        };

        assert_eq!(outcome.changes.len(), 1);
        let Some(ChangeRecord::RankingChange { new_position, delta, .. }) =
            outcome.changes.first()
        else {
            panic!("expected a ranking change");
        };
        assert_eq!(*new_position, NOT_FOUND_POSITION);
        assert_eq!(*delta, -98);

        let sent = mailer.sent.lock().map(|s| s.len()).unwrap_or_default();
        assert_eq!(sent, 1);
    }
}

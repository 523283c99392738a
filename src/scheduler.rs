//! Interval scheduling with per-concern overlap guards.
//!
//! Each concern (competitor scan, daily and weekly ranking checks,
//! summary report, snapshot cleanup, queue drain) runs on its own
//! fixed interval. A tick that arrives while the previous run of the
//! same concern is still in flight is skipped and logged, never
//! queued: scans share a single fetcher handle and are not safe to
//! overlap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::app_state::AppState;
use crate::domain::CheckCadence;

/// Spawns and owns the periodic concern tasks.
#[derive(Debug)]
pub struct Scheduler {
    state: AppState,
}

impl Scheduler {
    /// Creates a scheduler over the shared state.
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Spawns one task per concern and returns their handles. The
    /// tasks run until the process exits; handles are returned so the
    /// caller can abort them on shutdown if it wants to.
    #[must_use]
    pub fn spawn_all(&self) -> Vec<JoinHandle<()>> {
        let config = Arc::clone(&self.state.config);

        let scan = {
            let service = Arc::clone(&self.state.scan_service);
            spawn_concern("competitor_scan", config.scan_interval_secs, move || {
                let service = Arc::clone(&service);
                async move {
                    if let Err(err) = service.run_scan().await {
                        tracing::error!(error = %err, "competitor scan failed");
                    }
                }
            })
        };

        let ranking_daily = {
            let service = Arc::clone(&self.state.ranking_service);
            spawn_concern("ranking_check_daily", config.ranking_interval_secs, move || {
                let service = Arc::clone(&service);
                async move {
                    if let Err(err) = service.run_check(CheckCadence::Daily).await {
                        tracing::error!(error = %err, "daily ranking check failed");
                    }
                }
            })
        };

        let ranking_weekly = {
            let service = Arc::clone(&self.state.ranking_service);
            spawn_concern(
                "ranking_check_weekly",
                config.ranking_weekly_interval_secs,
                move || {
                    let service = Arc::clone(&service);
                    async move {
                        if let Err(err) = service.run_check(CheckCadence::Weekly).await {
                            tracing::error!(error = %err, "weekly ranking check failed");
                        }
                    }
                },
            )
        };

        let report = {
            let service = Arc::clone(&self.state.scan_service);
            spawn_concern("summary_report", config.report_interval_secs, move || {
                let service = Arc::clone(&service);
                async move {
                    if let Err(err) = service.run_report().await {
                        tracing::error!(error = %err, "summary report failed");
                    }
                }
            })
        };

        let cleanup = {
            let store = self.state.snapshot_store.clone();
            let max_age = chrono::Duration::days(
                i64::try_from(config.snapshot_max_age_days).unwrap_or(i64::MAX),
            );
            let keep_recent = config.snapshot_keep_recent;
            spawn_concern("snapshot_cleanup", config.cleanup_interval_secs, move || {
                let store = store.clone();
                async move {
                    match store.cleanup(Utc::now(), max_age, keep_recent) {
                        Ok(deleted) => {
                            tracing::info!(deleted, "snapshot cleanup complete");
                        }
                        Err(err) => tracing::error!(error = %err, "snapshot cleanup failed"),
                    }
                }
            })
        };

        let drain = {
            let notifier = self.state.notifier.clone();
            spawn_concern("queue_drain", config.queue_drain_interval_secs, move || {
                let notifier = notifier.clone();
                async move {
                    if let Err(err) = notifier.drain(Utc::now()).await {
                        tracing::error!(error = %err, "alert queue drain failed");
                    }
                }
            })
        };

        vec![scan, ranking_daily, ranking_weekly, report, cleanup, drain]
    }
}

fn spawn_concern<F, Fut>(name: &'static str, interval_secs: u64, run: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let guard = Arc::new(Mutex::new(()));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            // Each run is its own task so the next tick still fires on
            // schedule; an in-flight run makes that tick a logged skip,
            // not a queued one.
            let guard = Arc::clone(&guard);
            let fut = run();
            tokio::spawn(async move {
                run_guarded(name, &guard, fut).await;
            });
        }
    })
}

/// Runs `fut` under the concern's overlap guard. Returns `false` (and
/// logs the skip) when a previous run still holds the guard.
async fn run_guarded<Fut>(name: &'static str, guard: &Arc<Mutex<()>>, fut: Fut) -> bool
where
    Fut: Future<Output = ()>,
{
    match guard.try_lock() {
        Ok(_held) => {
            tracing::debug!(concern = name, "run started");
            fut.await;
            true
        }
        Err(_) => {
            tracing::warn!(concern = name, "skipped; previous run still in flight");
            false
        }
    }
}

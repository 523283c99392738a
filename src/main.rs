//! sitewatch daemon entry point.
//!
//! Loads configuration and targets, wires the pipeline layers, and
//! hands control to the interval scheduler until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use sitewatch::app_state::AppState;
use sitewatch::config::{self, MonitorConfig};
use sitewatch::fetch::PageFetcher;
use sitewatch::notify::{AlertQueue, HttpRelayMailer, LogMailer, Mailer, Notifier};
use sitewatch::persistence::{AlertHistory, RankingStore, SnapshotStore};
use sitewatch::scheduler::Scheduler;
use sitewatch::service::{RankingService, ScanService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration and targets
    let config = MonitorConfig::from_env()?;
    let targets_file = config::load_targets(&config.targets_file)?;
    tracing::info!(
        targets = targets_file.targets.len(),
        keywords = targets_file.keywords.len(),
        data_dir = %config.data_dir.display(),
        "starting sitewatch"
    );

    // Build the fetch boundary
    let fetcher = build_fetcher(&config)?;

    // Build the alerting layer
    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.fetch_timeout_secs))
                .build()?;
            Arc::new(HttpRelayMailer::new(client, url.clone()))
        }
        None => Arc::new(LogMailer),
    };
    let notifier = Notifier::new(
        mailer,
        AlertHistory::new(config.data_dir.join("alerts").join("history.json")),
        AlertQueue::new(config.data_dir.join("alerts").join("queue")),
        config.mail_recipients.clone(),
        config.max_alerts_per_hour,
    );

    // Build the persistence and service layers
    let snapshot_store = SnapshotStore::new(config.data_dir.join("snapshots"));
    let domains: Vec<String> = targets_file.targets.iter().map(|t| t.domain.clone()).collect();

    let scan_service = Arc::new(ScanService::new(
        Arc::clone(&fetcher),
        snapshot_store.clone(),
        notifier.clone(),
        targets_file.targets,
        config.data_dir.clone(),
        Duration::from_secs(config.page_delay_secs),
        Duration::from_secs(config.target_delay_secs),
    ));

    let ranking_service = Arc::new(RankingService::new(
        fetcher,
        RankingStore::new(config.data_dir.join("rankings")),
        notifier.clone(),
        targets_file.keywords,
        domains,
        config.ranking_change_threshold,
        Duration::from_secs(config.target_delay_secs),
    ));

    // Run the scheduler until interrupted
    let state = AppState {
        config: Arc::new(config),
        scan_service,
        ranking_service,
        notifier,
        snapshot_store,
    };
    let handles = Scheduler::new(state).spawn_all();
    tracing::info!(concerns = handles.len(), "scheduler running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    for handle in handles {
        handle.abort();
    }

    Ok(())
}

#[cfg(not(feature = "headless"))]
fn build_fetcher(config: &MonitorConfig) -> anyhow::Result<Arc<dyn PageFetcher>> {
    let fetcher = sitewatch::fetch::HttpFetcher::new(
        Duration::from_secs(config.fetch_timeout_secs),
        &config.user_agent,
    )?;
    Ok(Arc::new(fetcher))
}

#[cfg(feature = "headless")]
fn build_fetcher(config: &MonitorConfig) -> anyhow::Result<Arc<dyn PageFetcher>> {
    let fetcher = sitewatch::fetch::browser::BrowserFetcher::launch(
        Duration::from_secs(config.render_wait_secs),
        config.capture_screenshots,
    )?;
    Ok(Arc::new(fetcher))
}

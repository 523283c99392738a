//! Monitor configuration.
//!
//! Follows 12-factor style: all tunables come from environment
//! variables (or a `.env` file via `dotenvy`). The monitored targets
//! themselves are structured data and live in a JSON file referenced
//! by `TARGETS_FILE`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{KeywordSpec, Target};
use crate::error::MonitorError;

/// Top-level monitor configuration.
///
/// Loaded once at startup via [`MonitorConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Root directory for snapshots, rankings, alerts, screenshots,
    /// and reports.
    pub data_dir: PathBuf,

    /// Path of the targets JSON file.
    pub targets_file: PathBuf,

    /// Per-page fetch timeout in seconds.
    pub fetch_timeout_secs: u64,

    /// User agent sent with every fetch.
    pub user_agent: String,

    /// Fixed delay between pages of the same target, in seconds.
    pub page_delay_secs: u64,

    /// Fixed delay between targets, in seconds.
    pub target_delay_secs: u64,

    /// Seconds between competitor scans.
    pub scan_interval_secs: u64,

    /// Seconds between daily-cadence keyword ranking checks.
    pub ranking_interval_secs: u64,

    /// Seconds between weekly-cadence keyword ranking checks.
    pub ranking_weekly_interval_secs: u64,

    /// Seconds between summary reports.
    pub report_interval_secs: u64,

    /// Seconds between snapshot cleanup passes.
    pub cleanup_interval_secs: u64,

    /// Seconds between alert queue drain passes.
    pub queue_drain_interval_secs: u64,

    /// Delete snapshot records older than this many days.
    pub snapshot_max_age_days: u64,

    /// Always keep this many recent records per (target, page).
    pub snapshot_keep_recent: usize,

    /// Alert sends allowed per rolling hour.
    pub max_alerts_per_hour: usize,

    /// Minimum absolute ranking delta that emits a change record.
    pub ranking_change_threshold: u32,

    /// HTTP mail relay endpoint. Alerts are logged but not sent when
    /// unset.
    pub mail_relay_url: Option<String>,

    /// Alert recipient addresses.
    pub mail_recipients: Vec<String>,

    /// Capture screenshots during scans (`headless` builds only).
    pub capture_screenshots: bool,

    /// Post-navigation render wait for the browser fetcher, in seconds.
    pub render_wait_secs: u64,
}

impl MonitorConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Never fails today; the `Result` keeps the signature stable for
    /// validation added at the call boundary.
    pub fn from_env() -> Result<Self, MonitorError> {
        dotenvy::dotenv().ok();

        let data_dir = PathBuf::from(
            std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
        );
        let targets_file = PathBuf::from(
            std::env::var("TARGETS_FILE").unwrap_or_else(|_| "./targets.json".to_string()),
        );

        let user_agent = std::env::var("USER_AGENT").unwrap_or_else(|_| {
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
             Chrome/122.0.0.0 Safari/537.36"
                .to_string()
        });

        let mail_relay_url = std::env::var("MAIL_RELAY_URL").ok().filter(|v| !v.is_empty());
        let mail_recipients =
            parse_recipients(&std::env::var("MAIL_RECIPIENTS").unwrap_or_default());

        Ok(Self {
            data_dir,
            targets_file,
            fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECS", 15),
            user_agent,
            page_delay_secs: parse_env("PAGE_DELAY_SECS", 3),
            target_delay_secs: parse_env("TARGET_DELAY_SECS", 5),
            scan_interval_secs: parse_env("SCAN_INTERVAL_SECS", 21_600),
            ranking_interval_secs: parse_env("RANKING_INTERVAL_SECS", 86_400),
            ranking_weekly_interval_secs: parse_env("RANKING_WEEKLY_INTERVAL_SECS", 604_800),
            report_interval_secs: parse_env("REPORT_INTERVAL_SECS", 604_800),
            cleanup_interval_secs: parse_env("CLEANUP_INTERVAL_SECS", 86_400),
            queue_drain_interval_secs: parse_env("QUEUE_DRAIN_INTERVAL_SECS", 900),
            snapshot_max_age_days: parse_env("SNAPSHOT_MAX_AGE_DAYS", 30),
            snapshot_keep_recent: parse_env("SNAPSHOT_KEEP_RECENT", 10),
            max_alerts_per_hour: parse_env("MAX_ALERTS_PER_HOUR", 5),
            ranking_change_threshold: parse_env("RANKING_CHANGE_THRESHOLD", 3),
            mail_relay_url,
            mail_recipients,
            capture_screenshots: parse_env_bool("CAPTURE_SCREENSHOTS", false),
            render_wait_secs: parse_env("RENDER_WAIT_SECS", 3),
        })
    }
}

/// Static target and keyword definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsFile {
    /// Monitored competitors.
    #[serde(default)]
    pub targets: Vec<Target>,

    /// Tracked search keywords.
    #[serde(default)]
    pub keywords: Vec<KeywordSpec>,
}

/// Loads the targets file.
///
/// # Errors
///
/// Returns [`MonitorError::InvalidConfig`] when the file is missing or
/// not valid JSON — targets are required input, so unlike snapshots
/// there is no empty-state fallback.
pub fn load_targets(path: &Path) -> Result<TargetsFile, MonitorError> {
    let bytes = std::fs::read(path).map_err(|err| {
        MonitorError::InvalidConfig(format!("cannot read {}: {err}", path.display()))
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        MonitorError::InvalidConfig(format!("cannot parse {}: {err}", path.display()))
    })
}

/// Parses an environment variable as `T`, returning `default` on
/// missing or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}

fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

//! Monitor error types.
//!
//! [`MonitorError`] is the central error type for the pipeline. Each
//! variant corresponds to one failure class from the error taxonomy:
//! fetch, parse, persistence, and notification failures are all
//! recovered locally by their callers — nothing here is expected to
//! bring down the scheduler process.

/// Pipeline-wide error enum.
///
/// # Failure classes
///
/// | Variant group | Recovery |
/// |---|---|
/// | `Fetch` / `HttpStatus` / `Timeout` / `Browser` | recorded on the page's snapshot, scan continues |
/// | `Parse` | field treated as absent |
/// | `Persistence` | logged, fatal to that step only |
/// | `Notification` | logged, alert falls back to the disk queue |
/// | `InvalidConfig` | fatal at startup |
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Network-level fetch failure (connection, DNS, TLS).
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The target responded with a non-2xx status.
    #[error("unexpected status {status} from {url}")]
    HttpStatus {
        /// HTTP status code returned by the target.
        status: u16,
        /// URL that was fetched.
        url: String,
    },

    /// The per-page fetch timeout elapsed.
    #[error("timed out fetching {url}")]
    Timeout {
        /// URL that was being fetched.
        url: String,
    },

    /// Headless browser automation failure.
    #[cfg(feature = "headless")]
    #[error("browser error: {0}")]
    Browser(String),

    /// Selector, regex, or document parse failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Disk read/write or serialization failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Outbound notification (mail relay) failure.
    #[error("notification error: {0}")]
    Notification(String),

    /// Configuration could not be loaded or validated.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MonitorError {
    /// Returns the failure class as a static string for logs and alert
    /// tagging.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::HttpStatus { .. } => "http_status",
            Self::Timeout { .. } => "timeout",
            #[cfg(feature = "headless")]
            Self::Browser(_) => "browser",
            Self::Parse(_) => "parse",
            Self::Persistence(_) => "persistence",
            Self::Notification(_) => "notification",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Returns `true` when the failure belongs to the fetch class and
    /// should be recorded on the page's snapshot rather than propagated.
    #[must_use]
    pub const fn is_fetch_class(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::HttpStatus { .. } | Self::Timeout { .. } => true,
            #[cfg(feature = "headless")]
            Self::Browser(_) => true,
            _ => false,
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn kind_str_matches_variant() {
        let err = MonitorError::Parse("bad selector".to_string());
        assert_eq!(err.kind_str(), "parse");

        let err = MonitorError::HttpStatus {
            status: 503,
            url: "https://example.com/pricing".to_string(),
        };
        assert_eq!(err.kind_str(), "http_status");
    }

    #[test]
    fn fetch_class_covers_network_failures() {
        let err = MonitorError::Timeout {
            url: "https://example.com".to_string(),
        };
        assert!(err.is_fetch_class());

        let err = MonitorError::Persistence("disk full".to_string());
        assert!(!err.is_fetch_class());
    }

    #[test]
    fn io_errors_map_to_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MonitorError::from(io);
        assert_eq!(err.kind_str(), "persistence");
    }

    #[test]
    fn display_includes_url() {
        let err = MonitorError::HttpStatus {
            status: 404,
            url: "https://example.com/blog".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("https://example.com/blog"));
    }
}

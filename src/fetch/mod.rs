//! Page fetching boundary.
//!
//! [`PageFetcher`] abstracts over how a target page becomes an HTML
//! string: plain HTTP ([`HttpFetcher`]) or a rendered DOM from a
//! headless browser ([`browser::BrowserFetcher`], behind the
//! `headless` feature). The pipeline holds a single fetcher handle and
//! drives it sequentially; implementations are not expected to be
//! called concurrently for the same scan.
//!
//! There is no retry policy here. A failed page is recorded on that
//! page's snapshot by the caller and the scan moves on.

pub mod http;

#[cfg(feature = "headless")]
pub mod browser;

use async_trait::async_trait;

use crate::error::MonitorError;

pub use http::HttpFetcher;

/// Rendered result of fetching one page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Page HTML (raw body or rendered DOM, depending on the fetcher).
    pub html: String,

    /// PNG screenshot bytes, when the fetcher captures them.
    pub screenshot: Option<Vec<u8>>,
}

impl FetchedPage {
    /// Wraps plain HTML with no screenshot.
    #[must_use]
    pub const fn from_html(html: String) -> Self {
        Self {
            html,
            screenshot: None,
        }
    }
}

/// Boundary trait for page retrieval.
#[async_trait]
pub trait PageFetcher: Send + Sync + std::fmt::Debug {
    /// Fetches the page at `url`.
    ///
    /// # Errors
    ///
    /// Returns a fetch-class [`MonitorError`] on network failure,
    /// timeout, or a non-2xx response.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, MonitorError>;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CannedFetcher;

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage, MonitorError> {
            Ok(FetchedPage::from_html("<html></html>".to_string()))
        }
    }

    #[tokio::test]
    async fn fetcher_is_object_safe() {
        let fetcher: std::sync::Arc<dyn PageFetcher> = std::sync::Arc::new(CannedFetcher);
        let page = fetcher.fetch("https://example.com").await;
        let Ok(page) = page else {
            panic!("canned fetch should succeed");
        };
        assert!(page.screenshot.is_none());
        assert_eq!(page.html, "<html></html>");
    }
}

//! Headless-browser fetcher (`headless` feature).
//!
//! Drives a single shared Chromium instance to load pages that need
//! client-side rendering and, optionally, to capture screenshots. The
//! browser handle is cheap to clone (it wraps an `Arc`) but must only
//! be used by one scan at a time; the scheduler's overlap guard
//! enforces that.

use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions};

use super::{FetchedPage, PageFetcher};
use crate::error::MonitorError;

/// Fetcher backed by a headless Chromium tab.
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Browser,
    render_wait: Duration,
    capture_screenshots: bool,
}

impl std::fmt::Debug for BrowserFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserFetcher")
            .field("render_wait", &self.render_wait)
            .field("capture_screenshots", &self.capture_screenshots)
            .finish_non_exhaustive()
    }
}

impl BrowserFetcher {
    /// Launches the headless browser.
    ///
    /// `render_wait` is the fixed pause after navigation before the DOM
    /// is read, giving client-side rendering a chance to settle.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Browser`] when Chromium cannot be
    /// launched.
    pub fn launch(
        render_wait: Duration,
        capture_screenshots: bool,
    ) -> Result<Self, MonitorError> {
        let options = LaunchOptions {
            headless: true,
            ..Default::default()
        };
        let browser =
            Browser::new(options).map_err(|err| MonitorError::Browser(err.to_string()))?;
        Ok(Self {
            browser,
            render_wait,
            capture_screenshots,
        })
    }

    fn fetch_blocking(&self, url: &str) -> Result<FetchedPage, MonitorError> {
        let browser_err = |err: anyhow::Error| MonitorError::Browser(err.to_string());

        let tab = self.browser.new_tab().map_err(browser_err)?;
        tab.navigate_to(url).map_err(browser_err)?;
        tab.wait_until_navigated().map_err(browser_err)?;
        std::thread::sleep(self.render_wait);

        let html = tab.get_content().map_err(browser_err)?;

        let screenshot = if self.capture_screenshots {
            tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map(Some)
                .map_err(browser_err)?
        } else {
            None
        };

        // Tab stays open otherwise; the browser instance is long-lived.
        let _ = tab.close(true);

        Ok(FetchedPage { html, screenshot })
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, MonitorError> {
        let fetcher = self.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || fetcher.fetch_blocking(&url))
            .await
            .map_err(|err| MonitorError::Browser(err.to_string()))?
    }
}

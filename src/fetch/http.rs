//! Plain HTTP fetcher.

use std::time::Duration;

use async_trait::async_trait;

use super::{FetchedPage, PageFetcher};
use crate::error::MonitorError;

/// Fetches pages with a shared [`reqwest::Client`].
///
/// Applies a per-request timeout and a fixed user agent. Never
/// captures screenshots; when screenshots are wanted, build the
/// `headless` feature and use the browser fetcher instead.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the given per-request timeout and user
    /// agent.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Fetch`] if the client cannot be
    /// constructed (TLS backend initialization, invalid user agent).
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, MonitorError> {
        let response = self.client.get(url).send().await.map_err(|err| {
            if err.is_timeout() {
                MonitorError::Timeout {
                    url: url.to_string(),
                }
            } else {
                MonitorError::Fetch(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await.map_err(MonitorError::Fetch)?;
        Ok(FetchedPage::from_html(html))
    }
}

//! Alerting: mail boundary, rate limiting, and the disk-backed queue.
//!
//! Delivery itself is a collaborator at the system boundary: the
//! [`Mailer`] trait takes a finished [`EmailMessage`] and either
//! delivers it or fails. [`Notifier`] wires the mailer to the rolling
//! rate limiter and the on-disk queue: capacity available means send
//! and record, capacity exhausted means queue to disk, and the drain
//! pass replays queued alerts FIFO until the limiter refuses again.

pub mod queue;
pub mod rate_limit;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;
use crate::persistence::AlertHistory;

pub use queue::{AlertQueue, QueuedAlert};
pub use rate_limit::RateLimiter;

/// Outbound email at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Subject line, severity-tagged with an emoji prefix by the caller.
    pub subject: String,

    /// Self-contained HTML body.
    pub html_body: String,

    /// Recipient addresses.
    pub recipients: Vec<String>,
}

/// Mail transport boundary.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    /// Delivers the message.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Notification`] when delivery fails.
    async fn send(&self, message: &EmailMessage) -> Result<(), MonitorError>;
}

/// Mailer that POSTs the message as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct HttpRelayMailer {
    client: reqwest::Client,
    relay_url: String,
}

impl HttpRelayMailer {
    /// Creates a mailer for the given relay endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, relay_url: String) -> Self {
        Self { client, relay_url }
    }
}

#[async_trait]
impl Mailer for HttpRelayMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MonitorError> {
        self.client
            .post(&self.relay_url)
            .json(message)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| MonitorError::Notification(err.to_string()))?;
        Ok(())
    }
}

/// Mailer used when no relay is configured: logs the subject and
/// drops the message. The missing email is the operator's signal that
/// delivery is not set up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MonitorError> {
        tracing::info!(subject = %message.subject, "no mail relay configured; alert logged only");
        Ok(())
    }
}

/// What [`Notifier::notify`] did with an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Delivered and recorded in the alert history.
    Sent,
    /// Rate limit reached; persisted to the disk queue.
    Queued,
}

/// Queued alert payload: everything needed to replay the email later.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueuedEmail {
    subject: String,
    html_body: String,
    change_count: usize,
}

/// Rate-limited, queue-backed alert sender.
#[derive(Debug, Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    history: AlertHistory,
    queue: AlertQueue,
    recipients: Vec<String>,
    max_per_hour: usize,
}

impl Notifier {
    /// Creates a notifier.
    #[must_use]
    pub fn new(
        mailer: Arc<dyn Mailer>,
        history: AlertHistory,
        queue: AlertQueue,
        recipients: Vec<String>,
        max_per_hour: usize,
    ) -> Self {
        Self {
            mailer,
            history,
            queue,
            recipients,
            max_per_hour,
        }
    }

    fn limiter_at(&self, now: DateTime<Utc>) -> Result<RateLimiter, MonitorError> {
        let sends = self.history.send_times_since(now, Duration::hours(1))?;
        Ok(RateLimiter::from_history(sends, self.max_per_hour))
    }

    /// Sends an alert, or queues it when the hourly cap is reached.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Notification`] when delivery fails
    /// (queued alerts are untouched by a failed direct send) and
    /// [`MonitorError::Persistence`] when history/queue I/O fails.
    pub async fn notify(
        &self,
        kind: &str,
        subject: String,
        html_body: String,
        change_count: usize,
        now: DateTime<Utc>,
    ) -> Result<NotifyOutcome, MonitorError> {
        let limiter = self.limiter_at(now)?;
        if !limiter.can_send(now) {
            let payload = serde_json::to_value(QueuedEmail {
                subject,
                html_body,
                change_count,
            })?;
            let path = self.queue.enqueue(kind, payload, now)?;
            tracing::warn!(kind, path = %path.display(), "alert rate limit reached; queued");
            return Ok(NotifyOutcome::Queued);
        }

        let message = EmailMessage {
            subject,
            html_body,
            recipients: self.recipients.clone(),
        };
        self.mailer.send(&message).await?;
        self.history.record(kind, change_count, now)?;
        tracing::info!(kind, change_count, "alert sent");
        Ok(NotifyOutcome::Sent)
    }

    /// Replays queued alerts in FIFO order until the rate limiter
    /// refuses or the queue is empty. Returns the number sent.
    ///
    /// A malformed queue file is skipped and left on disk; a delivery
    /// failure stops the drain so order is preserved for the next pass.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Notification`] on delivery failure and
    /// [`MonitorError::Persistence`] on history/queue I/O failure.
    pub async fn drain(&self, now: DateTime<Utc>) -> Result<usize, MonitorError> {
        let mut limiter = self.limiter_at(now)?;
        let mut sent = 0_usize;

        for (path, alert) in self.queue.entries()? {
            if !limiter.can_send(now) {
                break;
            }
            let Ok(payload) = serde_json::from_value::<QueuedEmail>(alert.data.clone()) else {
                tracing::warn!(path = %path.display(), "malformed queued alert; skipping");
                continue;
            };
            let message = EmailMessage {
                subject: payload.subject,
                html_body: payload.html_body,
                recipients: self.recipients.clone(),
            };
            self.mailer.send(&message).await?;
            self.history.record(&alert.kind, payload.change_count, now)?;
            limiter.record(now);
            self.queue.remove(&path)?;
            sent += 1;
        }

        if sent > 0 {
            tracing::info!(sent, "drained queued alerts");
        }
        Ok(sent)
    }

    /// Read-only view of the alert queue, for status logging.
    #[must_use]
    pub const fn queue(&self) -> &AlertQueue {
        &self.queue
    }
}

//! Chat notification sinks.
//!
//! # Data Flow
//! ```text
//! Dispatcher picks a severity
//!     → Notifier::{good, warning, danger, message}
//!     → provider payload (slack.rs / discord.rs)
//!     → one webhook POST, bounded by timeouts.webhook_secs
//! ```
//!
//! # Design Decisions
//! - One trait method per severity; each provider maps it to its own marker
//! - No retry: a failed POST is reported to the caller and dropped

pub mod discord;
pub mod slack;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use url::Url;

pub use discord::DiscordNotifier;
pub use slack::SlackNotifier;

/// Notification class derived from a health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Good,
    Warning,
    Danger,
    Message,
}

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid webhook url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// A chat destination.
///
/// Each method renders `message` with the provider's marker for that
/// severity and performs a single webhook POST.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &str;

    async fn good(&self, message: &str) -> NotifyResult<()>;

    async fn warning(&self, message: &str) -> NotifyResult<()>;

    async fn danger(&self, message: &str) -> NotifyResult<()>;

    async fn message(&self, message: &str) -> NotifyResult<()>;
}

/// POST `payload` as JSON and map non-2xx answers to an error.
pub(crate) async fn post_webhook<T: Serialize + ?Sized>(
    http: &reqwest::Client,
    url: &Url,
    payload: &T,
) -> NotifyResult<()> {
    let response = http.post(url.clone()).json(payload).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NotifyError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }
    Ok(())
}

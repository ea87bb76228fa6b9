//! Slack incoming-webhook sink.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::{SlackConfig, TimeoutConfig};
use crate::notify::{post_webhook, Notifier, NotifyResult};

#[derive(Debug, Serialize)]
struct SlackPayload<'a> {
    username: &'a str,
    icon_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment<'a>>,
}

#[derive(Debug, Serialize)]
struct Attachment<'a> {
    color: &'static str,
    text: &'a str,
    fallback: &'a str,
}

/// Posts to a Slack incoming webhook as a configurable bot user.
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: Url,
    username: String,
    icon_url: String,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig, timeouts: &TimeoutConfig) -> NotifyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.webhook_secs))
            .build()?;

        Ok(Self {
            http,
            webhook_url: Url::parse(&config.webhook_url)?,
            username: config.username.clone(),
            icon_url: config.icon_url.clone(),
        })
    }

    fn payload<'a>(&'a self, color: Option<&'static str>, message: &'a str) -> SlackPayload<'a> {
        match color {
            Some(color) => SlackPayload {
                username: &self.username,
                icon_url: &self.icon_url,
                text: None,
                attachments: vec![Attachment {
                    color,
                    text: message,
                    fallback: message,
                }],
            },
            None => SlackPayload {
                username: &self.username,
                icon_url: &self.icon_url,
                text: Some(message),
                attachments: Vec::new(),
            },
        }
    }

    async fn send(&self, color: Option<&'static str>, message: &str) -> NotifyResult<()> {
        post_webhook(&self.http, &self.webhook_url, &self.payload(color, message)).await
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn good(&self, message: &str) -> NotifyResult<()> {
        self.send(Some("good"), message).await
    }

    async fn warning(&self, message: &str) -> NotifyResult<()> {
        self.send(Some("warning"), message).await
    }

    async fn danger(&self, message: &str) -> NotifyResult<()> {
        self.send(Some("danger"), message).await
    }

    async fn message(&self, message: &str) -> NotifyResult<()> {
        self.send(None, message).await
    }
}

//! Discord webhook sink.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::{DiscordConfig, TimeoutConfig};
use crate::notify::{post_webhook, Notifier, NotifyResult};

pub const COLOR_GOOD: u32 = 0x2ECC71;
pub const COLOR_WARNING: u32 = 0xF1C40F;
pub const COLOR_DANGER: u32 = 0xE74C3C;

/// Discord rejects longer `content` fields.
const MAX_CONTENT_CHARS: usize = 2000;
/// Discord rejects longer embed descriptions.
const MAX_DESCRIPTION_CHARS: usize = 4096;

#[derive(Debug, Serialize)]
struct DiscordPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    description: &'a str,
    color: u32,
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Posts to a Discord channel webhook.
pub struct DiscordNotifier {
    http: reqwest::Client,
    webhook_url: Url,
    username: Option<String>,
    avatar_url: Option<String>,
}

impl DiscordNotifier {
    pub fn new(config: &DiscordConfig, timeouts: &TimeoutConfig) -> NotifyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.webhook_secs))
            .build()?;

        Ok(Self {
            http,
            webhook_url: Url::parse(&config.webhook_url)?,
            username: config.username.clone(),
            avatar_url: config.avatar_url.clone(),
        })
    }

    fn payload<'a>(&'a self, color: Option<u32>, message: &'a str) -> DiscordPayload<'a> {
        let mut payload = DiscordPayload {
            username: self.username.as_deref(),
            avatar_url: self.avatar_url.as_deref(),
            content: None,
            embeds: Vec::new(),
        };

        match color {
            Some(color) => payload.embeds.push(Embed {
                description: truncate(message, MAX_DESCRIPTION_CHARS),
                color,
            }),
            None => payload.content = Some(truncate(message, MAX_CONTENT_CHARS)),
        }
        payload
    }

    async fn send(&self, color: Option<u32>, message: &str) -> NotifyResult<()> {
        post_webhook(&self.http, &self.webhook_url, &self.payload(color, message)).await
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn good(&self, message: &str) -> NotifyResult<()> {
        self.send(Some(COLOR_GOOD), message).await
    }

    async fn warning(&self, message: &str) -> NotifyResult<()> {
        self.send(Some(COLOR_WARNING), message).await
    }

    async fn danger(&self, message: &str) -> NotifyResult<()> {
        self.send(Some(COLOR_DANGER), message).await
    }

    async fn message(&self, message: &str) -> NotifyResult<()> {
        self.send(None, message).await
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default Slack avatar shown next to bridge messages.
pub const DEFAULT_SLACK_ICON: &str = "https://www.consul.io/assets/images/logo_large-475cebb0.png";

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Slack incoming-webhook settings.
    pub slack: SlackConfig,

    /// Discord webhook settings.
    pub discord: DiscordConfig,

    /// Consul agent connection and watch settings.
    pub consul: ConsulConfig,

    /// Liveness endpoint settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Watch retry configuration.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Slack sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Incoming webhook URL.
    pub webhook_url: String,

    /// Display name for posted messages.
    pub username: String,

    /// Avatar URL for posted messages.
    pub icon_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            username: "Consul".to_string(),
            icon_url: DEFAULT_SLACK_ICON.to_string(),
        }
    }
}

/// Discord sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DiscordConfig {
    /// Webhook URL.
    pub webhook_url: String,

    /// Overrides the webhook's default display name.
    pub username: Option<String>,

    /// Overrides the webhook's default avatar.
    pub avatar_url: Option<String>,
}

/// Consul connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsulConfig {
    /// Agent address (e.g., "127.0.0.1:8500").
    pub address: String,

    /// URI scheme, `http` or `https`.
    pub scheme: String,

    /// Datacenter to watch.
    pub datacenter: String,

    /// ACL token sent as `X-Consul-Token`.
    pub token: Option<String>,

    /// Maximum blocking-query wait in seconds.
    pub wait_secs: u64,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".to_string(),
            scheme: "http".to_string(),
            datacenter: "dc1".to_string(),
            token: None,
            wait_secs: 300,
        }
    }
}

/// Liveness endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Serve `GET /healthz`.
    pub enabled: bool,

    /// Bind address; `:8080` binds all interfaces.
    pub bind_address: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: ":8080".to_string(),
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single webhook POST in seconds.
    pub webhook_secs: u64,

    /// Slack added on top of the blocking wait before a poll is abandoned.
    pub watch_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            webhook_secs: 10,
            watch_grace_secs: 30,
        }
    }
}

/// Retry configuration for the Consul watch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Consecutive failed polls tolerated before the stream ends (0 = none).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

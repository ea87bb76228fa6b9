//! Configuration loading from disk and the command line.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied by flags or environment variables.
///
/// `None` and empty strings leave the underlying value untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub slack_webhook_url: Option<String>,
    pub slack_username: Option<String>,
    pub slack_icon_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub consul_address: Option<String>,
    pub consul_scheme: Option<String>,
    pub consul_datacenter: Option<String>,
    pub consul_token: Option<String>,
    pub health_check_address: Option<String>,
    pub log_level: Option<String>,
}

impl Overrides {
    /// Overlay the set values onto `config`.
    pub fn apply(&self, config: &mut BridgeConfig) {
        set(&mut config.slack.webhook_url, &self.slack_webhook_url);
        set(&mut config.slack.username, &self.slack_username);
        set(&mut config.slack.icon_url, &self.slack_icon_url);
        set(&mut config.discord.webhook_url, &self.discord_webhook_url);
        set(&mut config.consul.address, &self.consul_address);
        split_scheme(&mut config.consul.address, &mut config.consul.scheme);
        set(&mut config.consul.scheme, &self.consul_scheme);
        set(&mut config.consul.datacenter, &self.consul_datacenter);
        set(&mut config.health_check.bind_address, &self.health_check_address);
        set(&mut config.observability.log_level, &self.log_level);

        if let Some(token) = self.consul_token.as_ref().filter(|t| !t.is_empty()) {
            config.consul.token = Some(token.clone());
        }
    }
}

fn set(target: &mut String, value: &Option<String>) {
    if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
        target.clone_from(v);
    }
}

/// Move a `scheme://` prefix of `address` (as in `CONSUL_HTTP_ADDR`) into `scheme`.
fn split_scheme(address: &mut String, scheme: &mut String) {
    if let Some((prefix, rest)) = address.split_once("://") {
        *scheme = prefix.to_string();
        *address = rest.trim_end_matches('/').to_string();
    }
}

/// Parse configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<BridgeConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from an optional TOML file, apply overrides, and validate.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<BridgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => BridgeConfig::default(),
    };

    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

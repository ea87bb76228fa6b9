//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Webhook URLs present and well-formed
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty {0}")]
    Missing(&'static str),

    #[error("invalid {field} '{value}': {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    fn invalid(field: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Expand the `:port` shorthand to all interfaces; other values pass through.
///
/// The result may name a host and is resolved when bound.
pub fn normalize_bind_address(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}

/// Check that a listen address has the shape `host:port`.
pub fn check_bind_address(addr: &str) -> Result<(), String> {
    let normalized = normalize_bind_address(addr);
    let Some((host, port)) = normalized.rsplit_once(':') else {
        return Err("expected host:port".to_string());
    };
    if host.is_empty() {
        return Err("missing host".to_string());
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|_| format!("invalid port '{port}'"))
}

/// Resolve a listen address, host names included, to the first socket address.
pub async fn resolve_bind_address(addr: &str) -> std::io::Result<SocketAddr> {
    tokio::net::lookup_host(normalize_bind_address(addr))
        .await?
        .next()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("{addr} resolved to no addresses"),
            )
        })
}

/// Validate a loaded configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_webhook("SLACK_WEBHOOK_URL", &config.slack.webhook_url, &mut errors);
    check_webhook("DISCORD_WEBHOOK_URL", &config.discord.webhook_url, &mut errors);

    let consul = &config.consul;
    if consul.address.is_empty() {
        errors.push(ValidationError::Missing("consul address"));
    }
    if consul.scheme != "http" && consul.scheme != "https" {
        errors.push(ValidationError::invalid(
            "consul scheme",
            &consul.scheme,
            "expected http or https",
        ));
    }
    if consul.datacenter.is_empty() {
        errors.push(ValidationError::Missing("consul datacenter"));
    }
    if consul.wait_secs == 0 {
        errors.push(ValidationError::invalid("consul wait_secs", "0", "must be positive"));
    }

    if config.timeouts.webhook_secs == 0 {
        errors.push(ValidationError::invalid("webhook timeout", "0", "must be positive"));
    }

    if config.health_check.enabled {
        if let Err(e) = check_bind_address(&config.health_check.bind_address) {
            errors.push(ValidationError::invalid(
                "health check address",
                &config.health_check.bind_address,
                e,
            ));
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled {
        if let Err(e) = check_bind_address(&obs.metrics_address) {
            errors.push(ValidationError::invalid("metrics address", &obs.metrics_address, e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_webhook(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.is_empty() {
        errors.push(ValidationError::Missing(field));
        return;
    }
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::invalid(
            field,
            value,
            format!("unsupported scheme {}", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::invalid(field, value, e)),
    }
}

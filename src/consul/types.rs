//! Consul wire types, health events and error definitions.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

const NODE_MAINTENANCE_CHECK: &str = "_node_maintenance";
const SERVICE_MAINTENANCE_PREFIX: &str = "_service_maintenance:";

/// One entry of `/v1/health/state/any`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    pub node: String,
    #[serde(rename = "CheckID")]
    pub check_id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub output: String,
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    #[serde(default)]
    pub service_name: String,
}

impl HealthCheck {
    /// Status of the check, with maintenance checks folded into `Maintenance`.
    pub fn status(&self) -> Status {
        if self.check_id == NODE_MAINTENANCE_CHECK
            || self.check_id.starts_with(SERVICE_MAINTENANCE_PREFIX)
        {
            return Status::Maintenance;
        }
        Status::parse(&self.status)
    }
}

/// Health status reported by Consul.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Passing,
    Warning,
    Critical,
    Maintenance,
    /// A value the bridge does not know how to present.
    Unknown(String),
}

impl Status {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "passing" => Status::Passing,
            "warning" => Status::Warning,
            "critical" => Status::Critical,
            "maintenance" => Status::Maintenance,
            other => Status::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Passing => "passing",
            Status::Warning => "warning",
            Status::Critical => "critical",
            Status::Maintenance => "maintenance",
            Status::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected status transition of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthEvent {
    pub node: String,
    pub service_id: String,
    pub status: Status,
    pub notes: String,
    pub output: String,
}

impl From<&HealthCheck> for HealthEvent {
    fn from(check: &HealthCheck) -> Self {
        let service_id = if check.service_id.is_empty() {
            check.check_id.clone()
        } else {
            check.service_id.clone()
        };

        Self {
            node: check.node.clone(),
            service_id,
            status: check.status(),
            notes: check.notes.clone(),
            output: check.output.clone(),
        }
    }
}

/// Errors that terminate the watch stream.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The configured agent address does not form a valid URL.
    #[error("invalid consul address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    /// Transport failure or timeout.
    #[error("consul request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The agent answered with a non-success status.
    #[error("consul returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a list of health checks.
    #[error("malformed consul response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The blocking index header was absent or not a number.
    #[error("missing or invalid X-Consul-Index header")]
    MissingIndex,
}

/// Result type for watch operations.
pub type WatchResult<T> = Result<T, WatchError>;

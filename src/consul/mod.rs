//! Consul watch subsystem.
//!
//! # Data Flow
//! ```text
//! WatchClient::next()
//!     → HealthApi::fetch (blocking query with last index)
//!     → diff against last known status per (node, check)
//!     → queue HealthEvent per transition
//!     → hand events out one at a time
//!
//! On failure:
//!     → backoff.rs delay, retry up to max_attempts
//!     → then stream ends, error kept for err()
//!
//! On shutdown:
//!     → in-flight poll or backoff sleep is abandoned
//!     → stream ends, err() is None
//! ```

pub mod client;
pub mod types;

pub use client::WatchClient;
pub use types::{HealthCheck, HealthEvent, Status, WatchError, WatchResult};

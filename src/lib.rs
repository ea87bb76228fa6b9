//! Consul to chat bridge library.
//!
//! Watches Consul health checks and posts every status transition to Slack
//! and Discord webhooks.

pub mod config;
pub mod consul;
pub mod dispatch;
pub mod health;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod resilience;

pub use config::schema::BridgeConfig;
pub use consul::WatchClient;
pub use dispatch::Dispatcher;
pub use lifecycle::Shutdown;

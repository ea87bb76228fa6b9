//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Consul poll fails:
//!     → backoff.rs (delay grows per consecutive failure)
//!     → WatchClient retries until max_attempts, then ends the stream
//!
//! Webhook POST fails:
//!     → bounded by the per-request timeout, logged, never retried
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Only the watch retries; a missed notification is not replayed

pub mod backoff;

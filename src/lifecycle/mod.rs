//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → watch client stops polling → dispatcher loop ends
//!             → liveness server stops → process exits 0
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{has_fired, Shutdown};
pub use signals::spawn_signal_handler;

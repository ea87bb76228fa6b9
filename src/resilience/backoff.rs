//! Retry pacing for failed Consul polls.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Tracks consecutive failures of one operation against a retry budget.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryConfig,
    failures: u32,
}

impl Backoff {
    pub fn new(policy: &RetryConfig) -> Self {
        Self {
            policy: policy.clone(),
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait before retrying.
    ///
    /// `None` once `max_attempts` retries have been spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.failures >= self.policy.max_attempts {
            return None;
        }
        self.failures += 1;
        Some(delay_for(self.failures, &self.policy))
    }

    /// Retries spent so far.
    pub fn attempts(&self) -> u32 {
        self.failures
    }

    /// Forget earlier failures after a success.
    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

/// Delay before retry `attempt` (1-based): doubles from `base_delay_ms`,
/// capped at `max_delay_ms`, plus up to 10% jitter.
pub fn delay_for(attempt: u32, policy: &RetryConfig) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = policy
        .base_delay_ms
        .saturating_mul(factor)
        .min(policy.max_delay_ms);

    let jitter = match capped / 10 {
        0 => 0,
        range => rand::thread_rng().gen_range(0..range),
    };

    Duration::from_millis(capped + jitter)
}

//! Reconnect backoff policy

use std::time::Duration;

/// Default delay before the first reconnect attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default ceiling for the reconnect delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Default number of reconnect attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Exponential backoff configuration for stream reconnects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Retries allowed after the connection was last live
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay to wait when `attempt` retries have already been made
    ///
    /// `min(max_delay, base_delay * 2^attempt)`, saturating on overflow.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map(|delay| delay.min(self.max_delay))
            .unwrap_or(self.max_delay)
    }

    /// Whether another retry is allowed after `attempt` retries
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

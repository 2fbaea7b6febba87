//! Retry delay computation for the poll streams.

use std::time::Duration;

use watchdash_proto::settings::PollingSettings;

/// Exponential backoff with a ceiling and a retry budget.  Pure: the caller
/// owns the attempt counter and resets it to zero on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubles per attempt after that.
    pub base: Duration,
    /// Ceiling for the computed delay.
    pub cap: Duration,
    /// Attempts allowed before the stream gives up.
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(base: Duration, settings: &PollingSettings) -> Self {
        Self {
            base,
            cap: settings.backoff_cap(),
            max_retries: settings.max_retries,
        }
    }

    /// Delay for retry `attempt` (1-based), or `None` once the budget is
    /// exhausted — the caller must disable the stream instead of sleeping.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_retries {
            return None;
        }
        // 2^(attempt-1), saturating instead of overflowing for large attempts.
        let multiplier: u64 = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
        let millis = (self.base.as_millis() as u64).saturating_mul(multiplier);
        Some(Duration::from_millis(millis).min(self.cap))
    }
}

//! Reconnection backoff policy
//!
//! Pure delay schedule: no I/O, no clock. The session asks for the delay
//! before retry attempt N and stops retrying once the answer is `None`.

use std::time::Duration;

/// Exponential backoff with a delay cap and an attempt ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first retry
    pub base: Duration,
    /// Upper bound on any single delay
    pub cap: Duration,
    /// Retry attempts allowed per consecutive-failure streak
    pub max_attempts: u32,
}

impl Backoff {
    /// Delay before retry attempt `attempt` (1-indexed per consecutive
    /// failure since the last successful open), or `None` to give up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.base.saturating_mul(factor).min(self.cap))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(10),
            max_attempts: 5,
        }
    }
}

//! Brute force lockout policy.
//!
//! Failed attempts are counted per username, including usernames with no
//! stored credential. Once the count reaches the threshold the account is
//! locked for an exponentially growing delay, capped at `max_delay`.

use std::time::Duration;

use amx_core::LockoutConfig;
use amx_model::LockoutState;
use chrono::{DateTime, TimeDelta, Utc};

/// Lockout thresholds and backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures before an account is locked.
    pub threshold: u32,
    /// Lock duration at the threshold.
    pub base_delay: Duration,
    /// Cap on the lock duration.
    pub max_delay: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::from_config(&LockoutConfig::default())
    }
}

impl LockoutPolicy {
    /// Creates a policy from the lockout section of the configuration.
    #[must_use]
    pub const fn from_config(config: &LockoutConfig) -> Self {
        Self {
            threshold: config.threshold,
            base_delay: config.base_delay,
            max_delay: config.max_delay,
        }
    }

    /// Lock duration after `failures` consecutive failures.
    ///
    /// Zero below the threshold, `base_delay * 2^(failures - threshold)`
    /// from there on, never above `max_delay`.
    #[must_use]
    pub fn backoff(&self, failures: u32) -> Duration {
        if failures < self.threshold {
            return Duration::ZERO;
        }
        let factor = 1u32
            .checked_shl(failures - self.threshold)
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Records a failed attempt.
    ///
    /// Returns the lock expiry if this failure locked the account.
    pub fn register_failure(
        &self,
        state: &mut LockoutState,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_failure_at = Some(now);

        if state.consecutive_failures < self.threshold {
            return None;
        }

        let delay = TimeDelta::from_std(self.backoff(state.consecutive_failures))
            .unwrap_or(TimeDelta::MAX);
        let until = now
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        state.locked_until = Some(until);
        Some(until)
    }

    /// Records a successful attempt.
    pub fn register_success(&self, state: &mut LockoutState) {
        state.reset();
    }
}

//! Per-user lockout state.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Consecutive failure counter and lock expiry for one username.
///
/// Only the authentication engine mutates this state. It is reset to zero
/// failures on any successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutState {
    /// Username the state belongs to.
    pub username: String,
    /// Failed attempts since the last success.
    pub consecutive_failures: u32,
    /// Lock expiry, if the account is or was locked.
    pub locked_until: Option<DateTime<Utc>>,
    /// Time of the most recent failure.
    #[serde(default)]
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl LockoutState {
    /// Creates an unlocked state with no failures.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            consecutive_failures: 0,
            locked_until: None,
            last_failure_at: None,
        }
    }

    /// Returns true if the lock expiry is in the future.
    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Returns the time left until the lock expires.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .and_then(|until| (until - now).to_std().ok())
    }

    /// Returns true if there is nothing worth persisting.
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        self.consecutive_failures == 0 && self.locked_until.is_none()
    }

    /// Returns true if the state may be dropped at `now`.
    ///
    /// That is the case once no lock is in force and the last failure is
    /// more than `retention` in the past. States without a recorded failure
    /// time are never stale.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        if self.is_locked(now) {
            return false;
        }
        let Ok(retention) = TimeDelta::from_std(retention) else {
            return false;
        };
        self.last_failure_at
            .is_some_and(|at| now.signed_duration_since(at) > retention)
    }

    /// Clears failures and any lock.
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.locked_until = None;
        self.last_failure_at = None;
    }
}

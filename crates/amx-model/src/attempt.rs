//! Transient authentication attempt.

use std::fmt;

use chrono::{DateTime, Utc};

/// A single login attempt.
///
/// Created per `authenticate` call and never persisted. The supplied secret
/// is redacted from `Debug` output.
#[derive(Clone)]
pub struct AuthenticationAttempt {
    /// Username as supplied by the caller.
    pub username: String,
    /// Plaintext secret as supplied by the caller.
    pub supplied_secret: String,
    /// When the attempt started.
    pub timestamp: DateTime<Utc>,
}

impl AuthenticationAttempt {
    /// Creates an attempt stamped with the current time.
    #[must_use]
    pub fn new(username: impl Into<String>, supplied_secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            supplied_secret: supplied_secret.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Debug for AuthenticationAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationAttempt")
            .field("username", &self.username)
            .field("supplied_secret", &"<redacted>")
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

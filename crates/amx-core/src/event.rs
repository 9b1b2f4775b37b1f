//! Security audit events.
//!
//! Every authentication attempt and administrative credential operation
//! produces an [`Event`]. Events carry the specific failure kind, which is
//! withheld from end users, so they are meant for internal audit sinks only.
//!
//! All events include:
//! - Timestamp
//! - Event type
//! - Username
//! - Outcome (success/failure)
//! - Detail pairs (never secrets)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Successful login with roles granted.
    Login,
    /// Failed login (bad password, unknown user, locked, store failure).
    LoginError,
    /// Account crossed the lockout threshold.
    AccountLocked,
    /// Lockout state cleared by an administrator.
    AccountUnlocked,
    /// Password replaced by an administrator.
    UpdatePassword,
    /// Stored credential re-hashed under the current scheme.
    CredentialMigrated,
    /// Password verified but roles could not be resolved.
    RoleResolutionError,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Username the event concerns.
    pub username: Option<String>,

    /// Login session ID (successful logins only).
    pub session_id: Option<Uuid>,

    /// Error code (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Looks up a detail value by key.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for creating events.
#[derive(Debug)]
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    username: Option<String>,
    session_id: Option<Uuid>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            username: None,
            session_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error code.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the username.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the login session ID.
    #[must_use]
    pub const fn session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            username: self.username,
            session_id: self.session_id,
            error: self.error,
            details: self.details,
        }
    }
}

/// Receiver for security audit events.
///
/// Called synchronously on the authenticating task; implementations should
/// hand off to a channel if delivery is slow.
pub trait EventListener: Send + Sync {
    /// Handles an event.
    fn on_event(&self, event: &Event);
}

/// Event listener that writes to the tracing framework.
///
/// Successful events are logged at INFO, failures at WARN.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventListener;

impl TracingEventListener {
    /// Creates a new tracing listener.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventListener for TracingEventListener {
    fn on_event(&self, event: &Event) {
        match event.outcome {
            EventOutcome::Success => tracing::info!(
                event_id = %event.id,
                event_type = ?event.event_type,
                username = ?event.username,
                session_id = ?event.session_id,
                details = ?event.details,
                "auth_event"
            ),
            EventOutcome::Failure => tracing::warn!(
                event_id = %event.id,
                event_type = ?event.event_type,
                username = ?event.username,
                error = ?event.error,
                details = ?event.details,
                "auth_event"
            ),
        }
    }
}

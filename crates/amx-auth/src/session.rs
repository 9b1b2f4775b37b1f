//! Login outcomes.

use std::collections::BTreeSet;
use std::fmt;

use amx_model::Credential;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Wording shown to end users for rejected credentials and locked accounts.
pub const GENERIC_FAILURE_MESSAGE: &str = "authentication failed";

/// Wording shown to end users when a collaborator is unavailable.
pub const UNAVAILABLE_MESSAGE: &str = "authentication is temporarily unavailable";

/// An authenticated principal with its roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    /// Session ID.
    pub session_id: Uuid,
    /// Principal name (the username).
    pub principal: String,
    /// Roles resolved for this login.
    pub roles: BTreeSet<String>,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
}

impl AuthenticatedPrincipal {
    pub(crate) fn new(principal: impl Into<String>, roles: BTreeSet<String>) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            principal: principal.into(),
            roles,
            issued_at: Utc::now(),
        }
    }

    /// Checks if the principal holds a role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Proof that a username's password was verified.
///
/// Only the engine creates these. Handing one back to
/// [`AuthenticationEngine::resume`](crate::AuthenticationEngine::resume)
/// retries role resolution without re-prompting for the password, until the
/// configured retry window elapses or the verified credential is replaced.
/// `resume` consumes the identity.
#[derive(PartialEq, Eq)]
pub struct VerifiedIdentity {
    username: String,
    verified_at: DateTime<Utc>,
    credential_salt: Vec<u8>,
}

impl fmt::Debug for VerifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedIdentity")
            .field("username", &self.username)
            .field("verified_at", &self.verified_at)
            .finish_non_exhaustive()
    }
}

impl VerifiedIdentity {
    pub(crate) fn new(credential: &Credential, verified_at: DateTime<Utc>) -> Self {
        Self {
            username: credential.username.clone(),
            verified_at,
            credential_salt: credential.salt.clone(),
        }
    }

    /// Verified username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// When the password was verified.
    #[must_use]
    pub const fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }

    /// Checks if `credential` is still the one that was verified.
    ///
    /// Every re-hash draws a fresh salt, so a password change or a
    /// migration makes this false.
    pub(crate) fn verified(&self, credential: &Credential) -> bool {
        credential.username == self.username && credential.salt == self.credential_salt
    }
}

/// Failure category, for logs and audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Bad password or unknown user.
    InvalidCredentials,
    /// Account locked.
    AccountLocked,
    /// Stored credential uses an unknown scheme.
    UnsupportedAlgorithm,
    /// Credential store or lockout repository unavailable.
    StoreUnavailable,
    /// Role resolver unavailable.
    RoleResolutionUnavailable,
}

impl FailureKind {
    /// Returns a stable error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountLocked => "account_locked",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::StoreUnavailable => "store_unavailable",
            Self::RoleResolutionUnavailable => "role_resolution_unavailable",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a login did not produce a principal.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginFailure {
    /// Bad password or unknown user.
    InvalidCredentials,
    /// Account locked after repeated failures.
    AccountLocked {
        /// When the lock expires.
        until: DateTime<Utc>,
    },
    /// Stored credential uses an algorithm or scheme version this build
    /// does not support.
    UnsupportedAlgorithm(String),
    /// Credential store or lockout repository failed or timed out.
    StoreUnavailable(String),
    /// Password verified, role resolution failed or timed out.
    RoleResolutionUnavailable {
        /// Pass to `resume` to retry role resolution.
        identity: VerifiedIdentity,
        /// Collaborator error.
        reason: String,
    },
}

impl LoginFailure {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidCredentials => FailureKind::InvalidCredentials,
            Self::AccountLocked { .. } => FailureKind::AccountLocked,
            Self::UnsupportedAlgorithm(_) => FailureKind::UnsupportedAlgorithm,
            Self::StoreUnavailable(_) => FailureKind::StoreUnavailable,
            Self::RoleResolutionUnavailable { .. } => FailureKind::RoleResolutionUnavailable,
        }
    }

    /// Message safe to show to the end user.
    ///
    /// Rejected credentials, locked accounts and unsupported stored schemes
    /// read the same, since only an existing account can have a stored
    /// scheme.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials
            | Self::AccountLocked { .. }
            | Self::UnsupportedAlgorithm(_) => GENERIC_FAILURE_MESSAGE,
            Self::StoreUnavailable(_) | Self::RoleResolutionUnavailable { .. } => {
                UNAVAILABLE_MESSAGE
            }
        }
    }

    /// The verified identity, for role resolution failures.
    #[must_use]
    pub const fn verified_identity(&self) -> Option<&VerifiedIdentity> {
        match self {
            Self::RoleResolutionUnavailable { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// Takes the verified identity out of a role resolution failure.
    #[must_use]
    pub fn into_verified_identity(self) -> Option<VerifiedIdentity> {
        match self {
            Self::RoleResolutionUnavailable { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// Checks if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::RoleResolutionUnavailable { .. }
        )
    }
}

impl From<LoginFailure> for AuthError {
    fn from(failure: LoginFailure) -> Self {
        match failure {
            LoginFailure::InvalidCredentials => Self::InvalidCredentials,
            LoginFailure::AccountLocked { until } => Self::AccountLocked { until: Some(until) },
            LoginFailure::UnsupportedAlgorithm(id) => Self::UnsupportedAlgorithm(id),
            LoginFailure::StoreUnavailable(reason) => Self::StoreUnavailable(reason),
            LoginFailure::RoleResolutionUnavailable { reason, .. } => {
                Self::RoleResolutionUnavailable(reason)
            }
        }
    }
}

/// Result of an authentication attempt.
///
/// Exactly one of a principal or a failure.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginSession {
    /// Credentials accepted and roles resolved.
    Authenticated(AuthenticatedPrincipal),
    /// Attempt rejected.
    Failed(LoginFailure),
}

impl LoginSession {
    /// Returns true on success.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The authenticated principal, on success.
    #[must_use]
    pub const fn principal(&self) -> Option<&AuthenticatedPrincipal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            Self::Failed(_) => None,
        }
    }

    /// The resolved roles, on success.
    #[must_use]
    pub const fn roles(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Authenticated(principal) => Some(&principal.roles),
            Self::Failed(_) => None,
        }
    }

    /// The failure, if the attempt was rejected.
    #[must_use]
    pub const fn failure(&self) -> Option<&LoginFailure> {
        match self {
            Self::Authenticated(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Takes the failure out of a rejected attempt.
    #[must_use]
    pub fn into_failure(self) -> Option<LoginFailure> {
        match self {
            Self::Authenticated(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// The failure category, if the attempt was rejected.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Authenticated(_) => None,
            Self::Failed(failure) => Some(failure.kind()),
        }
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> AuthResult<AuthenticatedPrincipal> {
        match self {
            Self::Authenticated(principal) => Ok(principal),
            Self::Failed(failure) => Err(failure.into()),
        }
    }
}

//! Authentication error types.

use std::fmt;

use amx_crypto::CryptoError;
use amx_model::UnsupportedAlgorithm;
use amx_storage::StorageError;

/// Authentication operation errors.
///
/// `authenticate` never returns these directly; expected outcomes are
/// [`LoginSession`](crate::LoginSession) values. They surface from engine
/// construction, administrative operations and
/// [`LoginSession::into_result`](crate::LoginSession::into_result).
#[derive(Debug)]
pub enum AuthError {
    /// Bad password or unknown user (intentionally conflated).
    InvalidCredentials,
    /// Account is temporarily locked after repeated failures.
    AccountLocked {
        /// When the lockout expires.
        until: Option<chrono::DateTime<chrono::Utc>>,
    },
    /// Hashing algorithm id or scheme version is not supported.
    UnsupportedAlgorithm(String),
    /// Credential store or lockout repository failed or timed out.
    StoreUnavailable(String),
    /// Password verified but role resolution failed or timed out.
    RoleResolutionUnavailable(String),
    /// Administrative operation on a user without a credential.
    CredentialNotFound,
    /// Configuration rejected at startup.
    InvalidConfiguration(String),
    /// Internal error.
    Internal(String),
}

impl AuthError {
    /// Checks if the caller may retry without changing its input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::RoleResolutionUnavailable(_)
        )
    }

    /// Checks if this error is fatal at startup.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAlgorithm(_) | Self::InvalidConfiguration(_)
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::AccountLocked { until } => {
                if let Some(time) = until {
                    write!(f, "user account is locked until {time}")
                } else {
                    write!(f, "user account is locked")
                }
            }
            Self::UnsupportedAlgorithm(id) => {
                write!(f, "unsupported password hashing algorithm: {id}")
            }
            Self::StoreUnavailable(msg) => write!(f, "credential store unavailable: {msg}"),
            Self::RoleResolutionUnavailable(msg) => {
                write!(f, "role resolution unavailable: {msg}")
            }
            Self::CredentialNotFound => write!(f, "credential not found"),
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<UnsupportedAlgorithm> for AuthError {
    fn from(err: UnsupportedAlgorithm) -> Self {
        Self::UnsupportedAlgorithm(err.0)
    }
}

impl From<amx_core::Error> for AuthError {
    fn from(err: amx_core::Error) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

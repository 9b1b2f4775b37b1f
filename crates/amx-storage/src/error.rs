//! Storage error types.

use thiserror::Error;

/// Errors that can occur in collaborator calls.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer in time.
    #[error("Backend timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StorageError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Checks if the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

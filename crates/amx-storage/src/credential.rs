//! Credential store trait.

use amx_model::Credential;
use async_trait::async_trait;

use crate::error::StorageResult;

/// Resolves usernames to stored credential material.
///
/// Implementations must be thread-safe and support concurrent access.
///
/// ## Security Note
///
/// Implementations must never log salts or hashes. A missing user is
/// `Ok(None)`, never an error, so that the engine can treat it exactly like
/// a wrong password.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds the credential for a username.
    async fn find(&self, username: &str) -> StorageResult<Option<Credential>>;

    /// Replaces the credential for `credential.username` wholesale.
    ///
    /// Creates the entry if none exists.
    async fn replace(&self, credential: Credential) -> StorageResult<()>;

    /// Checks if a credential exists for a username.
    async fn exists(&self, username: &str) -> StorageResult<bool> {
        Ok(self.find(username).await?.is_some())
    }
}

//! Role resolver trait.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Maps an authenticated username to its role names.
///
/// Called on every successful login. Results must not be cached across
/// logins so that revocation takes effect on the next attempt.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Returns the roles granted to `username`.
    ///
    /// A user with no roles yields an empty set, not an error.
    async fn roles_for(&self, username: &str) -> StorageResult<BTreeSet<String>>;
}

//! Lockout state persistence trait.

use amx_model::LockoutState;
use async_trait::async_trait;

use crate::error::StorageResult;

/// Persists per-username lockout state.
///
/// The engine serializes all calls for one username within a process, so
/// implementations only need per-call atomicity. Deployments running several
/// engine processes against one backend must provide their own
/// compare-and-set semantics in `save`.
///
/// Unknown usernames are tracked like known ones so that lockout behaviour
/// does not reveal which accounts exist. Every guessed username therefore
/// leaves a record, and implementations must bound their retention: a state
/// that is not locked and whose last failure is older than the configured
/// `lockout.max_delay` may be dropped (see [`LockoutState::is_stale`]).
#[async_trait]
pub trait LockoutRepository: Send + Sync {
    /// Loads the state for a username, if any has been recorded.
    async fn load(&self, username: &str) -> StorageResult<Option<LockoutState>>;

    /// Stores the state for `state.username`.
    async fn save(&self, state: &LockoutState) -> StorageResult<()>;

    /// Removes any state for a username.
    async fn clear(&self, username: &str) -> StorageResult<()>;
}

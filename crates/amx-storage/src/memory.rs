//! In-memory collaborator implementations.
//!
//! Used as test doubles and for single-node deployments where credentials
//! are provisioned at startup. All three are cheap to clone-share behind an
//! `Arc` and never fail.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use amx_model::{Credential, LockoutState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::credential::CredentialStore;
use crate::error::StorageResult;
use crate::lockout::LockoutRepository;
use crate::role::RoleResolver;

/// Credential store backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<String, Credential>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with credentials.
    #[must_use]
    pub fn with_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let map = credentials
            .into_iter()
            .map(|c| (c.username.clone(), c))
            .collect();
        Self {
            credentials: RwLock::new(map),
        }
    }

    /// Inserts or replaces a credential.
    pub fn insert(&self, credential: Credential) {
        self.credentials
            .write()
            .insert(credential.username.clone(), credential);
    }

    /// Returns a copy of the stored credential for a username.
    #[must_use]
    pub fn get(&self, username: &str) -> Option<Credential> {
        self.credentials.read().get(username).cloned()
    }

    /// Number of stored credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.read().len()
    }

    /// Returns true if no credentials are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find(&self, username: &str) -> StorageResult<Option<Credential>> {
        Ok(self.get(username))
    }

    async fn replace(&self, credential: Credential) -> StorageResult<()> {
        self.insert(credential);
        Ok(())
    }
}

/// Role resolver backed by a fixed username-to-roles map.
#[derive(Debug, Default)]
pub struct StaticRoleResolver {
    roles: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl StaticRoleResolver {
    /// Creates a resolver that grants no roles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds roles to a user.
    pub fn grant<I, S>(&self, username: &str, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles
            .write()
            .entry(username.to_string())
            .or_default()
            .extend(roles.into_iter().map(Into::into));
    }

    /// Removes a role from a user.
    pub fn revoke(&self, username: &str, role: &str) {
        if let Some(roles) = self.roles.write().get_mut(username) {
            roles.remove(role);
        }
    }
}

#[async_trait]
impl RoleResolver for StaticRoleResolver {
    async fn roles_for(&self, username: &str) -> StorageResult<BTreeSet<String>> {
        Ok(self.roles.read().get(username).cloned().unwrap_or_default())
    }
}

/// Lockout repository backed by a hash map.
///
/// With a retention period, stale states are swept on every `save`.
#[derive(Debug, Default)]
pub struct InMemoryLockoutRepository {
    states: RwLock<HashMap<String, LockoutState>>,
    retention: Option<Duration>,
}

impl InMemoryLockoutRepository {
    /// Creates an empty repository that keeps every state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository that drops unlocked states whose last
    /// failure is older than `retention`.
    ///
    /// Use at least the engine's `lockout.max_delay`.
    #[must_use]
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            states: RwLock::default(),
            retention: Some(retention),
        }
    }

    /// Removes stale states. Returns how many were removed.
    pub fn purge_stale(&self, now: DateTime<Utc>) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };
        let mut states = self.states.write();
        let before = states.len();
        states.retain(|_, state| !state.is_stale(now, retention));
        before - states.len()
    }

    /// Number of usernames with recorded state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Returns true if no state is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[async_trait]
impl LockoutRepository for InMemoryLockoutRepository {
    async fn load(&self, username: &str) -> StorageResult<Option<LockoutState>> {
        Ok(self.states.read().get(username).cloned())
    }

    async fn save(&self, state: &LockoutState) -> StorageResult<()> {
        self.purge_stale(Utc::now());
        self.states
            .write()
            .insert(state.username.clone(), state.clone());
        Ok(())
    }

    async fn clear(&self, username: &str) -> StorageResult<()> {
        self.states.write().remove(username);
        Ok(())
    }
}

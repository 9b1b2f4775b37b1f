//! Per-username serialization.
//!
//! Every attempt for a username runs its whole read-check-verify-write
//! sequence while holding that username's gate. Distinct usernames only
//! share the map's shard locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of per-username async mutexes.
#[derive(Debug, Default)]
pub struct UserGates {
    gates: DashMap<String, Arc<Mutex<()>>>,
}

impl UserGates {
    /// Creates an empty gate map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `username`.
    pub async fn acquire(&self, username: &str) -> UserGate<'_> {
        let gate = self
            .gates
            .entry(username.to_string())
            .or_default()
            .clone();

        let guard = gate.lock_owned().await;
        UserGate {
            gates: &self.gates,
            username: username.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of usernames with a live gate.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Returns true if no gate is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

/// Exclusive access to one username. Released on drop.
#[derive(Debug)]
pub struct UserGate<'a> {
    gates: &'a DashMap<String, Arc<Mutex<()>>>,
    username: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGate<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: no holder, no waiter.
        self.gates
            .remove_if(&self.username, |_, gate| Arc::strong_count(gate) == 1);
    }
}

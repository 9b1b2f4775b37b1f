//! Authentication engine.
//!
//! Orchestrates lockout checks, credential lookup, password verification,
//! credential migration and role resolution for one login attempt.
//!
//! ## Security Controls
//!
//! - Unknown usernames are indistinguishable from wrong passwords: both
//!   spend one full hash verification and both count towards lockout.
//! - Locked accounts are rejected before any credential lookup or hashing.
//! - Attempts for the same username are serialized, so concurrent failures
//!   never lose a counter update.
//! - Collaborator failures never authenticate anyone.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use amx_core::{AuthConfig, Event, EventListener, EventType, TracingEventListener};
use amx_model::{AuthenticationAttempt, Credential, LockoutState};
use amx_storage::{CredentialStore, LockoutRepository, RoleResolver, StorageError, StorageResult};
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{AuthError, AuthResult};
use crate::gate::UserGates;
use crate::lockout::LockoutPolicy;
use crate::password::PasswordHasherService;
use crate::session::{AuthenticatedPrincipal, LoginFailure, LoginSession, VerifiedIdentity};

/// Username recorded on the timing decoy credential.
const DECOY_USERNAME: &str = "<decoy>";

/// Credential verification, lockout and principal resolution.
///
/// Shared between tasks through an `Arc`.
pub struct AuthenticationEngine {
    hasher: Arc<PasswordHasherService>,
    lockout: LockoutPolicy,
    credentials: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleResolver>,
    lockouts: Arc<dyn LockoutRepository>,
    listener: Arc<dyn EventListener>,
    gates: UserGates,
    decoy: Credential,
    lookup_timeout: Duration,
    role_retry_window: TimeDelta,
}

impl fmt::Debug for AuthenticationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationEngine")
            .field("hasher", &self.hasher)
            .field("lockout", &self.lockout)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("role_retry_window", &self.role_retry_window)
            .finish_non_exhaustive()
    }
}

impl AuthenticationEngine {
    /// Creates an engine.
    ///
    /// Hashes the decoy credential under the configured scheme, so this
    /// takes as long as one password hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAlgorithm` for an unknown algorithm id
    /// and `AuthError::InvalidConfiguration` for any other rejected setting.
    pub fn new(
        config: &AuthConfig,
        credentials: Arc<dyn CredentialStore>,
        roles: Arc<dyn RoleResolver>,
        lockouts: Arc<dyn LockoutRepository>,
    ) -> AuthResult<Self> {
        config.validate()?;

        let hasher = PasswordHasherService::from_config(&config.hashing)?;
        let decoy = hasher.hash_credential(DECOY_USERNAME, &config.decoy_secret)?;
        let role_retry_window = TimeDelta::from_std(config.role_retry_window).map_err(|_| {
            AuthError::InvalidConfiguration("role_retry_window is too large".to_string())
        })?;

        tracing::info!(
            algorithm = %hasher.algorithm(),
            lockout_threshold = config.lockout.threshold,
            "authentication engine initialized"
        );

        Ok(Self {
            hasher: Arc::new(hasher),
            lockout: LockoutPolicy::from_config(&config.lockout),
            credentials,
            roles,
            lockouts,
            listener: Arc::new(TracingEventListener::new()),
            gates: UserGates::new(),
            decoy,
            lookup_timeout: config.lookup_timeout,
            role_retry_window,
        })
    }

    /// Replaces the audit event listener.
    #[must_use]
    pub fn with_event_listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Returns the password hasher in use.
    #[must_use]
    pub fn hasher(&self) -> &PasswordHasherService {
        &self.hasher
    }

    /// Authenticates a username and password.
    ///
    /// Never returns an error: every outcome, including collaborator
    /// failures, is a [`LoginSession`].
    #[tracing::instrument(skip(self, supplied_secret))]
    pub async fn authenticate(&self, username: &str, supplied_secret: &str) -> LoginSession {
        let attempt = AuthenticationAttempt::new(username, supplied_secret);

        let verified = {
            let _gate = self.gates.acquire(username).await;
            self.check_credentials(&attempt).await
        };

        match verified {
            Ok(identity) => self.resolve_roles(identity).await,
            Err(failure) => {
                self.login_failed(username, &failure);
                LoginSession::Failed(failure)
            }
        }
    }

    /// Retries role resolution for an identity whose password was already
    /// verified.
    ///
    /// Consumes the identity. Identities older than the configured retry
    /// window, or whose credential was replaced since verification, yield
    /// `InvalidCredentials`. A failed role lookup hands back a fresh
    /// identity carrying the original verification time.
    #[tracing::instrument(skip(self, identity), fields(username = %identity.username()))]
    pub async fn resume(&self, identity: VerifiedIdentity) -> LoginSession {
        let checked = {
            let _gate = self.gates.acquire(identity.username()).await;
            self.check_identity(&identity).await
        };

        match checked {
            Ok(()) => self.resolve_roles(identity).await,
            Err(failure) => {
                self.login_failed(identity.username(), &failure);
                LoginSession::Failed(failure)
            }
        }
    }

    /// Replaces a user's password under the current scheme and clears any
    /// lockout.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CredentialNotFound` if the user has no credential
    /// and `AuthError::StoreUnavailable` if a collaborator fails.
    #[tracing::instrument(skip(self, new_secret))]
    pub async fn change_password(&self, username: &str, new_secret: &str) -> AuthResult<()> {
        let _gate = self.gates.acquire(username).await;

        if self.bounded(self.credentials.find(username)).await?.is_none() {
            return Err(AuthError::CredentialNotFound);
        }

        let credential = self.hash_blocking(username, new_secret).await?;
        self.bounded(self.credentials.replace(credential)).await?;
        self.bounded(self.lockouts.clear(username)).await?;

        tracing::info!("password changed");
        self.emit(
            Event::builder(EventType::UpdatePassword)
                .success()
                .username(username)
                .detail("algorithm", self.hasher.algorithm().as_str())
                .build(),
        );
        Ok(())
    }

    /// Clears a user's failure count and lock without touching the
    /// credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StoreUnavailable` if the lockout repository fails.
    #[tracing::instrument(skip(self))]
    pub async fn unlock(&self, username: &str) -> AuthResult<()> {
        let _gate = self.gates.acquire(username).await;
        self.bounded(self.lockouts.clear(username)).await?;

        tracing::info!("account unlocked");
        self.emit(
            Event::builder(EventType::AccountUnlocked)
                .success()
                .username(username)
                .build(),
        );
        Ok(())
    }

    /// Returns the recorded lockout state for a username.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StoreUnavailable` if the lockout repository fails.
    pub async fn lockout_state(&self, username: &str) -> AuthResult<Option<LockoutState>> {
        Ok(self.bounded(self.lockouts.load(username)).await?)
    }

    /// Runs under the username's gate.
    async fn check_identity(&self, identity: &VerifiedIdentity) -> Result<(), LoginFailure> {
        let age = Utc::now().signed_duration_since(identity.verified_at());
        if age > self.role_retry_window {
            tracing::debug!("verified identity expired");
            return Err(LoginFailure::InvalidCredentials);
        }

        let current = self
            .bounded(self.credentials.find(identity.username()))
            .await
            .map_err(|e| store_failure("credential lookup", &e))?;

        match current {
            Some(credential) if identity.verified(&credential) => Ok(()),
            _ => {
                tracing::debug!("verified credential was replaced");
                Err(LoginFailure::InvalidCredentials)
            }
        }
    }

    /// Runs under the username's gate.
    async fn check_credentials(
        &self,
        attempt: &AuthenticationAttempt,
    ) -> Result<VerifiedIdentity, LoginFailure> {
        let username = attempt.username.as_str();
        // Clock read under the gate
        let now = Utc::now();

        let loaded = self
            .bounded(self.lockouts.load(username))
            .await
            .map_err(|e| store_failure("lockout load", &e))?;
        let had_state = loaded.is_some();
        let mut state = loaded.unwrap_or_else(|| LockoutState::new(username));

        if let Some(until) = state.locked_until.filter(|_| state.is_locked(now)) {
            tracing::debug!(%until, "attempt rejected, account locked");
            return Err(LoginFailure::AccountLocked { until });
        }

        let credential = self
            .bounded(self.credentials.find(username))
            .await
            .map_err(|e| store_failure("credential lookup", &e))?;

        let verified = if let Some(credential) = credential {
            let matched = match self
                .verify_blocking(&attempt.supplied_secret, credential.clone())
                .await
            {
                Ok(matched) => matched,
                Err(AuthError::UnsupportedAlgorithm(id)) => {
                    tracing::warn!(algorithm = %id, "stored credential uses an unsupported scheme");
                    return Err(LoginFailure::UnsupportedAlgorithm(id));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "password verification failed");
                    false
                }
            };
            if !matched {
                None
            } else if self.hasher.needs_rehash(&credential) {
                let stored = self
                    .migrate(&credential, &attempt.supplied_secret)
                    .await
                    .unwrap_or(credential);
                Some(VerifiedIdentity::new(&stored, now))
            } else {
                Some(VerifiedIdentity::new(&credential, now))
            }
        } else {
            // Spend the same hashing time as a real verification
            let _ = self
                .verify_blocking(&attempt.supplied_secret, self.decoy.clone())
                .await;
            None
        };

        if let Some(identity) = verified {
            if had_state {
                self.lockout.register_success(&mut state);
                self.bounded(self.lockouts.clear(username))
                    .await
                    .map_err(|e| store_failure("lockout clear", &e))?;
            }
            return Ok(identity);
        }

        let locked = self.lockout.register_failure(&mut state, now);
        self.bounded(self.lockouts.save(&state))
            .await
            .map_err(|e| store_failure("lockout save", &e))?;

        tracing::debug!(
            consecutive_failures = state.consecutive_failures,
            "invalid credentials"
        );

        if let Some(until) = locked {
            tracing::info!(
                consecutive_failures = state.consecutive_failures,
                %until,
                "account locked"
            );
            self.emit(locked_event(&state, until));
        }

        Err(LoginFailure::InvalidCredentials)
    }

    async fn resolve_roles(&self, identity: VerifiedIdentity) -> LoginSession {
        match self.bounded(self.roles.roles_for(identity.username())).await {
            Ok(roles) => {
                let principal = AuthenticatedPrincipal::new(identity.username(), roles);
                tracing::info!(
                    session_id = %principal.session_id,
                    roles = principal.roles.len(),
                    "login succeeded"
                );
                self.emit(
                    Event::builder(EventType::Login)
                        .success()
                        .username(identity.username())
                        .session(principal.session_id)
                        .detail("roles", principal.roles.len().to_string())
                        .build(),
                );
                LoginSession::Authenticated(principal)
            }
            Err(e) => {
                tracing::warn!(error = %e, "role resolution unavailable");
                self.emit(
                    Event::builder(EventType::RoleResolutionError)
                        .failure(e.to_string())
                        .username(identity.username())
                        .build(),
                );
                LoginSession::Failed(LoginFailure::RoleResolutionUnavailable {
                    identity,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Re-hashes a verified credential under the current scheme.
    ///
    /// Returns the upgraded credential once stored. A failure here never
    /// affects the login.
    async fn migrate(&self, credential: &Credential, plaintext: &str) -> Option<Credential> {
        let upgraded = match self.hash_blocking(&credential.username, plaintext).await {
            Ok(upgraded) => upgraded,
            Err(e) => {
                tracing::warn!(error = %e, "credential re-hash failed");
                return None;
            }
        };

        let to = upgraded.algorithm;
        match self.bounded(self.credentials.replace(upgraded.clone())).await {
            Ok(()) => {
                tracing::info!(from = %credential.algorithm, %to, "credential migrated");
                self.emit(
                    Event::builder(EventType::CredentialMigrated)
                        .success()
                        .username(credential.username.as_str())
                        .detail("from", credential.algorithm.as_str())
                        .detail("to", to.as_str())
                        .build(),
                );
                Some(upgraded)
            }
            Err(e) => {
                tracing::warn!(error = %e, "credential migration write failed");
                None
            }
        }
    }

    async fn verify_blocking(&self, plaintext: &str, credential: Credential) -> AuthResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_credential(&plaintext, &credential))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
    }

    async fn hash_blocking(&self, username: &str, plaintext: &str) -> AuthResult<Credential> {
        let hasher = Arc::clone(&self.hasher);
        let username = username.to_string();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_credential(&username, &plaintext))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
    }

    /// Bounds a collaborator call by the lookup timeout.
    async fn bounded<T, F>(&self, call: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        tokio::time::timeout(self.lookup_timeout, call)
            .await
            .unwrap_or_else(|_| Err(StorageError::Timeout(self.lookup_timeout)))
    }

    fn login_failed(&self, username: &str, failure: &LoginFailure) {
        let mut event = Event::builder(EventType::LoginError)
            .failure(failure.kind().as_str())
            .username(username);
        if let LoginFailure::AccountLocked { until } = failure {
            event = event.detail("locked_until", until.to_rfc3339());
        }
        self.emit(event.build());
    }

    fn emit(&self, event: Event) {
        self.listener.on_event(&event);
    }
}

fn store_failure(operation: &str, err: &StorageError) -> LoginFailure {
    tracing::warn!(operation, error = %err, "store unavailable");
    LoginFailure::StoreUnavailable(err.to_string())
}

fn locked_event(state: &LockoutState, until: DateTime<Utc>) -> Event {
    Event::builder(EventType::AccountLocked)
        .failure("too many failed attempts")
        .username(state.username.as_str())
        .detail("consecutive_failures", state.consecutive_failures.to_string())
        .detail("locked_until", until.to_rfc3339())
        .build()
}

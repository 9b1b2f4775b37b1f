//! Collaborator failure tests.

use std::sync::Arc;
use std::time::Duration;

use amx_auth::{AuthError, FailureKind, LoginFailure, PasswordHasherService, PasswordPolicy};
use amx_model::AlgorithmId;
use amx_storage::{InMemoryCredentialStore, InMemoryLockoutRepository, StaticRoleResolver};

use crate::common::{
    FailingLockoutRepository, FlakyRoleResolver, ReadOnlyCredentialStore, SlowCredentialStore,
    engine_with, test_config,
};

fn provisioned_store(config: &amx_core::AuthConfig) -> anyhow::Result<InMemoryCredentialStore> {
    let hasher = PasswordHasherService::from_config(&config.hashing)?;
    Ok(InMemoryCredentialStore::with_credentials([
        hasher.hash_credential("alice", "correct horse")?
    ]))
}

#[tokio::test]
async fn test_slow_store_is_unavailable() -> anyhow::Result<()> {
    let config = test_config().lookup_timeout(Duration::from_millis(50));
    let store = SlowCredentialStore::new(provisioned_store(&config)?, Duration::from_millis(500));
    let lockouts = Arc::new(InMemoryLockoutRepository::new());
    let engine = engine_with(
        &config,
        Arc::new(store),
        Arc::new(StaticRoleResolver::new()),
        lockouts.clone(),
    )?;

    let session = engine.authenticate("alice", "correct horse").await;

    let failure = session.failure().expect("store timeout must fail");
    assert_eq!(failure.kind(), FailureKind::StoreUnavailable);
    assert!(failure.is_retryable());
    // No failure is charged for an attempt that never reached verification
    assert!(lockouts.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_failing_lockout_repository_never_authenticates() -> anyhow::Result<()> {
    let config = test_config();
    let engine = engine_with(
        &config,
        Arc::new(provisioned_store(&config)?),
        Arc::new(StaticRoleResolver::new()),
        Arc::new(FailingLockoutRepository),
    )?;

    let correct = engine.authenticate("alice", "correct horse").await;
    let wrong = engine.authenticate("alice", "wrong").await;

    assert_eq!(correct.failure_kind(), Some(FailureKind::StoreUnavailable));
    assert_eq!(wrong.failure_kind(), Some(FailureKind::StoreUnavailable));

    assert!(matches!(
        engine.lockout_state("alice").await,
        Err(AuthError::StoreUnavailable(_))
    ));
    assert!(matches!(
        engine.unlock("alice").await,
        Err(AuthError::StoreUnavailable(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_role_failure_resumes_after_recovery() -> anyhow::Result<()> {
    let config = test_config();
    let roles = Arc::new(FlakyRoleResolver::default());
    roles.inner.grant("alice", ["admin"]);
    roles.fail();

    let engine = engine_with(
        &config,
        Arc::new(provisioned_store(&config)?),
        roles.clone(),
        Arc::new(InMemoryLockoutRepository::new()),
    )?;

    let session = engine.authenticate("alice", "correct horse").await;
    let Some(LoginFailure::RoleResolutionUnavailable { identity, .. }) = session.into_failure()
    else {
        panic!("expected role resolution failure");
    };
    assert_eq!(identity.username(), "alice");

    roles.recover();

    let resumed = engine.resume(identity).await;
    let principal = resumed.principal().expect("resumed principal");
    assert_eq!(principal.principal, "alice");
    assert!(principal.has_role("admin"));

    Ok(())
}

#[tokio::test]
async fn test_expired_identity_cannot_resume() -> anyhow::Result<()> {
    let config = test_config().role_retry_window(Duration::from_millis(50));
    let roles = Arc::new(FlakyRoleResolver::default());
    roles.fail();

    let engine = engine_with(
        &config,
        Arc::new(provisioned_store(&config)?),
        roles.clone(),
        Arc::new(InMemoryLockoutRepository::new()),
    )?;

    let session = engine.authenticate("alice", "correct horse").await;
    let identity = session
        .into_failure()
        .and_then(LoginFailure::into_verified_identity)
        .expect("verified identity");

    roles.recover();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let resumed = engine.resume(identity).await;
    assert_eq!(resumed.failure_kind(), Some(FailureKind::InvalidCredentials));

    Ok(())
}

#[tokio::test]
async fn test_password_change_revokes_pending_identity() -> anyhow::Result<()> {
    let config = test_config();
    let roles = Arc::new(FlakyRoleResolver::default());
    roles.inner.grant("alice", ["admin"]);
    roles.fail();

    let engine = engine_with(
        &config,
        Arc::new(provisioned_store(&config)?),
        roles.clone(),
        Arc::new(InMemoryLockoutRepository::new()),
    )?;

    let identity = engine
        .authenticate("alice", "correct horse")
        .await
        .into_failure()
        .and_then(LoginFailure::into_verified_identity)
        .expect("verified identity");

    engine.change_password("alice", "battery staple").await?;
    roles.recover();

    let resumed = engine.resume(identity).await;
    assert_eq!(resumed.failure_kind(), Some(FailureKind::InvalidCredentials));

    // The new password still logs in normally
    let session = engine.authenticate("alice", "battery staple").await;
    assert!(session.principal().expect("principal").has_role("admin"));

    Ok(())
}

#[tokio::test]
async fn test_resume_fails_closed_when_store_is_down() -> anyhow::Result<()> {
    let config = test_config().lookup_timeout(Duration::from_millis(50));
    let store = Arc::new(SlowCredentialStore::new(
        provisioned_store(&config)?,
        Duration::ZERO,
    ));
    let roles = Arc::new(FlakyRoleResolver::default());
    roles.fail();

    let engine = engine_with(
        &config,
        store.clone(),
        roles.clone(),
        Arc::new(InMemoryLockoutRepository::new()),
    )?;

    let identity = engine
        .authenticate("alice", "correct horse")
        .await
        .into_failure()
        .and_then(LoginFailure::into_verified_identity)
        .expect("verified identity");

    store.set_delay(Duration::from_millis(500));
    roles.recover();

    let resumed = engine.resume(identity).await;
    assert_eq!(resumed.failure_kind(), Some(FailureKind::StoreUnavailable));

    Ok(())
}

#[tokio::test]
async fn test_migration_write_failure_keeps_login() -> anyhow::Result<()> {
    let config = test_config();
    let legacy = PasswordHasherService::new(
        AlgorithmId::Pbkdf2Sha256,
        PasswordPolicy::new().iterations(1_000),
    )?
    .hash_credential("bob", "tr0ub4dor&3")?;
    let store = Arc::new(ReadOnlyCredentialStore {
        inner: InMemoryCredentialStore::with_credentials([legacy]),
    });

    let engine = engine_with(
        &config,
        store.clone(),
        Arc::new(StaticRoleResolver::new()),
        Arc::new(InMemoryLockoutRepository::new()),
    )?;

    assert!(engine.authenticate("bob", "tr0ub4dor&3").await.is_authenticated());
    assert!(store.inner.get("bob").expect("credential").is_legacy());

    let err = engine
        .change_password("bob", "NewPass1")
        .await
        .expect_err("read-only store");
    assert!(matches!(err, AuthError::StoreUnavailable(_)));

    Ok(())
}

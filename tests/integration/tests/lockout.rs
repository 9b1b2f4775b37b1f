//! Lockout and backoff tests.

use std::sync::Arc;
use std::time::Duration;

use amx_auth::{FailureKind, LoginFailure};
use amx_core::EventType;
use amx_storage::{InMemoryCredentialStore, InMemoryLockoutRepository, StaticRoleResolver};

use crate::common::{TestEnv, engine_with, test_config};

#[tokio::test]
async fn test_threshold_locks_account() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &["user"])?;

    for attempt in 1..=5 {
        let session = env.engine.authenticate("alice", "wrong").await;
        assert_eq!(
            session.failure_kind(),
            Some(FailureKind::InvalidCredentials),
            "attempt {attempt} should be rejected as invalid"
        );
    }

    // Correct password is rejected while locked
    let session = env.engine.authenticate("alice", "correct horse").await;
    let Some(LoginFailure::AccountLocked { until }) = session.failure() else {
        panic!("expected a locked account, got {session:?}");
    };

    let state = env.lockout("alice").await?.expect("lockout state");
    assert_eq!(state.consecutive_failures, 5);
    assert_eq!(state.locked_until, Some(*until));

    assert_eq!(env.events.count(EventType::AccountLocked), 1);

    Ok(())
}

#[tokio::test]
async fn test_locked_and_invalid_share_public_message() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &[])?;

    let invalid = env.engine.authenticate("alice", "wrong").await;
    for _ in 0..4 {
        env.engine.authenticate("alice", "wrong").await;
    }
    let locked = env.engine.authenticate("alice", "wrong").await;

    assert_eq!(locked.failure_kind(), Some(FailureKind::AccountLocked));
    assert_eq!(
        invalid.failure().expect("failure").public_message(),
        locked.failure().expect("failure").public_message()
    );

    Ok(())
}

#[tokio::test]
async fn test_success_resets_failures_below_threshold() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &[])?;

    for _ in 0..4 {
        env.engine.authenticate("alice", "wrong").await;
    }
    assert_eq!(
        env.lockout("alice").await?.expect("state").consecutive_failures,
        4
    );

    assert!(env.engine.authenticate("alice", "correct horse").await.is_authenticated());
    assert!(env.lockout("alice").await?.is_none());

    // A full new run of four failures still does not lock
    for _ in 0..4 {
        env.engine.authenticate("alice", "wrong").await;
    }
    assert!(env.engine.authenticate("alice", "correct horse").await.is_authenticated());

    Ok(())
}

#[tokio::test]
async fn test_lock_expires() -> anyhow::Result<()> {
    let config = test_config()
        .lockout_threshold(3)
        .lockout_delays(Duration::from_millis(200), Duration::from_secs(1));
    let env = TestEnv::with_config(&config)?;
    env.add_user("alice", "correct horse", &[])?;

    for _ in 0..3 {
        env.engine.authenticate("alice", "wrong").await;
    }
    let locked = env.engine.authenticate("alice", "correct horse").await;
    assert_eq!(locked.failure_kind(), Some(FailureKind::AccountLocked));

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(env.engine.authenticate("alice", "correct horse").await.is_authenticated());
    assert!(env.lockout("alice").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_backoff_doubles_after_expiry() -> anyhow::Result<()> {
    let config = test_config()
        .lockout_threshold(2)
        .lockout_delays(Duration::from_millis(100), Duration::from_secs(60));
    let env = TestEnv::with_config(&config)?;
    env.add_user("alice", "correct horse", &[])?;

    for _ in 0..2 {
        env.engine.authenticate("alice", "wrong").await;
    }
    let first = env.lockout("alice").await?.expect("state");

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Failure after the lock expired extends the count and doubles the delay
    env.engine.authenticate("alice", "wrong").await;
    let second = env.lockout("alice").await?.expect("state");
    assert_eq!(second.consecutive_failures, 3);

    let first_until = first.locked_until.expect("locked");
    let second_until = second.locked_until.expect("locked");
    assert!(second_until - first_until > chrono::TimeDelta::milliseconds(150));

    assert_eq!(env.events.count(EventType::AccountLocked), 2);

    Ok(())
}

#[tokio::test]
async fn test_unknown_user_is_locked_like_known_user() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    for _ in 0..5 {
        let session = env.engine.authenticate("ghost", "guess").await;
        assert_eq!(session.failure_kind(), Some(FailureKind::InvalidCredentials));
    }

    let session = env.engine.authenticate("ghost", "guess").await;
    assert_eq!(session.failure_kind(), Some(FailureKind::AccountLocked));

    let state = env.lockout("ghost").await?.expect("state");
    assert_eq!(state.consecutive_failures, 5);

    Ok(())
}

#[tokio::test]
async fn test_unlock_restores_access() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &[])?;

    for _ in 0..5 {
        env.engine.authenticate("alice", "wrong").await;
    }
    env.engine.unlock("alice").await?;

    assert!(env.lockout("alice").await?.is_none());
    assert!(env.engine.authenticate("alice", "correct horse").await.is_authenticated());
    assert_eq!(env.events.count(EventType::AccountUnlocked), 1);

    Ok(())
}

#[tokio::test]
async fn test_guessed_usernames_are_not_retained_forever() -> anyhow::Result<()> {
    let config = test_config();
    let lockouts = Arc::new(InMemoryLockoutRepository::with_retention(
        Duration::from_millis(100),
    ));
    let engine = engine_with(
        &config,
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(StaticRoleResolver::new()),
        lockouts.clone(),
    )?;

    for i in 0..20 {
        engine.authenticate(&format!("guess-{i}"), "x").await;
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.authenticate("one-more", "x").await;

    assert_eq!(lockouts.len(), 1);
    let state = engine.lockout_state("one-more").await?.expect("tracked");
    assert_eq!(state.consecutive_failures, 1);

    Ok(())
}

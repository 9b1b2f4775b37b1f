//! Login and role resolution tests.

use amx_auth::{FailureKind, LoginFailure};
use amx_core::{EventOutcome, EventType};

use crate::common::TestEnv;

#[tokio::test]
async fn test_login_resolves_roles() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &["admin", "user"])?;

    let session = env.engine.authenticate("alice", "correct horse").await;

    assert!(session.is_authenticated());
    let principal = session.principal().expect("principal");
    assert_eq!(principal.principal, "alice");
    assert_eq!(
        session.roles().expect("roles").iter().collect::<Vec<_>>(),
        vec!["admin", "user"]
    );

    let logins = env.events.of_type(EventType::Login);
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].outcome, EventOutcome::Success);
    assert_eq!(logins[0].session_id, Some(principal.session_id));
    assert_eq!(logins[0].detail("roles"), Some("2"));

    Ok(())
}

#[tokio::test]
async fn test_roles_are_resolved_on_every_login() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &["admin", "user"])?;

    let first = env.engine.authenticate("alice", "correct horse").await;
    assert!(first.principal().expect("principal").has_role("admin"));

    env.roles.revoke("alice", "admin");

    let second = env.engine.authenticate("alice", "correct horse").await;
    let principal = second.principal().expect("principal");
    assert!(!principal.has_role("admin"));
    assert!(principal.has_role("user"));

    // Each login is its own session
    assert_ne!(
        first.principal().expect("principal").session_id,
        principal.session_id
    );

    Ok(())
}

#[tokio::test]
async fn test_user_without_roles_authenticates() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("carol", "p4ssword", &[])?;

    let session = env.engine.authenticate("carol", "p4ssword").await;

    assert!(session.is_authenticated());
    assert!(session.roles().expect("roles").is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unknown_user_gets_invalid_credentials() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &["user"])?;

    let unknown = env.engine.authenticate("mallory", "correct horse").await;
    let wrong = env.engine.authenticate("alice", "battery staple").await;

    assert_eq!(unknown.failure(), Some(&LoginFailure::InvalidCredentials));
    assert_eq!(wrong.failure(), Some(&LoginFailure::InvalidCredentials));
    assert_eq!(unknown.failure_kind(), Some(FailureKind::InvalidCredentials));

    let errors = env.events.of_type(EventType::LoginError);
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| e.error.as_deref() == Some("invalid_credentials")));

    Ok(())
}

#[tokio::test]
async fn test_failed_login_converts_to_error() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.add_user("alice", "correct horse", &[])?;

    let result = env
        .engine
        .authenticate("alice", "wrong")
        .await
        .into_result();

    let err = result.expect_err("wrong password must fail");
    assert_eq!(err.to_string(), "invalid credentials");

    Ok(())
}

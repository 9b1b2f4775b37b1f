//! Timing equalization between unknown users and wrong passwords.

use std::time::{Duration, Instant};

use amx_auth::FailureKind;

use crate::common::{TestEnv, test_config};

const ROUNDS: u32 = 8;

#[tokio::test]
async fn test_unknown_user_costs_a_hash() -> anyhow::Result<()> {
    // Hashing must dominate the attempt for the comparison to mean anything
    let config = test_config().argon2_cost(4096, 2, 1).lockout_threshold(100);
    let env = TestEnv::with_config(&config)?;
    env.add_user("alice", "correct horse", &[])?;

    // Warm up the blocking pool
    env.engine.authenticate("alice", "wrong").await;

    let mut wrong = Duration::ZERO;
    let mut unknown = Duration::ZERO;
    for _ in 0..ROUNDS {
        let start = Instant::now();
        let session = env.engine.authenticate("alice", "wrong").await;
        wrong += start.elapsed();
        assert_eq!(session.failure_kind(), Some(FailureKind::InvalidCredentials));

        let start = Instant::now();
        let session = env.engine.authenticate("mallory", "wrong").await;
        unknown += start.elapsed();
        assert_eq!(session.failure_kind(), Some(FailureKind::InvalidCredentials));
    }

    let wrong = wrong / ROUNDS;
    let unknown = unknown / ROUNDS;
    assert!(
        unknown * 2 >= wrong && unknown <= wrong * 2,
        "unknown user took {unknown:?}, wrong password took {wrong:?}"
    );

    Ok(())
}

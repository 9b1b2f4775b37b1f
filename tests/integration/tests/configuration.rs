//! Configuration loading and engine construction tests.

use std::time::Duration;

use amx_auth::AuthError;
use amx_core::AuthConfig;
use amx_model::AlgorithmId;

use crate::common::TestEnv;

const TOML: &str = r#"
lookup_timeout = { secs = 1, nanos = 0 }

[hashing]
algorithm = "pbkdf2-sha256"
iterations = 2000

[lockout]
threshold = 3
base_delay = { secs = 10, nanos = 0 }
max_delay = { secs = 60, nanos = 0 }
"#;

#[tokio::test]
async fn test_engine_from_toml() -> anyhow::Result<()> {
    let config = AuthConfig::from_toml_str(TOML)?;
    assert_eq!(config.lookup_timeout, Duration::from_secs(1));
    assert_eq!(config.lockout.threshold, 3);

    let env = TestEnv::with_config(&config)?;
    assert_eq!(env.engine.hasher().algorithm(), AlgorithmId::Pbkdf2Sha256);

    env.add_user("alice", "correct horse", &[])?;
    let credential = env.store.get("alice").expect("credential");
    assert_eq!(credential.algorithm, AlgorithmId::Pbkdf2Sha256);
    assert_eq!(credential.params.iterations, 2000);

    assert!(env.engine.authenticate("alice", "correct horse").await.is_authenticated());

    Ok(())
}

#[test]
fn test_unknown_algorithm_fails_construction() -> anyhow::Result<()> {
    let config = AuthConfig::from_toml_str("[hashing]\nalgorithm = \"sha1-crypt\"\n")?;

    let err = TestEnv::with_config(&config)
        .err()
        .expect("unknown algorithm must be rejected");

    let err = err.downcast::<AuthError>()?;
    assert!(matches!(err, AuthError::UnsupportedAlgorithm(ref id) if id == "sha1-crypt"));
    assert!(err.is_configuration_error());

    Ok(())
}

#[test]
fn test_invalid_toml_values_are_rejected() {
    assert!(AuthConfig::from_toml_str("[lockout]\nthreshold = 0\n").is_err());
    assert!(AuthConfig::from_toml_str("[hashing]\nsalt_length = 8\n").is_err());
    assert!(AuthConfig::from_toml_str("lookup_timeout = \"soon\"\n").is_err());
}

//! Configuration for the authentication engine.
//!
//! Supports loading configuration from TOML documents and files, with
//! defaults for every option. Durations are serialized the way `serde`
//! serializes [`Duration`] (`{ secs = .., nanos = .. }`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Algorithm id used for new credentials unless configured otherwise.
pub const DEFAULT_ALGORITHM: &str = "argon2id";

/// Secret hashed into the decoy credential unless configured otherwise.
///
/// The decoy is only ever used to spend verification time for unknown
/// usernames. It never authenticates anyone.
pub const DEFAULT_DECOY_SECRET: &str = "secret";

/// Minimum salt length in bytes.
pub const MIN_SALT_LENGTH: usize = 16;

/// Maximum salt length in bytes.
pub const MAX_SALT_LENGTH: usize = 64;

/// Main configuration structure for the authentication engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Password hashing configuration.
    pub hashing: HashingConfig,
    /// Account lockout configuration.
    pub lockout: LockoutConfig,
    /// Upper bound for every collaborator call (credential store, role
    /// resolver, lockout repository).
    pub lookup_timeout: Duration,
    /// How long a verified identity may be used to retry role resolution.
    pub role_retry_window: Duration,
    /// Secret hashed into the timing decoy credential.
    pub decoy_secret: String,
}

/// Password hashing configuration.
///
/// `memory_cost_kib`, `time_cost` and `parallelism` apply to Argon2id;
/// `iterations` applies to PBKDF2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Algorithm id for newly hashed credentials (`argon2id`, `pbkdf2-sha256`).
    pub algorithm: String,
    /// Argon2 memory cost in KiB.
    pub memory_cost_kib: u32,
    /// Argon2 time cost (passes).
    pub time_cost: u32,
    /// Argon2 parallelism (lanes).
    pub parallelism: u32,
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Salt length in bytes.
    pub salt_length: usize,
}

/// Account lockout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Consecutive failures before an account is locked.
    pub threshold: u32,
    /// Lock duration when the threshold is first reached.
    pub base_delay: Duration,
    /// Cap on the exponentially growing lock duration.
    pub max_delay: Duration,
}

impl Default for HashingConfig {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            algorithm: DEFAULT_ALGORITHM.to_string(),
            memory_cost_kib: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            iterations: 27_500,
            salt_length: MIN_SALT_LENGTH,
        }
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(15 * 60),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            hashing: HashingConfig::default(),
            lockout: LockoutConfig::default(),
            lookup_timeout: Duration::from_secs(5),
            role_retry_window: Duration::from_secs(5 * 60),
            decoy_secret: DEFAULT_DECOY_SECRET.to_string(),
        }
    }
}

impl AuthConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a configuration from a TOML document.
    ///
    /// Missing keys take their default values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "authentication configuration loaded");
        Ok(config)
    }

    /// Sets the hashing algorithm id for new credentials.
    #[must_use]
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.hashing.algorithm = algorithm.into();
        self
    }

    /// Sets the Argon2 work factor.
    #[must_use]
    pub const fn argon2_cost(
        mut self,
        memory_cost_kib: u32,
        time_cost: u32,
        parallelism: u32,
    ) -> Self {
        self.hashing.memory_cost_kib = memory_cost_kib;
        self.hashing.time_cost = time_cost;
        self.hashing.parallelism = parallelism;
        self
    }

    /// Sets the PBKDF2 iteration count.
    #[must_use]
    pub const fn pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.hashing.iterations = iterations;
        self
    }

    /// Sets the number of consecutive failures before lockout.
    #[must_use]
    pub const fn lockout_threshold(mut self, threshold: u32) -> Self {
        self.lockout.threshold = threshold;
        self
    }

    /// Sets the lockout backoff bounds.
    #[must_use]
    pub const fn lockout_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.lockout.base_delay = base_delay;
        self.lockout.max_delay = max_delay;
        self
    }

    /// Sets the collaborator call timeout.
    #[must_use]
    pub const fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Sets the role resolution retry window.
    #[must_use]
    pub const fn role_retry_window(mut self, window: Duration) -> Self {
        self.role_retry_window = window;
        self
    }

    /// Sets the decoy secret.
    #[must_use]
    pub fn decoy_secret(mut self, secret: impl Into<String>) -> Self {
        self.decoy_secret = secret.into();
        self
    }

    /// Validates the configuration.
    ///
    /// The algorithm id is not checked here; it is resolved against the
    /// supported algorithms when the engine is built.
    pub fn validate(&self) -> Result<()> {
        self.hashing.validate()?;
        self.lockout.validate()?;

        if self.lookup_timeout.is_zero() {
            return Err(Error::config("lookup_timeout must be greater than zero"));
        }
        if self.role_retry_window.is_zero() {
            return Err(Error::config("role_retry_window must be greater than zero"));
        }
        if self.decoy_secret.is_empty() {
            return Err(Error::config("decoy_secret cannot be empty"));
        }

        Ok(())
    }
}

impl HashingConfig {
    /// Validates the hashing parameters.
    pub fn validate(&self) -> Result<()> {
        if self.algorithm.trim().is_empty() {
            return Err(Error::config("hashing.algorithm cannot be empty"));
        }
        if self.parallelism == 0 {
            return Err(Error::config("hashing.parallelism must be at least 1"));
        }
        // Argon2 needs 8 KiB per lane
        if self.memory_cost_kib < self.parallelism.saturating_mul(8) {
            return Err(Error::config(
                "hashing.memory_cost_kib must be at least 8 * parallelism",
            ));
        }
        if self.time_cost == 0 {
            return Err(Error::config("hashing.time_cost must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(Error::config("hashing.iterations must be at least 1"));
        }
        if !(MIN_SALT_LENGTH..=MAX_SALT_LENGTH).contains(&self.salt_length) {
            return Err(Error::config(format!(
                "hashing.salt_length must be between {MIN_SALT_LENGTH} and {MAX_SALT_LENGTH} bytes"
            )));
        }
        Ok(())
    }
}

impl LockoutConfig {
    /// Validates the lockout bounds.
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(Error::config("lockout.threshold must be at least 1"));
        }
        if self.base_delay.is_zero() {
            return Err(Error::config("lockout.base_delay must be greater than zero"));
        }
        if self.max_delay < self.base_delay {
            return Err(Error::config(
                "lockout.max_delay must not be shorter than lockout.base_delay",
            ));
        }
        Ok(())
    }
}

//! Credential domain model.
//!
//! A credential is the stored, one-way transformed form of a user's
//! password together with everything needed to recompute it: algorithm,
//! scheme version, salt and cost parameters.
//!
//! ## Security Note
//!
//! `salt` and `hash` are not secret in the cryptographic sense, but they
//! enable offline guessing and must never be logged. The `Debug` impl only
//! prints their lengths.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when an algorithm id is not supported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported password hashing algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

/// Password hashing algorithm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmId {
    /// Argon2id (memory-hard). Current scheme.
    #[serde(rename = "argon2id")]
    Argon2id,
    /// PBKDF2 with HMAC-SHA256. Legacy scheme, verified and migrated.
    #[serde(rename = "pbkdf2-sha256")]
    Pbkdf2Sha256,
}

impl AlgorithmId {
    /// Returns the stable string id used in storage and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Argon2id => "argon2id",
            Self::Pbkdf2Sha256 => "pbkdf2-sha256",
        }
    }

    /// Returns the scheme version tag for this algorithm.
    ///
    /// Higher versions supersede lower ones; a credential whose version is
    /// below the configured algorithm's version is migrated on login.
    #[must_use]
    pub const fn scheme_version(self) -> u32 {
        match self {
            Self::Pbkdf2Sha256 => 1,
            Self::Argon2id => 2,
        }
    }

    /// Returns true if this algorithm is memory-hard.
    #[must_use]
    pub const fn is_memory_hard(self) -> bool {
        matches!(self, Self::Argon2id)
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2id" => Ok(Self::Argon2id),
            "pbkdf2-sha256" => Ok(Self::Pbkdf2Sha256),
            _ => Err(UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Work factor parameters recorded with a credential.
///
/// Argon2id uses `memory_cost_kib`, `time_cost` and `parallelism`;
/// PBKDF2 uses `iterations`. Unused fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HashParams {
    /// Argon2 memory cost in KiB.
    #[serde(default)]
    pub memory_cost_kib: u32,
    /// Argon2 time cost (passes).
    #[serde(default)]
    pub time_cost: u32,
    /// Argon2 parallelism (lanes).
    #[serde(default)]
    pub parallelism: u32,
    /// PBKDF2 iteration count.
    #[serde(default)]
    pub iterations: u32,
}

impl HashParams {
    /// Creates Argon2 parameters.
    #[must_use]
    pub const fn argon2(memory_cost_kib: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost_kib,
            time_cost,
            parallelism,
            iterations: 0,
        }
    }

    /// Creates PBKDF2 parameters.
    #[must_use]
    pub const fn pbkdf2(iterations: u32) -> Self {
        Self {
            memory_cost_kib: 0,
            time_cost: 0,
            parallelism: 0,
            iterations,
        }
    }

    /// Returns true if the parameters relevant to `algorithm` are equal.
    #[must_use]
    pub const fn matches_for(&self, other: &Self, algorithm: AlgorithmId) -> bool {
        match algorithm {
            AlgorithmId::Argon2id => {
                self.memory_cost_kib == other.memory_cost_kib
                    && self.time_cost == other.time_cost
                    && self.parallelism == other.parallelism
            }
            AlgorithmId::Pbkdf2Sha256 => self.iterations == other.iterations,
        }
    }
}

/// A stored password credential.
///
/// Immutable once stored; replaced wholesale on password change or
/// migration to a newer scheme.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Username this credential belongs to (unique).
    pub username: String,
    /// Hashing algorithm.
    pub algorithm: AlgorithmId,
    /// Scheme version of `algorithm` at hashing time.
    pub version: u32,
    /// Work factor used at hashing time.
    pub params: HashParams,
    /// Random salt.
    pub salt: Vec<u8>,
    /// Derived hash.
    pub hash: Vec<u8>,
    /// When the credential was created.
    pub created_at: DateTime<Utc>,
}

impl Credential {
    /// Creates a new credential, tagged with the algorithm's scheme version.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        algorithm: AlgorithmId,
        params: HashParams,
        salt: Vec<u8>,
        hash: Vec<u8>,
    ) -> Self {
        Self {
            username: username.into(),
            algorithm,
            version: algorithm.scheme_version(),
            params,
            salt,
            hash,
            created_at: Utc::now(),
        }
    }

    /// Returns true if this credential was produced by a legacy scheme.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        !self.algorithm.is_memory_hard()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("algorithm", &self.algorithm)
            .field("version", &self.version)
            .field("params", &self.params)
            .field("salt_len", &self.salt.len())
            .field("hash_len", &self.hash.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}

//! Password hashing and verification.
//!
//! Implements NIST SP 800-63B password recommendations:
//! - Argon2id for memory-hard hashing
//! - Secure random salt generation (at least 16 bytes)
//! - Constant-time comparison
//!
//! Credentials stored under the legacy PBKDF2-HMAC-SHA256 scheme still
//! verify; [`PasswordHasherService::needs_rehash`] tells the engine to
//! re-hash them under the current scheme after a successful login.

use amx_core::HashingConfig;
use amx_crypto::{generate_salt, pbkdf2_sha256};
use amx_model::{AlgorithmId, Credential, HashParams};
use argon2::{Algorithm, Argon2, Params, Version, password_hash::Output};

use crate::error::{AuthError, AuthResult};

/// Length of newly derived hashes in bytes.
pub const HASH_LENGTH: usize = 32;

/// Accepted length range for stored hashes.
const STORED_HASH_LENGTH: std::ops::RangeInclusive<usize> = 16..=64;

/// Password hashing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Argon2 memory cost in KiB.
    pub memory_cost: u32,
    /// Argon2 time cost (iterations).
    pub time_cost: u32,
    /// Argon2 parallelism factor.
    pub parallelism: u32,
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Output hash length.
    pub hash_length: usize,
    /// Salt length.
    pub salt_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id and PBKDF2-SHA256
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            iterations: 27_500,
            hash_length: HASH_LENGTH,
            salt_length: 16,
        }
    }
}

impl PasswordPolicy {
    /// Creates a new password policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy from the hashing section of the configuration.
    #[must_use]
    pub fn from_config(config: &HashingConfig) -> Self {
        Self {
            memory_cost: config.memory_cost_kib,
            time_cost: config.time_cost,
            parallelism: config.parallelism,
            iterations: config.iterations,
            hash_length: HASH_LENGTH,
            salt_length: config.salt_length,
        }
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }

    /// Sets the PBKDF2 iteration count.
    #[must_use]
    pub const fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Returns the work factor this policy applies to `algorithm`.
    #[must_use]
    pub const fn params_for(&self, algorithm: AlgorithmId) -> HashParams {
        match algorithm {
            AlgorithmId::Argon2id => {
                HashParams::argon2(self.memory_cost, self.time_cost, self.parallelism)
            }
            AlgorithmId::Pbkdf2Sha256 => HashParams::pbkdf2(self.iterations),
        }
    }
}

/// Password hasher for all supported schemes.
///
/// New credentials are always produced with the configured algorithm;
/// verification follows whatever algorithm and parameters a stored
/// credential records.
#[derive(Debug, Clone)]
pub struct PasswordHasherService {
    algorithm: AlgorithmId,
    policy: PasswordPolicy,
}

impl PasswordHasherService {
    /// Creates a new password hasher for `algorithm` with the given policy.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidConfiguration` if the policy's work factor
    /// is rejected by the algorithm.
    pub fn new(algorithm: AlgorithmId, policy: PasswordPolicy) -> AuthResult<Self> {
        if policy.salt_length < 16 {
            return Err(AuthError::InvalidConfiguration(
                "salt length must be at least 16 bytes".to_string(),
            ));
        }
        if !STORED_HASH_LENGTH.contains(&policy.hash_length) {
            return Err(AuthError::InvalidConfiguration(format!(
                "hash length must be between {} and {} bytes",
                STORED_HASH_LENGTH.start(),
                STORED_HASH_LENGTH.end()
            )));
        }
        match algorithm {
            AlgorithmId::Argon2id => {
                Params::new(
                    policy.memory_cost,
                    policy.time_cost,
                    policy.parallelism,
                    Some(policy.hash_length),
                )
                .map_err(|e| AuthError::InvalidConfiguration(e.to_string()))?;
            }
            AlgorithmId::Pbkdf2Sha256 => {
                if policy.iterations == 0 {
                    return Err(AuthError::InvalidConfiguration(
                        "PBKDF2 iterations must be at least 1".to_string(),
                    ));
                }
            }
        }
        Ok(Self { algorithm, policy })
    }

    /// Creates an Argon2id hasher with the default policy.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            algorithm: AlgorithmId::Argon2id,
            policy: PasswordPolicy::default(),
        }
    }

    /// Creates a hasher from the hashing section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAlgorithm` for an unknown algorithm id.
    pub fn from_config(config: &HashingConfig) -> AuthResult<Self> {
        let algorithm: AlgorithmId = config.algorithm.parse()?;
        Self::new(algorithm, PasswordPolicy::from_config(config))
    }

    /// Returns the algorithm used for new credentials.
    #[must_use]
    pub const fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hashes a password under `algorithm` with a fresh salt.
    ///
    /// Returns `(salt, hash)`.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hash(&self, plaintext: &str, algorithm: AlgorithmId) -> AuthResult<(Vec<u8>, Vec<u8>)> {
        let salt = generate_salt(self.policy.salt_length);
        let params = self.policy.params_for(algorithm);
        let hash = derive(plaintext, &salt, algorithm, &params, self.policy.hash_length)?;
        Ok((salt, hash))
    }

    /// Verifies a password against a salt and hash produced under
    /// `algorithm` with this service's policy.
    ///
    /// Uses constant-time comparison to prevent timing attacks.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored hash is malformed or derivation fails.
    pub fn verify(
        &self,
        plaintext: &str,
        salt: &[u8],
        hash: &[u8],
        algorithm: AlgorithmId,
    ) -> AuthResult<bool> {
        verify_with(plaintext, salt, hash, algorithm, &self.policy.params_for(algorithm))
    }

    /// Hashes a password into a complete credential under the configured
    /// algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hash_credential(&self, username: &str, plaintext: &str) -> AuthResult<Credential> {
        let (salt, hash) = self.hash(plaintext, self.algorithm)?;
        Ok(Credential::new(
            username,
            self.algorithm,
            self.policy.params_for(self.algorithm),
            salt,
            hash,
        ))
    }

    /// Verifies a password against a stored credential, using the
    /// algorithm and parameters recorded in it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAlgorithm` if the credential carries a
    /// scheme version this build does not know.
    pub fn verify_credential(&self, plaintext: &str, credential: &Credential) -> AuthResult<bool> {
        if credential.version != credential.algorithm.scheme_version() {
            return Err(AuthError::UnsupportedAlgorithm(format!(
                "{} v{}",
                credential.algorithm, credential.version
            )));
        }
        verify_with(
            plaintext,
            &credential.salt,
            &credential.hash,
            credential.algorithm,
            &credential.params,
        )
    }

    /// Checks if a credential needs to be re-hashed due to policy changes.
    ///
    /// Returns `true` if the credential was created with a different
    /// algorithm, scheme version, work factor or a shorter salt.
    #[must_use]
    pub fn needs_rehash(&self, credential: &Credential) -> bool {
        if credential.algorithm != self.algorithm {
            return true;
        }

        if credential.version != self.algorithm.scheme_version() {
            return true;
        }

        let current = self.policy.params_for(self.algorithm);
        if !credential.params.matches_for(&current, self.algorithm) {
            return true;
        }

        credential.salt.len() < self.policy.salt_length
    }
}

impl Default for PasswordHasherService {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn verify_with(
    plaintext: &str,
    salt: &[u8],
    hash: &[u8],
    algorithm: AlgorithmId,
    params: &HashParams,
) -> AuthResult<bool> {
    if !STORED_HASH_LENGTH.contains(&hash.len()) {
        return Err(AuthError::Internal(format!(
            "stored hash has invalid length {}",
            hash.len()
        )));
    }

    let candidate = derive(plaintext, salt, algorithm, params, hash.len())?;
    Ok(constant_time_eq(&candidate, hash))
}

fn derive(
    plaintext: &str,
    salt: &[u8],
    algorithm: AlgorithmId,
    params: &HashParams,
    output_len: usize,
) -> AuthResult<Vec<u8>> {
    match algorithm {
        AlgorithmId::Argon2id => {
            let params = Params::new(
                params.memory_cost_kib,
                params.time_cost,
                params.parallelism,
                Some(output_len),
            )
            .map_err(|e| AuthError::Internal(e.to_string()))?;

            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

            let mut out = vec![0u8; output_len];
            argon2
                .hash_password_into(plaintext.as_bytes(), salt, &mut out)
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            Ok(out)
        }
        AlgorithmId::Pbkdf2Sha256 => Ok(pbkdf2_sha256(
            plaintext.as_bytes(),
            salt,
            params.iterations,
            output_len,
        )?),
    }
}

/// `Output` equality is constant-time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    match (Output::new(a), Output::new(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

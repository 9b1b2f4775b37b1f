//! Legacy key derivation for credential migration.
//!
//! **WARNING**: PBKDF2 is not memory-hard. It is provided solely so that
//! credentials stored under the legacy scheme can still be verified and
//! then re-hashed with Argon2id on the next successful login.

use hmac::Hmac;
use sha2::Sha256;
use thiserror::Error;

/// Errors raised by the legacy derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Iteration count was zero.
    #[error("PBKDF2 iteration count must be at least 1")]
    ZeroIterations,
    /// The PRF rejected its key.
    #[error("PBKDF2 PRF rejected the key length")]
    InvalidKeyLength,
}

/// Derives `output_len` bytes with PBKDF2-HMAC-SHA256.
///
/// # Arguments
///
/// * `password` - Plaintext password bytes
/// * `salt` - Salt bytes
/// * `iterations` - Iteration count (work factor)
/// * `output_len` - Length of the derived key
pub fn pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Result<Vec<u8>, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::ZeroIterations);
    }

    let mut buf = vec![0u8; output_len];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, buf.as_mut_slice())
        .map_err(|_| CryptoError::InvalidKeyLength)?;
    Ok(buf)
}

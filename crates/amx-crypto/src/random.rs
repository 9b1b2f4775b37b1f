//! Cryptographically secure random generation.
//!
//! All functions use the thread-local random number generator, which is a
//! CSPRNG seeded from the operating system.

use rand::Rng;

/// Generates a cryptographically secure random byte array.
///
/// # Arguments
///
/// * `len` - Number of random bytes to generate
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a fresh password salt.
///
/// # Panics
///
/// Panics if `len` is below 16 bytes. Salt length is validated with the
/// configuration, so this only fires on programming errors.
#[must_use]
pub fn generate_salt(len: usize) -> Vec<u8> {
    assert!(len >= 16, "salt must be at least 16 bytes");
    random_bytes(len)
}

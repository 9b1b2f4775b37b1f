//! # amx-crypto
//!
//! Cryptographic primitives for the amx authentication engine.
//!
//! - [`random`] - CSPRNG salts and byte strings
//! - [`legacy`] - PBKDF2-HMAC-SHA256 derivation for credentials stored
//!   under the legacy scheme
//!
//! Memory-hard hashing (Argon2id) lives next to the password service in
//! `amx-auth`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod legacy;
pub mod random;

pub use legacy::{CryptoError, pbkdf2_sha256};
pub use random::{generate_salt, random_bytes};

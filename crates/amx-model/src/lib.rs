//! # amx-model
//!
//! Domain models for the amx authentication engine.
//!
//! This crate defines the data that flows between the engine and its
//! collaborators: stored credentials, per-user lockout state and the
//! transient authentication attempt.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod attempt;
pub mod credential;
pub mod lockout;

pub use attempt::AuthenticationAttempt;
pub use credential::{AlgorithmId, Credential, HashParams, UnsupportedAlgorithm};
pub use lockout::LockoutState;

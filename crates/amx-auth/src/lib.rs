//! # amx-auth
//!
//! Credential verification, lockout and principal resolution for
//! pluggable login modules.
//!
//! ## Features
//!
//! - Argon2id password hashing (NIST SP 800-63B compliant)
//! - Transparent migration of legacy PBKDF2 credentials on login
//! - Exponential backoff lockout, tracked for unknown usernames too
//! - Per-username serialization of concurrent attempts
//! - Role resolution with retry via [`VerifiedIdentity`]
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - IA-2: Identification and Authentication
//! - IA-5: Authenticator Management
//! - AC-7: Unsuccessful Logon Attempts
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use amx_auth::AuthenticationEngine;
//! use amx_core::AuthConfig;
//! use amx_storage::{InMemoryCredentialStore, InMemoryLockoutRepository, StaticRoleResolver};
//!
//! let engine = AuthenticationEngine::new(
//!     &AuthConfig::default(),
//!     Arc::new(InMemoryCredentialStore::new()),
//!     Arc::new(StaticRoleResolver::new()),
//!     Arc::new(InMemoryLockoutRepository::new()),
//! )?;
//!
//! let session = engine.authenticate("alice", "hunter2").await;
//! if let Some(principal) = session.principal() {
//!     println!("{} has roles {:?}", principal.principal, principal.roles);
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod engine;
pub mod error;
pub mod gate;
pub mod lockout;
pub mod password;
pub mod session;

pub use engine::AuthenticationEngine;
pub use error::{AuthError, AuthResult};
pub use gate::{UserGate, UserGates};
pub use lockout::LockoutPolicy;
pub use password::{PasswordHasherService, PasswordPolicy};
pub use session::{
    AuthenticatedPrincipal, FailureKind, LoginFailure, LoginSession, VerifiedIdentity,
};

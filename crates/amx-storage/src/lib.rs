//! # amx-storage
//!
//! Collaborator interfaces for the amx authentication engine.
//!
//! The engine reaches credential directories, role directories and lockout
//! persistence only through the traits in this crate. Directory- and
//! database-backed variants implement them outside this workspace; the
//! in-memory variants here serve tests and single-node deployments.
//!
//! ## Provider Traits
//!
//! - [`CredentialStore`] - Credential lookup and replacement
//! - [`RoleResolver`] - Role membership lookup
//! - [`LockoutRepository`] - Lockout state persistence

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod credential;
pub mod error;
pub mod lockout;
pub mod memory;
pub mod role;

pub use credential::CredentialStore;
pub use error::{StorageError, StorageResult};
pub use lockout::LockoutRepository;
pub use memory::{InMemoryCredentialStore, InMemoryLockoutRepository, StaticRoleResolver};
pub use role::RoleResolver;

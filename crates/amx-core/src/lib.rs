//! # amx-core
//!
//! Core configuration, error handling and audit events for the amx
//! authentication engine.
//!
//! This crate provides the foundational types shared by every other
//! `amx-*` crate.
//!
//! ## Security Controls
//!
//! - Authentication feedback is generic (no user enumeration)
//! - Every login attempt produces a structured audit event

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::{AuthConfig, HashingConfig, LockoutConfig};
pub use error::{Error, Result};
pub use event::{Event, EventBuilder, EventListener, EventOutcome, EventType, TracingEventListener};

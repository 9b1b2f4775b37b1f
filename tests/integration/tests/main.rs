//! End-to-End Integration Tests
//!
//! These tests drive the authentication engine through its public surface
//! against in-memory and deliberately failing collaborators.

mod configuration;
mod lockout;
mod login;
mod resilience;
mod timing;

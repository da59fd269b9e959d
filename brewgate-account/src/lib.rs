//! # Brewgate Account Core
//!
//! Credential and session core for the Brewgate account service. This crate
//! verifies passwords against interchangeable hashing schemes, issues and
//! validates Ed25519-signed access/refresh token pairs, and keeps ephemeral
//! session records with automatic expiry.
//!
//! ## Module Organization
//!
//! - `account`: Account capability trait and immutable value types
//! - `auth`: Password hashing, token signing, and the authentication service
//! - `session`: Concurrency-safe expiring session stores
//! - `store`: Account repository boundary and in-memory backend
//! - `config`: Environment-driven configuration

pub mod account;
pub mod auth;
pub mod config;
pub mod session;
pub mod store;

/// Current version of the account core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

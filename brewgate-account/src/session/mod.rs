//! Expiring session stores
//!
//! A session store maps a token string to the account it represents, bounded
//! in time by an expiry instant. The trait is backend-agnostic; the in-memory
//! implementation in [`memory`] suits a single running instance, and an
//! external key-value backend can implement the same contract for anything
//! larger.

mod memory;

pub use memory::MemorySessionStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::SharedAccount;

/// Error type for session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The queried token string was empty
    #[error("empty token")]
    EmptyToken,

    /// No session for this token; it may have expired, or never existed
    #[error("session does not exist")]
    SessionNotExists,

    /// Failure in an external store backend
    #[error("session backend: {0}")]
    Backend(String),
}

/// Time-bounded associative store from token to account.
///
/// Records are never mutated in place: a refreshed access token creates a new
/// record rather than updating the old one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts the mapping and schedules its eviction at `expires_at`.
    async fn set(
        &self,
        session: SharedAccount,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError>;

    /// Looks up the account for `token`. Missing or already-evicted tokens
    /// are [`SessionError::SessionNotExists`].
    async fn get(&self, token: &str) -> Result<SharedAccount, SessionError>;

    /// Deletes the mapping. Removing an absent token is not an error.
    async fn remove(&self, token: &str) -> Result<(), SessionError>;
}

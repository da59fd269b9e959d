//! Account repository boundary
//!
//! The authentication service depends on exactly four repository operations;
//! everything else about account persistence lives behind this trait. The
//! in-memory backend in [`memory`] serves a single running instance and the
//! test harness.

mod memory;

pub use memory::MemoryAccountStore;

use async_trait::async_trait;

use crate::account::{Account, AccountType, Gender, SharedAccount};
use crate::auth::password::PasswordError;

/// Error type for account repository operations
#[derive(Debug, thiserror::Error)]
pub enum AccountStoreError {
    #[error("account not found")]
    NotFound,

    #[error("duplicate account entry")]
    DuplicateEntry,

    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Failure in an external repository backend
    #[error("account store backend: {0}")]
    Backend(String),
}

/// Registration input. The password arrives in plaintext and is hashed by
/// the store before anything is persisted.
#[derive(Debug, Clone)]
pub struct RawAccount {
    pub name: String,
    pub email: String,
    pub plain_password: String,
    pub gender: Gender,
    pub account_type: AccountType,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<SharedAccount, AccountStoreError>;

    /// Checks `plain_password` against the stored hash for the account's
    /// email. The account may be a bare lookup value; only its email is used.
    async fn validate_password(
        &self,
        account: &dyn Account,
        plain_password: &str,
    ) -> Result<bool, AccountStoreError>;

    async fn insert(&self, raw_account: RawAccount) -> Result<(), AccountStoreError>;

    async fn delete_by_email(&self, email: &str) -> Result<(), AccountStoreError>;
}

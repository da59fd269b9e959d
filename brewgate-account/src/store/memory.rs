//! In-memory account store
//!
//! Keeps hydrated accounts keyed by lowercased email, with password hashes
//! produced and checked by the injected hasher. Suits a single running
//! instance and the integration tests; a relational backend implements the
//! same trait for production persistence.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{AccountStore, AccountStoreError, RawAccount};
use crate::account::{Account, SharedAccount, StoredAccount};
use crate::auth::password::PasswordHasher;

struct AccountRecord {
    account: StoredAccount,
    hashed_password: String,
}

pub struct MemoryAccountStore {
    hasher: Arc<dyn PasswordHasher>,
    // keyed by lowercased email; lookups are case-insensitive
    accounts: DashMap<String, AccountRecord>,
    next_id: AtomicI64,
}

impl MemoryAccountStore {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            hasher,
            accounts: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl std::fmt::Debug for MemoryAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAccountStore")
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_by_email(&self, email: &str) -> Result<SharedAccount, AccountStoreError> {
        let record = self
            .accounts
            .get(&email_key(email))
            .ok_or(AccountStoreError::NotFound)?;
        Ok(Arc::new(record.account.clone()))
    }

    async fn validate_password(
        &self,
        account: &dyn Account,
        plain_password: &str,
    ) -> Result<bool, AccountStoreError> {
        let hashed_password = {
            let record = self
                .accounts
                .get(&email_key(&account.profile().email))
                .ok_or(AccountStoreError::NotFound)?;
            record.hashed_password.clone()
        };

        let validated = self.hasher.verify(plain_password, &hashed_password).await?;
        Ok(validated)
    }

    async fn insert(&self, raw_account: RawAccount) -> Result<(), AccountStoreError> {
        let key = email_key(&raw_account.email);
        if self.accounts.contains_key(&key) {
            return Err(AccountStoreError::DuplicateEntry);
        }

        let hashed_password = self.hasher.hash(&raw_account.plain_password).await?;

        let now = Utc::now();
        let account = StoredAccount {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: raw_account.name,
            email: raw_account.email,
            gender: raw_account.gender,
            account_type: raw_account.account_type,
            store_id: 0,
            email_validated: false,
            created_at: now,
            updated_at: now,
        };

        // a racing insert for the same email loses here
        match self.accounts.entry(key) {
            Entry::Occupied(_) => Err(AccountStoreError::DuplicateEntry),
            Entry::Vacant(vacant) => {
                vacant.insert(AccountRecord {
                    account,
                    hashed_password,
                });
                Ok(())
            }
        }
    }

    async fn delete_by_email(&self, email: &str) -> Result<(), AccountStoreError> {
        self.accounts.remove(&email_key(email));
        Ok(())
    }
}

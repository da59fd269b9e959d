//! Common test utilities for integration tests
//!
//! Wires the in-memory account store, two session stores, and a freshly-keyed
//! token signer into an [`AuthService`], with one seeded account to log in
//! with.

use std::sync::Arc;

use brewgate_account::account::{AccountType, Gender};
use brewgate_account::auth::jwt::TokenSigner;
use brewgate_account::auth::password::{Argon2Config, Argon2Hasher, Argon2Variant, HashingPool};
use brewgate_account::auth::AuthService;
use brewgate_account::session::MemorySessionStore;
use brewgate_account::store::{AccountStore, MemoryAccountStore, RawAccount};

pub const SEED_EMAIL: &str = "a@b.com";
pub const SEED_PASSWORD: &str = "correct-pw";

static TRACING: std::sync::Once = std::sync::Once::new();

/// Installs a fmt subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub struct TestContext {
    pub auth: AuthService,
    pub accounts: Arc<MemoryAccountStore>,
    pub access_sessions: Arc<MemorySessionStore>,
    pub refresh_sessions: Arc<MemorySessionStore>,
    pub signer: Arc<TokenSigner>,
}

impl TestContext {
    /// Creates a context with one seeded account.
    pub async fn new() -> anyhow::Result<Self> {
        init_tracing();

        // low-cost parameters; production defaults are far heavier
        let hasher = Arc::new(Argon2Hasher::new(
            Argon2Config {
                time_cost: 1,
                memory_cost: 1024,
                parallelism: 1,
                key_length: 32,
                salt_length: 16,
                variant: Argon2Variant::Id,
            },
            HashingPool::default(),
        ));

        let accounts = Arc::new(MemoryAccountStore::new(hasher));
        accounts
            .insert(RawAccount {
                name: "Seed Customer".to_string(),
                email: SEED_EMAIL.to_string(),
                plain_password: SEED_PASSWORD.to_string(),
                gender: Gender::Unspecified,
                account_type: AccountType::Customer,
            })
            .await?;

        let access_sessions = Arc::new(MemorySessionStore::new());
        let refresh_sessions = Arc::new(MemorySessionStore::new());
        let signer = Arc::new(TokenSigner::generate(
            "brewgate",
            "account-session",
            "brewgate-clients",
        )?);

        let auth = AuthService::new(
            accounts.clone(),
            access_sessions.clone(),
            refresh_sessions.clone(),
            signer.clone(),
        );

        Ok(Self {
            auth,
            accounts,
            access_sessions,
            refresh_sessions,
            signer,
        })
    }
}

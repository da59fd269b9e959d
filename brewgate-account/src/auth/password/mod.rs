//! Password hashing with interchangeable schemes
//!
//! Every scheme reads and writes the same self-describing PHC string format
//! (see [`phc`]), so hashes created by one deployment remain verifiable after
//! the preferred scheme changes: the string's identifier selects the scheme
//! that must re-derive the digest.
//!
//! # Schemes
//!
//! - [`Argon2Hasher`]: memory-hard, `argon2id`/`argon2i`
//! - [`BcryptHasher`]: adaptive cost factor, `bcrypt`
//! - [`Pbkdf2Hasher`]: iterated HMAC over a selectable digest, `pbkdf2<digest>`
//!
//! Key derivation is deliberately expensive, so implementations run it on a
//! bounded [`HashingPool`] instead of the async executor threads.

mod argon2;
mod bcrypt;
mod pbkdf2;
pub mod phc;

pub use self::argon2::{Argon2Config, Argon2Hasher, Argon2Variant};
pub use self::bcrypt::{BcryptConfig, BcryptHasher};
pub use self::pbkdf2::{Pbkdf2Config, Pbkdf2Digest, Pbkdf2Hasher};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The plaintext password or the encoded hash string was empty
    #[error("empty password input")]
    EmptyInput,

    /// The encoded hash belongs to a scheme this hasher cannot verify
    #[error("unsupported hashing scheme: {0}")]
    UnsupportedScheme(String),

    /// The encoded hash could not be decoded (wrong field count, bad hex,
    /// non-numeric parameter)
    #[error("malformed encoded hash: {0}")]
    MalformedEncoding(String),

    /// Failure inside the hashing backend or worker pool
    #[error("hashing backend: {0}")]
    Backend(String),
}

/// Polymorphic hashing capability: create an encoded hash, or verify a
/// plaintext against one.
///
/// Verification returns `Ok(false)` only for a genuine digest mismatch;
/// decode failures surface as errors so callers can log the detail before
/// collapsing both outcomes into "not authenticated".
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plain_password: &str) -> Result<String, PasswordError>;

    async fn verify(
        &self,
        plain_password: &str,
        hashed_password: &str,
    ) -> Result<bool, PasswordError>;
}

/// Default number of key derivations allowed to run at once.
pub const DEFAULT_HASHING_PERMITS: usize = 4;

/// Bounded worker pool for CPU-heavy key derivation.
///
/// Derivations run on the blocking thread pool, gated by a semaphore so a
/// burst of login attempts cannot monopolize it. Cloning shares the same
/// permit pool.
#[derive(Clone)]
pub struct HashingPool {
    permits: Arc<Semaphore>,
}

impl HashingPool {
    pub fn new(permits: usize) -> Self {
        let permits = if permits == 0 {
            DEFAULT_HASHING_PERMITS
        } else {
            permits
        };
        Self {
            permits: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Runs `f` on the blocking pool once a permit is available.
    pub async fn run<T, F>(&self, f: F) -> Result<T, PasswordError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PasswordError::Backend("hashing pool closed".to_string()))?;

        tokio::task::spawn_blocking(f)
            .await
            .map_err(|err| PasswordError::Backend(format!("hashing task failed: {err}")))?
    }
}

impl Default for HashingPool {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_PERMITS)
    }
}

impl std::fmt::Debug for HashingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingPool")
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

pub(crate) fn random_salt(len: usize) -> Vec<u8> {
    use rand::RngCore;

    let mut salt = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

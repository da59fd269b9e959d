//! Adaptive-cost hashing scheme (bcrypt)
//!
//! Bcrypt generates and embeds its own salt, so the PHC salt field stays
//! empty and the whole modular-crypt output is hex-encoded into the digest
//! field: `$bcrypt$v=0$r=<cost>$$<mcf-hex>`. The cost factor is recorded as
//! the `r` parameter.

use async_trait::async_trait;

use super::phc::{self, PhcHash};
use super::{HashingPool, PasswordError, PasswordHasher};

const DEFAULT_COST: u32 = 10;
const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Tunables for [`BcryptHasher`]. An out-of-range cost falls back to the
/// default.
#[derive(Debug, Clone, Copy)]
pub struct BcryptConfig {
    pub cost: u32,
}

impl Default for BcryptConfig {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

pub struct BcryptHasher {
    config: BcryptConfig,
    pool: HashingPool,
}

impl BcryptHasher {
    pub fn new(config: BcryptConfig, pool: HashingPool) -> Self {
        let cost = if (MIN_COST..=MAX_COST).contains(&config.cost) {
            config.cost
        } else {
            DEFAULT_COST
        };
        Self {
            config: BcryptConfig { cost },
            pool,
        }
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, plain_password: &str) -> Result<String, PasswordError> {
        if plain_password.is_empty() {
            return Err(PasswordError::EmptyInput);
        }

        let cost = self.config.cost;
        let plain = plain_password.to_string();

        self.pool
            .run(move || {
                let mcf = bcrypt::hash(plain, cost)
                    .map_err(|err| PasswordError::Backend(format!("bcrypt failed: {err}")))?;

                Ok(phc::serialize(&PhcHash {
                    id: "bcrypt".to_string(),
                    version: 0,
                    params: vec![("r".to_string(), cost.to_string())],
                    salt: String::new(),
                    hash: hex::encode(mcf.as_bytes()),
                }))
            })
            .await
    }

    async fn verify(
        &self,
        plain_password: &str,
        hashed_password: &str,
    ) -> Result<bool, PasswordError> {
        if plain_password.is_empty() || hashed_password.is_empty() {
            return Err(PasswordError::EmptyInput);
        }

        let decoded = phc::deserialize(hashed_password)?;
        if !decoded.id.starts_with("bcrypt") {
            return Err(PasswordError::UnsupportedScheme(decoded.id));
        }

        let mcf_bytes = hex::decode(&decoded.hash)
            .map_err(|err| PasswordError::MalformedEncoding(format!("digest is not hex: {err}")))?;
        let mcf = String::from_utf8(mcf_bytes).map_err(|_| {
            PasswordError::MalformedEncoding("digest is not a utf-8 bcrypt string".to_string())
        })?;

        let plain = plain_password.to_string();
        self.pool
            .run(move || {
                // bcrypt::verify reports a mismatch as Ok(false); an Err means
                // the stored string itself is not a valid bcrypt hash
                bcrypt::verify(plain, &mcf).map_err(|err| {
                    PasswordError::MalformedEncoding(format!("invalid bcrypt hash: {err}"))
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hasher() -> BcryptHasher {
        // minimum cost keeps tests fast
        BcryptHasher::new(BcryptConfig { cost: 4 }, HashingPool::default())
    }

    #[tokio::test]
    async fn test_hash_shape() {
        let hasher = test_hasher();
        let encoded = hasher.hash("password123").await.unwrap();

        assert!(encoded.starts_with("$bcrypt$v=0$r=4$$"));
        let decoded = phc::deserialize(&encoded).unwrap();
        assert!(decoded.salt.is_empty());

        // digest field decodes back to a modular-crypt string
        let mcf = String::from_utf8(hex::decode(&decoded.hash).unwrap()).unwrap();
        assert!(mcf.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_hash_verify_roundtrip() {
        let hasher = test_hasher();
        let encoded = hasher.hash("espresso shot").await.unwrap();
        assert!(hasher.verify("espresso shot", &encoded).await.unwrap());
        assert!(!hasher.verify("latte", &encoded).await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_salts_differ() {
        let hasher = test_hasher();
        let first = hasher.hash("same password").await.unwrap();
        let second = hasher.hash("same password").await.unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("same password", &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let hasher = test_hasher();
        assert!(matches!(
            hasher.hash("").await,
            Err(PasswordError::EmptyInput)
        ));
        assert!(matches!(
            hasher.verify("", "x").await,
            Err(PasswordError::EmptyInput)
        ));
        assert!(matches!(
            hasher.verify("password", "").await,
            Err(PasswordError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_verify_foreign_scheme() {
        let hasher = test_hasher();
        let err = hasher
            .verify("password", "$argon2id$v=19$m=1024,t=1,p=1$aa$bb")
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn test_verify_malformed_digest() {
        let hasher = test_hasher();

        // not hex
        let err = hasher
            .verify("password", "$bcrypt$v=0$r=4$$zz")
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));

        // hex, but not a bcrypt string underneath
        let garbage = hex::encode("definitely-not-mcf");
        let err = hasher
            .verify("password", &format!("$bcrypt$v=0$r=4$${garbage}"))
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_cost_gets_default() {
        let hasher = BcryptHasher::new(BcryptConfig { cost: 99 }, HashingPool::default());
        assert_eq!(hasher.config.cost, DEFAULT_COST);

        let hasher = BcryptHasher::new(BcryptConfig { cost: 0 }, HashingPool::default());
        assert_eq!(hasher.config.cost, DEFAULT_COST);
    }
}

//! Memory-hard hashing scheme (Argon2)
//!
//! # Security
//!
//! - **Variants**: Argon2id (default, hybrid) and Argon2i
//! - **Memory**: 64 MiB default
//! - **Iterations**: 16 passes default
//! - **Parallelism**: 4 lanes default
//! - **Output**: 64-byte digest, 32-byte salt default
//!
//! Hashes encode as `$argon2id$v=19$m=...,t=...,p=...$<salt-hex>$<digest-hex>`.
//! Verification re-derives the digest with the parameters stored in the
//! encoded string, not with this hasher's configuration, so older hashes stay
//! verifiable after a parameter bump.

use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use constant_time_eq::constant_time_eq;

use super::phc::{self, PhcHash};
use super::{random_salt, HashingPool, PasswordError, PasswordHasher};

/// Version tag written into the PHC string (`0x13`).
const ARGON2_VERSION: u32 = 19;

const DEFAULT_TIME_COST: u32 = 16;
const DEFAULT_MEMORY_COST_KIB: u32 = 64 * 1024;
const DEFAULT_PARALLELISM: u32 = 4;
const DEFAULT_KEY_LENGTH: usize = 64;
const DEFAULT_SALT_LENGTH: usize = 32;

/// Mixing mode of the derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Argon2Variant {
    /// Combined data-dependent and independent mixing
    #[default]
    Id,
    /// Data-independent mixing only
    I,
}

impl Argon2Variant {
    fn scheme_id(&self) -> &'static str {
        match self {
            Argon2Variant::Id => "argon2id",
            Argon2Variant::I => "argon2i",
        }
    }

    fn algorithm(&self) -> Algorithm {
        match self {
            Argon2Variant::Id => Algorithm::Argon2id,
            Argon2Variant::I => Algorithm::Argon2i,
        }
    }

    fn from_scheme_id(id: &str) -> Option<Self> {
        match id {
            "argon2id" => Some(Argon2Variant::Id),
            "argon2i" => Some(Argon2Variant::I),
            _ => None,
        }
    }
}

impl std::str::FromStr for Argon2Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2id" | "id" => Ok(Argon2Variant::Id),
            "argon2i" | "i" => Ok(Argon2Variant::I),
            _ => Err(format!("unknown argon2 variant `{s}`")),
        }
    }
}

/// Tunables for [`Argon2Hasher`]. Zero values fall back to the defaults.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Config {
    /// Number of passes over memory
    pub time_cost: u32,
    /// Memory in KiB
    pub memory_cost: u32,
    /// Number of lanes
    pub parallelism: u32,
    /// Digest length in bytes
    pub key_length: usize,
    /// Salt length in bytes
    pub salt_length: usize,
    pub variant: Argon2Variant,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST_KIB,
            parallelism: DEFAULT_PARALLELISM,
            key_length: DEFAULT_KEY_LENGTH,
            salt_length: DEFAULT_SALT_LENGTH,
            variant: Argon2Variant::default(),
        }
    }
}

impl Argon2Config {
    fn normalized(mut self) -> Self {
        if self.time_cost == 0 {
            self.time_cost = DEFAULT_TIME_COST;
        }
        if self.memory_cost == 0 {
            self.memory_cost = DEFAULT_MEMORY_COST_KIB;
        }
        if self.parallelism == 0 {
            self.parallelism = DEFAULT_PARALLELISM;
        }
        if self.key_length == 0 {
            self.key_length = DEFAULT_KEY_LENGTH;
        }
        if self.salt_length == 0 {
            self.salt_length = DEFAULT_SALT_LENGTH;
        }
        self
    }
}

pub struct Argon2Hasher {
    config: Argon2Config,
    pool: HashingPool,
}

impl Argon2Hasher {
    pub fn new(config: Argon2Config, pool: HashingPool) -> Self {
        Self {
            config: config.normalized(),
            pool,
        }
    }
}

fn derive(
    variant: Argon2Variant,
    plain_password: &[u8],
    salt: &[u8],
    time_cost: u32,
    memory_cost: u32,
    parallelism: u32,
    key_length: usize,
) -> Result<Vec<u8>, PasswordError> {
    let params = Params::new(memory_cost, time_cost, parallelism, Some(key_length))
        .map_err(|err| PasswordError::Backend(format!("invalid argon2 parameters: {err}")))?;
    let argon2 = Argon2::new(variant.algorithm(), Version::V0x13, params);

    let mut digest = vec![0u8; key_length];
    argon2
        .hash_password_into(plain_password, salt, &mut digest)
        .map_err(|err| PasswordError::Backend(format!("argon2 derivation failed: {err}")))?;
    Ok(digest)
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, plain_password: &str) -> Result<String, PasswordError> {
        if plain_password.is_empty() {
            return Err(PasswordError::EmptyInput);
        }

        let config = self.config;
        let plain = plain_password.as_bytes().to_vec();

        self.pool
            .run(move || {
                let salt = random_salt(config.salt_length);
                let digest = derive(
                    config.variant,
                    &plain,
                    &salt,
                    config.time_cost,
                    config.memory_cost,
                    config.parallelism,
                    config.key_length,
                )?;

                Ok(phc::serialize(&PhcHash {
                    id: config.variant.scheme_id().to_string(),
                    version: ARGON2_VERSION,
                    params: vec![
                        ("m".to_string(), config.memory_cost.to_string()),
                        ("t".to_string(), config.time_cost.to_string()),
                        ("p".to_string(), config.parallelism.to_string()),
                    ],
                    salt: hex::encode(&salt),
                    hash: hex::encode(&digest),
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
        if !decoded.id.starts_with("argon2") {
            return Err(PasswordError::UnsupportedScheme(decoded.id));
        }
        let variant = Argon2Variant::from_scheme_id(&decoded.id)
            .ok_or_else(|| PasswordError::UnsupportedScheme(decoded.id.clone()))?;

        let stored_digest = hex::decode(&decoded.hash)
            .map_err(|err| PasswordError::MalformedEncoding(format!("digest is not hex: {err}")))?;
        let salt = hex::decode(&decoded.salt)
            .map_err(|err| PasswordError::MalformedEncoding(format!("salt is not hex: {err}")))?;
        let time_cost = decoded.numeric_param::<u32>("t")?;
        let memory_cost = decoded.numeric_param::<u32>("m")?;
        let parallelism = decoded.numeric_param::<u32>("p")?;

        let plain = plain_password.as_bytes().to_vec();
        self.pool
            .run(move || {
                let derived = derive(
                    variant,
                    &plain,
                    &salt,
                    time_cost,
                    memory_cost,
                    parallelism,
                    stored_digest.len(),
                )?;
                Ok(constant_time_eq(&derived, &stored_digest))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low-cost parameters keep the tests fast; production defaults are far
    // heavier.
    fn test_hasher(variant: Argon2Variant) -> Argon2Hasher {
        Argon2Hasher::new(
            Argon2Config {
                time_cost: 1,
                memory_cost: 1024,
                parallelism: 1,
                key_length: 64,
                salt_length: 32,
                variant,
            },
            HashingPool::default(),
        )
    }

    #[tokio::test]
    async fn test_hash_shape() {
        let hasher = test_hasher(Argon2Variant::Id);
        let encoded = hasher.hash("password123").await.unwrap();

        assert!(encoded.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        let decoded = phc::deserialize(&encoded).unwrap();
        assert_eq!(decoded.salt.len(), 64); // 32 bytes hex-encoded
        assert_eq!(decoded.hash.len(), 128); // 64 bytes hex-encoded
    }

    #[tokio::test]
    async fn test_hash_verify_roundtrip() {
        for variant in [Argon2Variant::Id, Argon2Variant::I] {
            let hasher = test_hasher(variant);
            let encoded = hasher.hash("correct horse").await.unwrap();
            assert!(hasher.verify("correct horse", &encoded).await.unwrap());
            assert!(!hasher.verify("wrong horse", &encoded).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_hash_salts_differ() {
        let hasher = test_hasher(Argon2Variant::Id);
        let first = hasher.hash("same password").await.unwrap();
        let second = hasher.hash("same password").await.unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same password", &first).await.unwrap());
        assert!(hasher.verify("same password", &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let hasher = test_hasher(Argon2Variant::Id);
        assert!(matches!(
            hasher.hash("").await,
            Err(PasswordError::EmptyInput)
        ));
        assert!(matches!(
            hasher.verify("", "$argon2id$v=19$t=1$aa$bb").await,
            Err(PasswordError::EmptyInput)
        ));
        assert!(matches!(
            hasher.verify("password", "").await,
            Err(PasswordError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_verify_foreign_scheme() {
        let hasher = test_hasher(Argon2Variant::Id);
        let err = hasher
            .verify("password", "$bcrypt$v=0$r=10$$24326124")
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn test_verify_unknown_argon2_sub_id() {
        let hasher = test_hasher(Argon2Variant::Id);
        let err = hasher
            .verify("password", "$argon2d$v=19$m=1024,t=1,p=1$aa$bb")
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn test_verify_malformed_inputs() {
        let hasher = test_hasher(Argon2Variant::Id);

        // non-numeric parameter
        let err = hasher
            .verify("password", "$argon2id$v=19$m=lots,t=1,p=1$aa$bb")
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));

        // non-hex salt
        let err = hasher
            .verify("password", "$argon2id$v=19$m=1024,t=1,p=1$zz$bb")
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));

        // truncated string
        let err = hasher.verify("password", "$argon2id$v=19").await.unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));
    }

    #[tokio::test]
    async fn test_zero_config_gets_defaults() {
        let hasher = Argon2Hasher::new(
            Argon2Config {
                time_cost: 0,
                memory_cost: 0,
                parallelism: 0,
                key_length: 0,
                salt_length: 0,
                variant: Argon2Variant::Id,
            },
            HashingPool::default(),
        );
        assert_eq!(hasher.config.time_cost, DEFAULT_TIME_COST);
        assert_eq!(hasher.config.memory_cost, DEFAULT_MEMORY_COST_KIB);
        assert_eq!(hasher.config.parallelism, DEFAULT_PARALLELISM);
        assert_eq!(hasher.config.key_length, DEFAULT_KEY_LENGTH);
        assert_eq!(hasher.config.salt_length, DEFAULT_SALT_LENGTH);
    }
}

//! Configuration management
//!
//! Loads configuration from environment variables into a type-safe struct
//! and builds the configured components from it.
//!
//! # Environment Variables
//!
//! - `AUTH_HASH_SCHEME`: `argon2` (default), `bcrypt`, or `pbkdf2`
//! - `AUTH_HASH_POOL_PERMITS`: concurrent key derivations (default 4)
//! - `ARGON2_TIME_COST`, `ARGON2_MEMORY_KIB`, `ARGON2_PARALLELISM`,
//!   `ARGON2_KEY_LENGTH`, `ARGON2_SALT_LENGTH`, `ARGON2_VARIANT`
//! - `BCRYPT_COST`
//! - `PBKDF2_ROUNDS`, `PBKDF2_KEY_LENGTH`, `PBKDF2_SALT_LENGTH`,
//!   `PBKDF2_DIGEST`
//! - `JWT_ISSUER`, `JWT_SUBJECT`, `JWT_AUDIENCE` (required)
//! - `JWT_ACCESS_PRIVATE_KEY`, `JWT_ACCESS_PUBLIC_KEY`,
//!   `JWT_REFRESH_PRIVATE_KEY`, `JWT_REFRESH_PUBLIC_KEY`: PEM key material
//!   (required)
//! - `SESSION_SWEEP_SECS`: session sweep interval (default 60)
//!
//! Zero or out-of-range scheme tunables fall back to the scheme defaults;
//! unparseable values are an error.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::jwt::{KeyPairPem, TokenSigner};
use crate::session::MemorySessionStore;
use crate::auth::password::{
    Argon2Config, Argon2Hasher, Argon2Variant, BcryptConfig, BcryptHasher, HashingPool,
    Pbkdf2Config, Pbkdf2Digest, Pbkdf2Hasher, PasswordHasher, DEFAULT_HASHING_PERMITS,
};

/// Complete configuration of the account core
#[derive(Debug, Clone)]
pub struct Config {
    pub hashing: HashingConfig,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
}

/// Which hashing scheme newly-created hashes use. Verification always
/// follows the encoded string instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashScheme {
    #[default]
    Argon2,
    Bcrypt,
    Pbkdf2,
}

impl FromStr for HashScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2" => Ok(HashScheme::Argon2),
            "bcrypt" => Ok(HashScheme::Bcrypt),
            "pbkdf2" => Ok(HashScheme::Pbkdf2),
            _ => Err(format!("unknown hash scheme `{s}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub scheme: HashScheme,
    pub pool_permits: usize,
    pub argon2: Argon2Config,
    pub bcrypt: BcryptConfig,
    pub pbkdf2: Pbkdf2Config,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            scheme: HashScheme::default(),
            pool_permits: DEFAULT_HASHING_PERMITS,
            argon2: Argon2Config::default(),
            bcrypt: BcryptConfig::default(),
            pbkdf2: Pbkdf2Config::default(),
        }
    }
}

impl HashingConfig {
    /// Builds the configured hasher over a fresh bounded pool.
    pub fn build_hasher(&self) -> Arc<dyn PasswordHasher> {
        let pool = HashingPool::new(self.pool_permits);
        match self.scheme {
            HashScheme::Argon2 => Arc::new(Argon2Hasher::new(self.argon2, pool)),
            HashScheme::Bcrypt => Arc::new(BcryptHasher::new(self.bcrypt, pool)),
            HashScheme::Pbkdf2 => Arc::new(Pbkdf2Hasher::new(self.pbkdf2, pool)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub subject: String,
    pub audience: String,
    pub access_keys: KeyPairPem,
    pub refresh_keys: KeyPairPem,
}

impl JwtConfig {
    pub fn build_signer(&self) -> anyhow::Result<TokenSigner> {
        let signer = TokenSigner::from_pem(
            &self.access_keys,
            &self.refresh_keys,
            &self.issuer,
            &self.subject,
            &self.audience,
        )?;
        Ok(signer)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// Builds one in-memory session store sweeping at the configured
    /// interval. The authentication service needs two: one per token kind.
    pub fn build_store(&self) -> MemorySessionStore {
        MemorySessionStore::with_sweep_interval(self.sweep_interval)
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let hashing = HashingConfig {
            scheme: parsed_var("AUTH_HASH_SCHEME", HashScheme::default())?,
            pool_permits: parsed_var("AUTH_HASH_POOL_PERMITS", DEFAULT_HASHING_PERMITS)?,
            argon2: Argon2Config {
                time_cost: parsed_var("ARGON2_TIME_COST", 0)?,
                memory_cost: parsed_var("ARGON2_MEMORY_KIB", 0)?,
                parallelism: parsed_var("ARGON2_PARALLELISM", 0)?,
                key_length: parsed_var("ARGON2_KEY_LENGTH", 0)?,
                salt_length: parsed_var("ARGON2_SALT_LENGTH", 0)?,
                variant: parsed_var("ARGON2_VARIANT", Argon2Variant::default())?,
            },
            bcrypt: BcryptConfig {
                cost: parsed_var("BCRYPT_COST", BcryptConfig::default().cost)?,
            },
            pbkdf2: Pbkdf2Config {
                rounds: parsed_var("PBKDF2_ROUNDS", 0)?,
                key_length: parsed_var("PBKDF2_KEY_LENGTH", 0)?,
                salt_length: parsed_var("PBKDF2_SALT_LENGTH", 0)?,
                digest: parsed_var("PBKDF2_DIGEST", Pbkdf2Digest::default())?,
            },
        };

        let jwt = JwtConfig {
            issuer: required_var("JWT_ISSUER")?,
            subject: required_var("JWT_SUBJECT")?,
            audience: required_var("JWT_AUDIENCE")?,
            access_keys: KeyPairPem {
                private_key_pem: required_var("JWT_ACCESS_PRIVATE_KEY")?,
                public_key_pem: required_var("JWT_ACCESS_PUBLIC_KEY")?,
            },
            refresh_keys: KeyPairPem {
                private_key_pem: required_var("JWT_REFRESH_PRIVATE_KEY")?,
                public_key_pem: required_var("JWT_REFRESH_PUBLIC_KEY")?,
            },
        };

        let session = SessionConfig {
            sweep_interval: Duration::from_secs(parsed_var("SESSION_SWEEP_SECS", 60)?),
        };

        Ok(Self {
            hashing,
            jwt,
            session,
        })
    }
}

fn required_var(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("{key} environment variable is required"))
}

fn parsed_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("invalid {key} value `{raw}`: {err}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_scheme_parsing() {
        assert_eq!("argon2".parse::<HashScheme>().unwrap(), HashScheme::Argon2);
        assert_eq!("bcrypt".parse::<HashScheme>().unwrap(), HashScheme::Bcrypt);
        assert_eq!("pbkdf2".parse::<HashScheme>().unwrap(), HashScheme::Pbkdf2);
        assert!("scrypt".parse::<HashScheme>().is_err());
    }

    #[test]
    fn test_default_hashing_config() {
        let config = HashingConfig::default();
        assert_eq!(config.scheme, HashScheme::Argon2);
        assert_eq!(config.pool_permits, DEFAULT_HASHING_PERMITS);
    }

    #[tokio::test]
    async fn test_build_hasher_follows_scheme() {
        let config = HashingConfig {
            scheme: HashScheme::Bcrypt,
            bcrypt: BcryptConfig { cost: 4 },
            ..HashingConfig::default()
        };

        let hasher = config.build_hasher();
        let encoded = hasher.hash("a-password").await.unwrap();
        assert!(encoded.starts_with("$bcrypt$"));
    }

    #[tokio::test]
    async fn test_build_store_uses_configured_interval() {
        let config = SessionConfig {
            sweep_interval: Duration::from_millis(20),
        };
        let store = config.build_store();
        assert_eq!(format!("{store:?}"), "MemorySessionStore { sessions: 0 }");
    }

    #[test]
    fn test_build_signer_from_generated_keys() {
        let jwt = JwtConfig {
            issuer: "brewgate".to_string(),
            subject: "account-session".to_string(),
            audience: "brewgate-clients".to_string(),
            access_keys: KeyPairPem::generate().unwrap(),
            refresh_keys: KeyPairPem::generate().unwrap(),
        };

        let signer = jwt.build_signer().unwrap();
        let pair = signer.sign(1).unwrap();
        assert_eq!(signer.verify_access_token(&pair.access_token).unwrap(), 1);
    }

    #[test]
    fn test_build_signer_rejects_garbage_pem() {
        let jwt = JwtConfig {
            issuer: "brewgate".to_string(),
            subject: "account-session".to_string(),
            audience: "brewgate-clients".to_string(),
            access_keys: KeyPairPem {
                private_key_pem: "not a pem".to_string(),
                public_key_pem: "not a pem".to_string(),
            },
            refresh_keys: KeyPairPem::generate().unwrap(),
        };

        assert!(jwt.build_signer().is_err());
    }
}

//! Iterated-HMAC hashing scheme (PBKDF2)
//!
//! The underlying digest is selectable (SHA-1 through SHA-512) and is baked
//! into the scheme identifier, e.g. `$pbkdf2sha256$v=0$i=4096$<salt-hex>$<digest-hex>`,
//! so verification picks the same primitive back out of the encoded string.

use async_trait::async_trait;
use constant_time_eq::constant_time_eq;
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use super::phc::{self, PhcHash};
use super::{random_salt, HashingPool, PasswordError, PasswordHasher};

const DEFAULT_ROUNDS: u32 = 4096;
const DEFAULT_KEY_LENGTH: usize = 32;
const DEFAULT_SALT_LENGTH: usize = 16;

/// HMAC digest primitive used by the derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pbkdf2Digest {
    Sha1,
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl Pbkdf2Digest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pbkdf2Digest::Sha1 => "sha1",
            Pbkdf2Digest::Sha224 => "sha224",
            Pbkdf2Digest::Sha256 => "sha256",
            Pbkdf2Digest::Sha384 => "sha384",
            Pbkdf2Digest::Sha512 => "sha512",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha1" => Some(Pbkdf2Digest::Sha1),
            "sha224" => Some(Pbkdf2Digest::Sha224),
            "sha256" => Some(Pbkdf2Digest::Sha256),
            "sha384" => Some(Pbkdf2Digest::Sha384),
            "sha512" => Some(Pbkdf2Digest::Sha512),
            _ => None,
        }
    }
}

impl std::str::FromStr for Pbkdf2Digest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown pbkdf2 digest `{s}`"))
    }
}

/// Tunables for [`Pbkdf2Hasher`]. Zero values fall back to the defaults.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2Config {
    pub rounds: u32,
    /// Digest length in bytes
    pub key_length: usize,
    /// Salt length in bytes
    pub salt_length: usize,
    pub digest: Pbkdf2Digest,
}

impl Default for Pbkdf2Config {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            key_length: DEFAULT_KEY_LENGTH,
            salt_length: DEFAULT_SALT_LENGTH,
            digest: Pbkdf2Digest::default(),
        }
    }
}

impl Pbkdf2Config {
    fn normalized(mut self) -> Self {
        if self.rounds == 0 {
            self.rounds = DEFAULT_ROUNDS;
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

pub struct Pbkdf2Hasher {
    config: Pbkdf2Config,
    pool: HashingPool,
}

impl Pbkdf2Hasher {
    pub fn new(config: Pbkdf2Config, pool: HashingPool) -> Self {
        Self {
            config: config.normalized(),
            pool,
        }
    }
}

fn derive(
    digest: Pbkdf2Digest,
    plain_password: &[u8],
    salt: &[u8],
    rounds: u32,
    key_length: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; key_length];
    match digest {
        Pbkdf2Digest::Sha1 => pbkdf2_hmac::<Sha1>(plain_password, salt, rounds, &mut out),
        Pbkdf2Digest::Sha224 => pbkdf2_hmac::<Sha224>(plain_password, salt, rounds, &mut out),
        Pbkdf2Digest::Sha256 => pbkdf2_hmac::<Sha256>(plain_password, salt, rounds, &mut out),
        Pbkdf2Digest::Sha384 => pbkdf2_hmac::<Sha384>(plain_password, salt, rounds, &mut out),
        Pbkdf2Digest::Sha512 => pbkdf2_hmac::<Sha512>(plain_password, salt, rounds, &mut out),
    }
    out
}

#[async_trait]
impl PasswordHasher for Pbkdf2Hasher {
    async fn hash(&self, plain_password: &str) -> Result<String, PasswordError> {
        if plain_password.is_empty() {
            return Err(PasswordError::EmptyInput);
        }

        let config = self.config;
        let plain = plain_password.as_bytes().to_vec();

        self.pool
            .run(move || {
                let salt = random_salt(config.salt_length);
                let digest = derive(config.digest, &plain, &salt, config.rounds, config.key_length);

                Ok(phc::serialize(&PhcHash {
                    id: format!("pbkdf2{}", config.digest.as_str()),
                    version: 0,
                    params: vec![("i".to_string(), config.rounds.to_string())],
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
        let digest_name = decoded
            .id
            .strip_prefix("pbkdf2")
            .ok_or_else(|| PasswordError::UnsupportedScheme(decoded.id.clone()))?;
        let digest = Pbkdf2Digest::from_name(digest_name)
            .ok_or_else(|| PasswordError::UnsupportedScheme(decoded.id.clone()))?;

        let stored_digest = hex::decode(&decoded.hash)
            .map_err(|err| PasswordError::MalformedEncoding(format!("digest is not hex: {err}")))?;
        let salt = hex::decode(&decoded.salt)
            .map_err(|err| PasswordError::MalformedEncoding(format!("salt is not hex: {err}")))?;
        let rounds = decoded.numeric_param::<u32>("i")?;

        let plain = plain_password.as_bytes().to_vec();
        self.pool
            .run(move || {
                let derived = derive(digest, &plain, &salt, rounds, stored_digest.len());
                Ok(constant_time_eq(&derived, &stored_digest))
            })
            .await
    }
}

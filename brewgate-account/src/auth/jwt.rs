//! Token signing and verification
//!
//! Issues bidirectional session credentials: a short-lived access token and a
//! long-lived refresh token, each signed with its own Ed25519 key pair. A key
//! that signs access tokens can never validate refresh tokens and vice versa.
//!
//! # Security
//!
//! - **Algorithm**: EdDSA (Ed25519); any other algorithm in a presented
//!   token's header is rejected outright, which closes algorithm-confusion
//!   attacks
//! - **Access lifetime**: 1 hour
//! - **Refresh lifetime**: 30 days
//! - **Replay aid**: every token carries a fresh `jti` (UUID v4)
//!
//! `nbf` equals `iat` for both token kinds; tokens become valid the moment
//! they are issued.

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token header names a signing algorithm other than EdDSA
    #[error("invalid signing method")]
    InvalidSigningMethod,

    /// Token expiry has elapsed
    #[error("token expired")]
    Expired,

    /// Signature does not verify against the expected public key
    #[error("token invalid")]
    InvalidSignature,

    /// Claims are missing, empty, or fail audience/issuer/not-before checks
    #[error("token claims invalid")]
    InvalidClaims,

    /// Key material could not be loaded or generated
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Signing failed
    #[error("signing token: {0}")]
    Signing(String),
}

pub fn access_token_ttl() -> Duration {
    Duration::hours(1)
}

pub fn refresh_token_ttl() -> Duration {
    Duration::days(30)
}

/// Signed claim set carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    /// Expiry (Unix timestamp)
    pub exp: i64,
    /// Not before (Unix timestamp), always equal to `iat`
    pub nbf: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Per-token unique identifier
    pub jti: String,
    /// Account id the token authenticates
    pub uid: i64,
}

/// Ed25519 key pair in PEM form (PKCS#8 private key, SPKI public key).
#[derive(Debug, Clone)]
pub struct KeyPairPem {
    pub private_key_pem: String,
    pub public_key_pem: String,
}

impl KeyPairPem {
    /// Generates a fresh Ed25519 key pair.
    pub fn generate() -> Result<Self, TokenError> {
        let signing_key = SigningKey::generate(&mut OsRng);

        let private_key_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|err| TokenError::InvalidKey(format!("encoding private key: {err}")))?
            .to_string();
        let public_key_pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|err| TokenError::InvalidKey(format!("encoding public key: {err}")))?;

        Ok(Self {
            private_key_pem,
            public_key_pem,
        })
    }
}

/// A single signed token with its expiry instant.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Freshly-minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct SignedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues and verifies the two token kinds with disjoint key pairs.
///
/// Pure and read-only once constructed; safe to share across tasks.
pub struct TokenSigner {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    issuer: String,
    subject: String,
    audience: String,
}

impl TokenSigner {
    /// Builds a signer from PEM key material.
    pub fn from_pem(
        access_keys: &KeyPairPem,
        refresh_keys: &KeyPairPem,
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, TokenError> {
        let load_encoding = |pem: &str, which: &str| {
            EncodingKey::from_ed_pem(pem.as_bytes())
                .map_err(|err| TokenError::InvalidKey(format!("{which} private key: {err}")))
        };
        let load_decoding = |pem: &str, which: &str| {
            DecodingKey::from_ed_pem(pem.as_bytes())
                .map_err(|err| TokenError::InvalidKey(format!("{which} public key: {err}")))
        };

        Ok(Self {
            access_encoding_key: load_encoding(&access_keys.private_key_pem, "access")?,
            access_decoding_key: load_decoding(&access_keys.public_key_pem, "access")?,
            refresh_encoding_key: load_encoding(&refresh_keys.private_key_pem, "refresh")?,
            refresh_decoding_key: load_decoding(&refresh_keys.public_key_pem, "refresh")?,
            issuer: issuer.into(),
            subject: subject.into(),
            audience: audience.into(),
        })
    }

    /// Builds a signer over two freshly-generated key pairs. Intended for
    /// single-node bootstrap and tests; sessions do not survive a restart.
    pub fn generate(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, TokenError> {
        let access_keys = KeyPairPem::generate()?;
        let refresh_keys = KeyPairPem::generate()?;
        Self::from_pem(&access_keys, &refresh_keys, issuer, subject, audience)
    }

    /// Mints a fresh access/refresh token pair for `account_id`.
    pub fn sign(&self, account_id: i64) -> Result<SignedTokenPair, TokenError> {
        let access = self.sign_with(&self.access_encoding_key, account_id, access_token_ttl())?;
        let refresh = self.sign_with(&self.refresh_encoding_key, account_id, refresh_token_ttl())?;

        Ok(SignedTokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Mints only a fresh access token, used by the refresh flow.
    pub fn sign_access(&self, account_id: i64) -> Result<SignedToken, TokenError> {
        self.sign_with(&self.access_encoding_key, account_id, access_token_ttl())
    }

    fn sign_with(
        &self,
        key: &EncodingKey,
        account_id: i64,
        ttl: Duration,
    ) -> Result<SignedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            uid: account_id,
        };

        let token = encode(&Header::new(Algorithm::EdDSA), &claims, key)
            .map_err(|err| TokenError::Signing(err.to_string()))?;

        Ok(SignedToken { token, expires_at })
    }

    /// Verifies an access token and returns the account id it authenticates.
    pub fn verify_access_token(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_with(&self.access_decoding_key, token)
    }

    /// Verifies a refresh token and returns the account id it authenticates.
    pub fn verify_refresh_token(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_with(&self.refresh_decoding_key, token)
    }

    fn verify_with(&self, key: &DecodingKey, token: &str) -> Result<i64, TokenError> {
        if token.is_empty() {
            return Err(TokenError::InvalidSignature);
        }

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "aud", "iss"]);

        let data = decode::<Claims>(token, key, &validation).map_err(map_decode_error)?;

        if data.claims.jti.is_empty() {
            return Err(TokenError::InvalidClaims);
        }

        Ok(data.claims.uid)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // key material stays out of debug output
        f.debug_struct("TokenSigner")
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("audience", &self.audience)
            .finish()
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::InvalidSigningMethod
        }
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Json(_) => TokenError::InvalidClaims,
        _ => TokenError::InvalidSignature,
    }
}

//! Authentication service
//!
//! Composes the account store, the token signer, and two session stores (one
//! per token kind) into the login/logout/refresh/validate flow. The two
//! session stores are never shared or cross-queried.
//!
//! Every password-check, lookup, or session failure leaves this boundary as
//! the single [`AuthError::InvalidAuthentication`] outcome; callers cannot
//! tell which step failed, so the flow exposes no account-enumeration or
//! scheme-fingerprinting oracle. The underlying detail is logged here before
//! it is discarded.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, warn};

use super::jwt::{SignedToken, SignedTokenPair, TokenSigner};
use crate::account::{BasicAccount, SharedAccount};
use crate::session::{SessionError, SessionStore};
use crate::store::AccountStore;

/// Error type for the authentication flow
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credentials, token, or session did not check out
    #[error("invalid authentication")]
    InvalidAuthentication,

    /// Infrastructure fault unrelated to the presented credentials
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct AuthService {
    account_store: Arc<dyn AccountStore>,
    access_sessions: Arc<dyn SessionStore>,
    refresh_sessions: Arc<dyn SessionStore>,
    signer: Arc<TokenSigner>,
}

impl AuthService {
    pub fn new(
        account_store: Arc<dyn AccountStore>,
        access_sessions: Arc<dyn SessionStore>,
        refresh_sessions: Arc<dyn SessionStore>,
        signer: Arc<TokenSigner>,
    ) -> Self {
        Self {
            account_store,
            access_sessions,
            refresh_sessions,
            signer,
        }
    }

    /// Verifies the password for `email`, mints an access/refresh token pair,
    /// and records both sessions with their respective expiries.
    pub async fn login(
        &self,
        email: &str,
        plain_password: &str,
    ) -> Result<SignedTokenPair, AuthError> {
        // probe password validity with a bare lookup account before loading
        // the real one
        let lookup = BasicAccount::lookup(email);
        let validated = match self
            .account_store
            .validate_password(&lookup, plain_password)
            .await
        {
            Ok(validated) => validated,
            Err(err) => {
                debug!(error = %err, "password validation failed");
                return Err(AuthError::InvalidAuthentication);
            }
        };
        if !validated {
            return Err(AuthError::InvalidAuthentication);
        }

        let account = match self.account_store.get_by_email(email).await {
            Ok(account) => account,
            Err(err) => {
                warn!(error = %err, "acquiring account after password validation");
                return Err(AuthError::InvalidAuthentication);
            }
        };

        let tokens = self
            .signer
            .sign(account.profile().id)
            .context("signing token pair")?;

        self.access_sessions
            .set(
                Arc::clone(&account),
                &tokens.access_token,
                tokens.access_expires_at,
            )
            .await
            .context("storing access session")?;
        self.refresh_sessions
            .set(account, &tokens.refresh_token, tokens.refresh_expires_at)
            .await
            .context("storing refresh session")?;

        Ok(tokens)
    }

    /// Drops the access session. Logging out an unknown or already-expired
    /// token succeeds.
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        self.access_sessions
            .remove(access_token)
            .await
            .context("removing access session")?;
        Ok(())
    }

    /// Exchanges a live refresh session for a new access token. The refresh
    /// session itself is left untouched.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SignedToken, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidAuthentication);
        }

        let account = match self.refresh_sessions.get(refresh_token).await {
            Ok(account) => account,
            Err(SessionError::EmptyToken | SessionError::SessionNotExists) => {
                return Err(AuthError::InvalidAuthentication);
            }
            Err(err) => {
                return Err(AuthError::Internal(
                    anyhow::Error::new(err).context("acquiring refresh session"),
                ));
            }
        };

        let access = self
            .signer
            .sign_access(account.profile().id)
            .context("signing access token")?;

        self.access_sessions
            .set(account, &access.token, access.expires_at)
            .await
            .context("storing access session")?;

        Ok(access)
    }

    /// Resolves a live access session back to its account.
    pub async fn validate_session(&self, access_token: &str) -> Result<SharedAccount, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::InvalidAuthentication);
        }

        match self.access_sessions.get(access_token).await {
            Ok(account) => Ok(account),
            Err(SessionError::EmptyToken | SessionError::SessionNotExists) => {
                Err(AuthError::InvalidAuthentication)
            }
            Err(err) => Err(AuthError::Internal(
                anyhow::Error::new(err).context("acquiring access session"),
            )),
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

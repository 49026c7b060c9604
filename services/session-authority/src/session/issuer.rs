//! Issuance and rotation of session token pairs.

use crate::error::{AuthError, TokenError};
use crate::jwt::{AccessClaims, ClaimFactory, RefreshClaims, Role, SubjectId, TokenCodec};
use crate::keys::KeyManager;
use crate::metrics;
use crate::store::UserStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Role given to subjects created without one.
pub const DEFAULT_ROLE: Role = 0;

/// Signed access and refresh tokens of one session.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access: String,
    #[serde(rename = "refreshToken")]
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

pub struct SessionIssuer {
    keys: Arc<KeyManager>,
    factory: ClaimFactory,
    codec: TokenCodec,
    store: Arc<dyn UserStore>,
}

impl SessionIssuer {
    pub fn new(
        keys: Arc<KeyManager>,
        factory: ClaimFactory,
        codec: TokenCodec,
        store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            keys,
            factory,
            codec,
            store,
        }
    }

    /// Issue a token pair for `subject` with the default role.
    pub fn create_tokens(&self, subject: SubjectId) -> Result<TokenPair, AuthError> {
        self.create_tokens_with_role(subject, DEFAULT_ROLE)
    }

    /// Issue a cross-linked token pair. Nothing is returned unless both
    /// tokens were signed.
    #[instrument(skip(self))]
    pub fn create_tokens_with_role(
        &self,
        subject: SubjectId,
        role: Role,
    ) -> Result<TokenPair, AuthError> {
        let (access_claims, refresh_claims) = self.factory.build_session_claims(subject, role);

        let access = self
            .codec
            .sign(&access_claims, self.keys.access())
            .map_err(signing_failed)?;
        let refresh = self
            .codec
            .sign(&refresh_claims, self.keys.refresh())
            .map_err(signing_failed)?;

        metrics::record_token_issued("access");
        metrics::record_token_issued("refresh");
        info!(user_id = %subject, "Issued token pair");

        Ok(TokenPair { access, refresh })
    }

    /// Mint a new access token from a valid refresh token.
    ///
    /// The refresh token is not rotated and stays valid until it expires.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims: RefreshClaims = match self
            .codec
            .verify(refresh_token, self.keys.refresh().verifying_key())
        {
            Ok(claims) => claims,
            Err(e) => {
                debug!(reason = e.kind(), "Refresh token rejected");
                metrics::record_token_refreshed("rejected");
                return Err(AuthError::Unauthorized);
            }
        };
        let subject = claims.base.id;

        match self.store.find_by_id(subject).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                error!(user_id = %subject, "Refresh token subject no longer exists");
                metrics::record_token_refreshed("error");
                return Err(AuthError::internal(format!("subject {subject} not found")));
            }
            Err(e) => {
                error!(user_id = %subject, error = %e, "User lookup failed during refresh");
                metrics::record_token_refreshed("error");
                return Err(e.into());
            }
        }

        let access_claims: AccessClaims =
            self.factory
                .build_access_claims(subject, claims.base.role, &claims.base.jti);
        let access = self
            .codec
            .sign(&access_claims, self.keys.access())
            .map_err(|e| {
                metrics::record_token_refreshed("error");
                signing_failed(e)
            })?;

        metrics::record_token_issued("access");
        metrics::record_token_refreshed("success");
        info!(user_id = %subject, "Refreshed access token");

        Ok(access)
    }
}

fn signing_failed(err: TokenError) -> AuthError {
    error!(error = %err, "Token signing failed");
    AuthError::internal(err.to_string())
}

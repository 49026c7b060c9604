//! Request-level admission based on access tokens.
//!
//! Every rejection is reported as [`AuthError::Unauthorized`]; the precise
//! reason only reaches the debug log.

use crate::error::AuthError;
use crate::jwt::{AccessClaims, TokenCodec};
use crate::keys::KeyManager;
use crate::metrics;
use crate::store::UserStore;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use std::sync::Arc;
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "bearer ";

pub struct AuthGate {
    keys: Arc<KeyManager>,
    codec: TokenCodec,
    store: Arc<dyn UserStore>,
}

impl AuthGate {
    pub fn new(keys: Arc<KeyManager>, codec: TokenCodec, store: Arc<dyn UserStore>) -> Self {
        Self { keys, codec, store }
    }

    /// Read the credential from the `Authorization` header.
    ///
    /// A `Bearer ` scheme is stripped when present, in any letter case.
    pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = strip_bearer(value);
        (!token.is_empty()).then_some(token)
    }

    /// Verify an access token without consulting the user store.
    pub fn validate(&self, bearer: &str) -> Result<AccessClaims, AuthError> {
        let token = strip_bearer(bearer);
        self.codec
            .verify::<AccessClaims>(token, self.keys.access().verifying_key())
            .map_err(|e| {
                debug!(reason = e.kind(), "Access token rejected");
                AuthError::Unauthorized
            })
    }

    /// Admit a request whose access token verifies and whose subject still
    /// exists.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<AccessClaims, AuthError> {
        let decision = self.check(headers).await;
        metrics::record_gate_decision(if decision.is_ok() {
            "admitted"
        } else {
            "rejected"
        });
        decision
    }

    async fn check(&self, headers: &HeaderMap) -> Result<AccessClaims, AuthError> {
        let Some(token) = Self::extract_token(headers) else {
            debug!(reason = "missing_credential", "Request rejected");
            return Err(AuthError::Unauthorized);
        };
        let claims = self.validate(token)?;

        match self.store.find_by_id(claims.base.id).await {
            Ok(Some(_)) => Ok(claims),
            Ok(None) => {
                debug!(user_id = %claims.base.id, reason = "unknown_subject", "Request rejected");
                Err(AuthError::Unauthorized)
            }
            Err(e) => {
                warn!(
                    user_id = %claims.base.id,
                    error = %e,
                    "User lookup failed during authorization"
                );
                Err(AuthError::Unauthorized)
            }
        }
    }
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim_start();
    let token = match value.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            &value[BEARER_PREFIX.len()..]
        }
        _ => value,
    };
    token.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("bearer abc"), "abc");
        assert_eq!(strip_bearer("BEARER  abc "), "abc");
        assert_eq!(strip_bearer("abc"), "abc");
        assert_eq!(strip_bearer("Bear"), "Bear");
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(AuthGate::extract_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(AuthGate::extract_token(&headers("abc")), Some("abc"));
        assert_eq!(AuthGate::extract_token(&headers("Bearer ")), None);
        assert_eq!(AuthGate::extract_token(&HeaderMap::new()), None);
    }
}

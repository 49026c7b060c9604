//! Claim sets carried by access and refresh tokens.
//!
//! Both kinds share [`BaseClaims`]; field names are fixed by the wire format.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
/// Refresh token lifetime.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Issuer written into every claim set unless configured otherwise.
pub const DEFAULT_ISSUER: &str = "bookService";

/// Numeric user identifier.
pub type SubjectId = u64;
/// Numeric role carried in claims. No policy is attached to it here.
pub type Role = u64;

/// Which of the two session tokens a claim set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived token presented on every request
    Access,
    /// Long-lived token used only to mint access tokens
    Refresh,
}

impl TokenKind {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Claims shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaseClaims {
    pub iss: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    /// Subject id
    pub id: SubjectId,
    pub role: Role,
}

impl BaseClaims {
    pub fn new(issuer: &str, subject: SubjectId, role: Role, ttl: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        BaseClaims {
            iss: issuer.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
            id: subject,
            role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    #[serde(flatten)]
    pub base: BaseClaims,
    /// Token id of the sibling refresh claim
    pub access_uuid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    #[serde(flatten)]
    pub base: BaseClaims,
    /// Token id of the sibling access claim
    pub refresh_uuid: String,
    /// Same value as `base.id`
    pub user_id: SubjectId,
}

/// A claim set that can travel inside a session token.
pub trait SessionClaims: Serialize + DeserializeOwned {
    /// Token kind this shape belongs to.
    const KIND: TokenKind;

    /// Shared claims.
    fn base(&self) -> &BaseClaims;
}

impl SessionClaims for AccessClaims {
    const KIND: TokenKind = TokenKind::Access;

    fn base(&self) -> &BaseClaims {
        &self.base
    }
}

impl SessionClaims for RefreshClaims {
    const KIND: TokenKind = TokenKind::Refresh;

    fn base(&self) -> &BaseClaims {
        &self.base
    }
}

use crate::jwt::claims::{
    AccessClaims, BaseClaims, RefreshClaims, Role, SubjectId, ACCESS_TOKEN_TTL,
    REFRESH_TOKEN_TTL,
};
use std::time::Duration;

/// Builds the claim sets of a session.
#[derive(Debug, Clone)]
pub struct ClaimFactory {
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl ClaimFactory {
    pub fn new(issuer: impl Into<String>) -> Self {
        ClaimFactory {
            issuer: issuer.into(),
            access_ttl: ACCESS_TOKEN_TTL,
            refresh_ttl: REFRESH_TOKEN_TTL,
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Builds a cross-linked access/refresh pair: each claim carries the
    /// other's token id.
    pub fn build_session_claims(
        &self,
        subject: SubjectId,
        role: Role,
    ) -> (AccessClaims, RefreshClaims) {
        let access_base = BaseClaims::new(&self.issuer, subject, role, self.access_ttl);
        let refresh_base = BaseClaims::new(&self.issuer, subject, role, self.refresh_ttl);

        let access = AccessClaims {
            access_uuid: refresh_base.jti.clone(),
            base: access_base,
        };
        let refresh = RefreshClaims {
            refresh_uuid: access.base.jti.clone(),
            user_id: subject,
            base: refresh_base,
        };

        (access, refresh)
    }

    /// Builds a lone access claim linked to an existing refresh token id.
    pub fn build_access_claims(
        &self,
        subject: SubjectId,
        role: Role,
        refresh_jti: &str,
    ) -> AccessClaims {
        AccessClaims {
            base: BaseClaims::new(&self.issuer, subject, role, self.access_ttl),
            access_uuid: refresh_jti.to_string(),
        }
    }
}

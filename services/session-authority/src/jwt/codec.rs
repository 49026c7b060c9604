//! Compact JWS encoding and verification of session claims.

use crate::error::TokenError;
use crate::jwt::claims::SessionClaims;
use crate::keys::{SigningKeyPair, VerifyingKey, SIGNING_ALGORITHM};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use tracing::debug;

/// Signs and verifies session tokens with a pinned ECDSA algorithm.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCodec {
    pub fn new() -> Self {
        TokenCodec {
            algorithm: SIGNING_ALGORITHM,
        }
    }

    pub fn sign<C: SessionClaims>(
        &self,
        claims: &C,
        key: &SigningKeyPair,
    ) -> Result<String, TokenError> {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(key.kid().to_string());

        encode(&header, claims, key.encoding_key()).map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies `token` against the caller-supplied key and decodes it into
    /// the expected claim shape.
    ///
    /// The header algorithm is checked before the signature. Key hints in
    /// the header are never used to pick the verifying key.
    pub fn verify<C: SessionClaims>(
        &self,
        token: &str,
        key: &VerifyingKey,
    ) -> Result<C, TokenError> {
        let header = decode_header(token).map_err(|e| TokenError::Malformed(e.to_string()))?;

        if !is_ecdsa(header.alg) {
            return Err(TokenError::WrongSigningAlgorithm(format!("{:?}", header.alg)));
        }

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;

        let data = decode::<C>(token, key.decoding_key(), &validation).map_err(|e| {
            let err = TokenError::from(e);
            if matches!(err, TokenError::SignatureInvalid)
                && header.kid.as_deref() != Some(key.kid())
            {
                // Usually a token minted before the last restart.
                debug!(
                    token_kind = C::KIND.as_str(),
                    token_kid = ?header.kid,
                    expected_kid = %key.kid(),
                    "Token signed by an unknown key"
                );
            }
            err
        })?;

        Ok(data.claims)
    }
}

fn is_ecdsa(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::ES256 | Algorithm::ES384)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims::{AccessClaims, BaseClaims, RefreshClaims, ACCESS_TOKEN_TTL};
    use crate::jwt::factory::ClaimFactory;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use jsonwebtoken::EncodingKey;

    fn access_claims() -> AccessClaims {
        ClaimFactory::new("test-issuer").build_session_claims(7, 1).0
    }

    #[test]
    fn test_round_trip_es256() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let claims = access_claims();

        let token = codec.sign(&claims, &pair).unwrap();
        let decoded: AccessClaims = codec.verify(&token, pair.verifying_key()).unwrap();

        assert_eq!(claims, decoded);
    }

    #[test]
    fn test_header_carries_alg_and_kid() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let token = codec.sign(&access_claims(), &pair).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
        assert_eq!(header.kid.as_deref(), Some(pair.kid()));
    }

    #[test]
    fn test_wrong_key_is_signature_invalid() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let other = SigningKeyPair::generate().unwrap();
        let token = codec.sign(&access_claims(), &pair).unwrap();

        let result = codec.verify::<AccessClaims>(&token, other.verifying_key());
        assert!(matches!(result, Err(TokenError::SignatureInvalid)));
    }

    #[test]
    fn test_hmac_token_is_wrong_algorithm() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &access_claims(),
            &EncodingKey::from_secret(b"attacker-chosen-secret"),
        )
        .unwrap();

        let result = codec.verify::<AccessClaims>(&token, pair.verifying_key());
        assert!(matches!(result, Err(TokenError::WrongSigningAlgorithm(_))));
    }

    #[test]
    fn test_alg_none_is_rejected() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&access_claims()).unwrap());
        let token = format!("{header}.{payload}.");

        let result = codec.verify::<AccessClaims>(&token, pair.verifying_key());
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let mut claims = access_claims();
        claims.base.iat -= 7200;
        claims.base.exp = claims.base.iat + 3600;

        let token = codec.sign(&claims, &pair).unwrap();
        let result = codec.verify::<AccessClaims>(&token, pair.verifying_key());
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let token = codec.sign(&access_claims(), &pair).unwrap();

        let result = codec.verify::<RefreshClaims>(&token, pair.verifying_key());
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();

        for token in ["", "not-a-token", "a.b", "a.b.c"] {
            let result = codec.verify::<AccessClaims>(token, pair.verifying_key());
            assert!(matches!(result, Err(TokenError::Malformed(_))), "{token}");
        }
    }

    #[test]
    fn test_base_claims_survive_round_trip() {
        let codec = TokenCodec::new();
        let pair = SigningKeyPair::generate().unwrap();
        let claims = AccessClaims {
            base: BaseClaims::new("test-issuer", 99, 4, ACCESS_TOKEN_TTL),
            access_uuid: "sibling".to_string(),
        };

        let token = codec.sign(&claims, &pair).unwrap();
        let decoded: AccessClaims = codec.verify(&token, pair.verifying_key()).unwrap();

        assert_eq!(decoded.base.id, 99);
        assert_eq!(decoded.base.role, 4);
        assert_eq!(decoded.base.jti, claims.base.jti);
    }
}

//! Property-based tests for session claims and the token codec.
//!
//! Property 1: Sign/Verify round-trip preserves id, role and jti
//! Property 2: Access and refresh claims of a pair are cross-linked
//! Property 3: Tokens never verify under the other key

use jsonwebtoken::{decode_header, Algorithm};
use proptest::prelude::*;
use session_authority::jwt::{AccessClaims, ClaimFactory, RefreshClaims, TokenCodec};
use session_authority::keys::KeyManager;
use session_authority::TokenError;
use std::sync::OnceLock;

/// Key generation is comparatively slow; share one manager across cases.
fn keys() -> &'static KeyManager {
    static KEYS: OnceLock<KeyManager> = OnceLock::new();
    KEYS.get_or_init(|| KeyManager::generate().unwrap())
}

/// Generate arbitrary issuer strings.
fn arb_issuer() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9-]{0,63}".prop_map(|s| s)
}

/// Generate arbitrary subject ids.
fn arb_subject() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Generate arbitrary roles.
fn arb_role() -> impl Strategy<Value = u64> {
    0u64..16
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property 1: round-trip consistency
    #[test]
    fn prop_round_trip_preserves_claims(
        issuer in arb_issuer(),
        subject in arb_subject(),
        role in arb_role(),
    ) {
        let codec = TokenCodec::new();
        let (access, refresh) = ClaimFactory::new(issuer).build_session_claims(subject, role);

        let token = codec.sign(&access, keys().access()).unwrap();
        let decoded: AccessClaims =
            codec.verify(&token, keys().access().verifying_key()).unwrap();
        prop_assert_eq!(decoded.base.id, subject);
        prop_assert_eq!(decoded.base.role, role);
        prop_assert_eq!(&decoded.base.jti, &access.base.jti);
        prop_assert_eq!(&decoded, &access);

        let token = codec.sign(&refresh, keys().refresh()).unwrap();
        let decoded: RefreshClaims =
            codec.verify(&token, keys().refresh().verifying_key()).unwrap();
        prop_assert_eq!(decoded.user_id, subject);
        prop_assert_eq!(&decoded, &refresh);
    }

    /// Property 2: cross-link invariant
    #[test]
    fn prop_pair_is_cross_linked(subject in arb_subject(), role in arb_role()) {
        let (access, refresh) =
            ClaimFactory::new("bookService").build_session_claims(subject, role);

        prop_assert_eq!(&access.access_uuid, &refresh.base.jti);
        prop_assert_eq!(&refresh.refresh_uuid, &access.base.jti);
        prop_assert_ne!(&access.base.jti, &refresh.base.jti);
        prop_assert!(refresh.base.exp > access.base.exp);
    }

    /// Property 3: key separation
    #[test]
    fn prop_tokens_bound_to_their_key(subject in arb_subject()) {
        let codec = TokenCodec::new();
        let (access, _) = ClaimFactory::new("bookService").build_session_claims(subject, 0);
        let token = codec.sign(&access, keys().access()).unwrap();

        let header = decode_header(&token).unwrap();
        prop_assert_eq!(header.alg, Algorithm::ES256);

        let result = codec.verify::<AccessClaims>(&token, keys().refresh().verifying_key());
        prop_assert!(matches!(result, Err(TokenError::SignatureInvalid)));
    }

    /// Truncated or corrupted tokens never verify.
    #[test]
    fn prop_corrupted_tokens_rejected(subject in arb_subject(), cut in 1usize..40) {
        let codec = TokenCodec::new();
        let (access, _) = ClaimFactory::new("bookService").build_session_claims(subject, 0);
        let token = codec.sign(&access, keys().access()).unwrap();

        let truncated = &token[..token.len() - cut];
        let result = codec.verify::<AccessClaims>(truncated, keys().access().verifying_key());
        prop_assert!(result.is_err());
    }
}

//! Integration tests for session issuance, validation and refresh.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rust_common::PlatformError;
use session_authority::jwt::{AccessClaims, ClaimFactory, RefreshClaims, TokenCodec};
use session_authority::notify::RecordingNotifier;
use session_authority::store::{MemoryUserStore, NewUser, User, UserStore};
use session_authority::{AuthError, Authority, Config};
use std::sync::Arc;
use std::time::Duration;

fn test_config() -> Config {
    Config {
        bcrypt_cost: 4,
        ..Config::default()
    }
}

async fn authority_with_users(count: u64) -> (Authority, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    for i in 1..=count {
        store
            .insert(NewUser {
                login: format!("user{i}@example.com"),
                password_hash: "hash".to_string(),
                role: i % 3,
            })
            .await
            .unwrap();
    }
    let authority = Authority::new(
        &test_config(),
        store.clone(),
        Arc::new(RecordingNotifier::new()),
    )
    .unwrap();
    (authority, store)
}

/// Sign claims that expired an hour ago with the authority's own keys.
fn expired_access(authority: &Authority, subject: u64) -> String {
    let mut claims = ClaimFactory::new("bookService").build_session_claims(subject, 0).0;
    claims.base.iat -= 7200;
    claims.base.exp = claims.base.iat + 3600;
    TokenCodec::new()
        .sign(&claims, authority.keys().access())
        .unwrap()
}

fn expired_refresh(authority: &Authority, subject: u64) -> String {
    let mut claims = ClaimFactory::new("bookService").build_session_claims(subject, 0).1;
    claims.base.iat -= 1_000_000;
    claims.base.exp = claims.base.iat + 604_800;
    TokenCodec::new()
        .sign(&claims, authority.keys().refresh())
        .unwrap()
}

#[tokio::test]
async fn test_subject_42_lifecycle() {
    let (authority, _store) = authority_with_users(42).await;
    let sessions = authority.sessions();
    let gate = authority.gate();

    let pair = sessions.create_tokens(42).unwrap();
    let claims = gate.validate(&pair.access).unwrap();
    assert_eq!(claims.base.id, 42);

    let expired = expired_access(&authority, 42);
    assert!(matches!(gate.validate(&expired), Err(AuthError::Unauthorized)));

    let new_access = sessions.refresh(&pair.refresh).await.unwrap();
    let refreshed = gate.validate(&new_access).unwrap();
    assert_eq!(refreshed.base.id, 42);
    assert_ne!(refreshed.base.jti, claims.base.jti);
}

#[tokio::test]
async fn test_pair_verifies_and_is_cross_linked() {
    let (authority, _store) = authority_with_users(1).await;
    let pair = authority.sessions().create_tokens(1).unwrap();
    let codec = TokenCodec::new();

    let access: AccessClaims = codec
        .verify(&pair.access, authority.keys().access().verifying_key())
        .unwrap();
    let refresh: RefreshClaims = codec
        .verify(&pair.refresh, authority.keys().refresh().verifying_key())
        .unwrap();

    assert_eq!(access.access_uuid, refresh.base.jti);
    assert_eq!(refresh.refresh_uuid, access.base.jti);
    assert_eq!(access.base.iss, "bookService");
    assert_eq!(refresh.user_id, 1);
}

#[tokio::test]
async fn test_validate_rejects_foreign_algorithms() {
    let (authority, _store) = authority_with_users(1).await;
    let claims = ClaimFactory::new("bookService").build_session_claims(1, 0).0;
    let forged = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"guessable"),
    )
    .unwrap();

    assert!(matches!(
        authority.gate().validate(&forged),
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_refresh_links_to_original_refresh_jti() {
    let (authority, _store) = authority_with_users(2).await;
    let pair = authority.sessions().create_tokens_with_role(2, 5).unwrap();
    let codec = TokenCodec::new();
    let original: AccessClaims = codec
        .verify(&pair.access, authority.keys().access().verifying_key())
        .unwrap();
    let refresh: RefreshClaims = codec
        .verify(&pair.refresh, authority.keys().refresh().verifying_key())
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let new_access = authority.sessions().refresh(&pair.refresh).await.unwrap();
    let renewed = authority.gate().validate(&new_access).unwrap();

    assert_eq!(renewed.access_uuid, refresh.base.jti);
    assert_eq!(renewed.base.role, 5);
    assert!(renewed.base.exp > original.base.exp);
}

#[tokio::test]
async fn test_refresh_does_not_rotate_refresh_token() {
    let (authority, _store) = authority_with_users(1).await;
    let pair = authority.sessions().create_tokens(1).unwrap();

    let first = authority.sessions().refresh(&pair.refresh).await.unwrap();
    let second = authority.sessions().refresh(&pair.refresh).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_refresh_rejects_expired_and_garbage() {
    let (authority, _store) = authority_with_users(1).await;

    let expired = expired_refresh(&authority, 1);
    assert!(matches!(
        authority.sessions().refresh(&expired).await,
        Err(AuthError::Unauthorized)
    ));
    assert!(matches!(
        authority.sessions().refresh("not.a.token").await,
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_refresh_for_removed_subject_is_internal() {
    let (authority, store) = authority_with_users(3).await;
    let pair = authority.sessions().create_tokens(3).unwrap();

    store.delete(3).await.unwrap();
    assert!(matches!(
        authority.sessions().refresh(&pair.refresh).await,
        Err(AuthError::Internal(_))
    ));
}

/// Store whose lookups always fail.
struct BrokenStore;

#[async_trait::async_trait]
impl UserStore for BrokenStore {
    async fn find_by_id(&self, _id: u64) -> Result<Option<User>, PlatformError> {
        Err(PlatformError::unavailable("database down"))
    }

    async fn find_by_login(&self, _login: &str) -> Result<Option<User>, PlatformError> {
        Err(PlatformError::unavailable("database down"))
    }

    async fn insert(&self, _user: NewUser) -> Result<User, PlatformError> {
        Err(PlatformError::unavailable("database down"))
    }

    async fn save_recovery_token(&self, _id: u64, _token: &str) -> Result<(), PlatformError> {
        Err(PlatformError::unavailable("database down"))
    }

    async fn verify_recovery_token(&self, _token: &str) -> Result<Option<u64>, PlatformError> {
        Err(PlatformError::unavailable("database down"))
    }

    async fn take_recovery_token(&self, _token: &str) -> Result<Option<u64>, PlatformError> {
        Err(PlatformError::unavailable("database down"))
    }

    async fn set_password(&self, _id: u64, _hash: &str) -> Result<(), PlatformError> {
        Err(PlatformError::unavailable("database down"))
    }
}

#[tokio::test]
async fn test_refresh_store_failure_is_internal() {
    let authority = Authority::new(
        &test_config(),
        Arc::new(BrokenStore),
        Arc::new(RecordingNotifier::new()),
    )
    .unwrap();
    let pair = authority.sessions().create_tokens(1).unwrap();

    assert!(matches!(
        authority.sessions().refresh(&pair.refresh).await,
        Err(AuthError::Internal(_))
    ));
}

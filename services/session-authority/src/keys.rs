//! Signing key pairs for session tokens.
//!
//! Keys are generated in memory at startup and never persisted, so tokens
//! minted by a previous process stop verifying after a restart.

use crate::error::TokenError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::info;
use zeroize::Zeroizing;

/// Algorithm used for every session token.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::ES256;

/// Public half of a key pair, used to verify tokens.
#[derive(Clone)]
pub struct VerifyingKey {
    key: DecodingKey,
    kid: String,
}

impl VerifyingKey {
    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    /// Key id derived from the public point.
    pub fn kid(&self) -> &str {
        &self.kid
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey").field("kid", &self.kid).finish()
    }
}

/// ECDSA P-256 key pair.
pub struct SigningKeyPair {
    signing: EncodingKey,
    verifying: VerifyingKey,
}

impl SigningKeyPair {
    /// Generate a fresh key pair from the system CSPRNG.
    pub fn generate() -> Result<Self, TokenError> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .map_err(|_| TokenError::KeyGeneration("PKCS#8 generation failed".to_string()))?;
        let pkcs8 = Zeroizing::new(pkcs8.as_ref().to_vec());

        let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &pkcs8, &rng)
            .map_err(|e| TokenError::KeyGeneration(e.to_string()))?;
        let public_key = pair.public_key().as_ref();

        Ok(Self {
            signing: EncodingKey::from_ec_der(&pkcs8),
            verifying: VerifyingKey {
                key: DecodingKey::from_ec_der(public_key),
                kid: key_id(public_key),
            },
        })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.signing
    }

    /// Public half used for verification.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    /// Key id written into token headers.
    pub fn kid(&self) -> &str {
        self.verifying.kid()
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.verifying.kid)
            .finish_non_exhaustive()
    }
}

/// Holds the access and refresh key pairs for the process lifetime.
#[derive(Debug)]
pub struct KeyManager {
    access: SigningKeyPair,
    refresh: SigningKeyPair,
}

impl KeyManager {
    /// Generate both key pairs. Any failure is fatal for startup.
    pub fn generate() -> Result<Self, TokenError> {
        let access = SigningKeyPair::generate()?;
        let refresh = SigningKeyPair::generate()?;

        info!(
            access_kid = %access.kid(),
            refresh_kid = %refresh.kid(),
            "Generated session signing keys"
        );

        Ok(Self { access, refresh })
    }

    pub fn access(&self) -> &SigningKeyPair {
        &self.access
    }

    pub fn refresh(&self) -> &SigningKeyPair {
        &self.refresh
    }
}

/// First 16 characters of the base64url SHA-256 of the public point.
fn key_id(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    let mut kid = URL_SAFE_NO_PAD.encode(digest);
    kid.truncate(16);
    kid
}

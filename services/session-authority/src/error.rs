//! Error types for token handling and the authority boundary.
//!
//! [`TokenError`] carries the precise reason a token could not be produced or
//! verified. [`AuthError`] is what callers of the authority see: every
//! verification failure collapses into [`AuthError::Unauthorized`] so that
//! responses never reveal which check rejected a credential.

use http::StatusCode;
use rust_common::PlatformError;
use thiserror::Error;

/// Codec and key-level failures.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Token is not a well-formed compact JWS or has the wrong claim shape
    #[error("Token malformed: {0}")]
    Malformed(String),

    /// Header declares an algorithm outside the ECDSA family
    #[error("Unexpected signing algorithm: {0}")]
    WrongSigningAlgorithm(String),

    /// Signature does not match the expected public key
    #[error("Token signature invalid")]
    SignatureInvalid,

    /// Token expiry is in the past
    #[error("Token expired")]
    Expired,

    /// Signing a claim set failed
    #[error("JWT signing error: {0}")]
    Signing(String),

    /// Key pair generation failed
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),
}

impl TokenError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::WrongSigningAlgorithm(_) => "wrong_algorithm",
            Self::SignatureInvalid => "signature_invalid",
            Self::Expired => "expired",
            Self::Signing(_) => "signing",
            Self::KeyGeneration(_) => "key_generation",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::SignatureInvalid,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::WrongSigningAlgorithm(err.to_string())
            }
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Errors surfaced by the authority to the transport layer.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad, expired, forged or absent credential
    #[error("Unauthorized")]
    Unauthorized,

    /// Recovery token unknown or already redeemed
    #[error("Recovery token invalid")]
    InvalidToken,

    /// Subject does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request payload rejected before any processing
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Signing, store or key generation failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable error code for responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => AUTH_UNAUTHORIZED,
            Self::InvalidToken => AUTH_RECOVERY_TOKEN_INVALID,
            Self::NotFound(_) => AUTH_NOT_FOUND,
            Self::InvalidInput(_) => AUTH_INVALID_INPUT,
            Self::Internal(_) | Self::Configuration(_) => AUTH_INTERNAL,
        }
    }

    /// HTTP status the transport layer should answer with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) | Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients. Internal details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Configuration(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<PlatformError> for AuthError {
    fn from(err: PlatformError) -> Self {
        Self::Internal(err.to_string())
    }
}

// Error codes for responses
pub const AUTH_UNAUTHORIZED: &str = "AUTH_UNAUTHORIZED";
pub const AUTH_RECOVERY_TOKEN_INVALID: &str = "AUTH_RECOVERY_TOKEN_INVALID";
pub const AUTH_NOT_FOUND: &str = "AUTH_NOT_FOUND";
pub const AUTH_INVALID_INPUT: &str = "AUTH_INVALID_INPUT";
pub const AUTH_INTERNAL: &str = "AUTH_INTERNAL";

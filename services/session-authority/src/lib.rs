//! Session Authority library.
//!
//! Issues, validates and refreshes ES256-signed session tokens, and manages
//! single-use password recovery tokens.

#![forbid(unsafe_code)]

pub mod authority;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod middleware;
pub mod notify;
pub mod password;
pub mod recovery;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use authority::Authority;
pub use config::Config;
pub use error::{AuthError, TokenError};
pub use gate::AuthGate;
pub use session::{SessionIssuer, TokenPair};

//! User storage capability.
//!
//! The authority only needs a handful of lookups and updates from the user
//! database. They are expressed as the [`UserStore`] trait so the backing
//! database can be swapped; [`MemoryUserStore`] is the in-process adapter.

pub mod memory;

use crate::jwt::claims::{Role, SubjectId};
use async_trait::async_trait;
use rust_common::PlatformError;

pub use memory::MemoryUserStore;

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: SubjectId,
    pub login: String,
    /// Adaptive hash of the password, never the plaintext
    pub password_hash: String,
    pub role: Role,
}

/// Insert shape of a user; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub role: Role,
}

/// Storage operations used by the authority.
///
/// Absent records are `Ok(None)`; `Err` is reserved for store failures.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: SubjectId) -> Result<Option<User>, PlatformError>;

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, PlatformError>;

    /// Insert a user. Fails with [`PlatformError::Conflict`] when the login
    /// is taken.
    async fn insert(&self, user: NewUser) -> Result<User, PlatformError>;

    /// Store `token` as the user's pending recovery token, replacing any
    /// previous one.
    async fn save_recovery_token(&self, id: SubjectId, token: &str)
        -> Result<(), PlatformError>;

    /// Resolve the owner of a pending recovery token.
    async fn verify_recovery_token(&self, token: &str)
        -> Result<Option<SubjectId>, PlatformError>;

    /// Resolve the owner of a pending recovery token and remove it in one
    /// step. Of several concurrent calls with the same token at most one
    /// gets `Some`.
    async fn take_recovery_token(&self, token: &str)
        -> Result<Option<SubjectId>, PlatformError>;

    async fn set_password(&self, id: SubjectId, password_hash: &str)
        -> Result<(), PlatformError>;
}

//! In-memory [`UserStore`] adapter.
//!
//! Used by tests and local runs. Recovery tokens are held as SHA-256
//! digests and compared in constant time.

use super::{NewUser, User, UserStore};
use crate::jwt::claims::SubjectId;
use async_trait::async_trait;
use rust_common::PlatformError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<SubjectId, User>,
    recovery_digests: HashMap<SubjectId, [u8; 32]>,
    last_id: SubjectId,
}

/// Process-local user store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user and any pending recovery token.
    pub async fn delete(&self, id: SubjectId) -> Option<User> {
        let mut inner = self.inner.write().await;
        inner.recovery_digests.remove(&id);
        inner.users.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: SubjectId) -> Result<Option<User>, PlatformError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, PlatformError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.login == login).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, PlatformError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.login == user.login) {
            return Err(PlatformError::conflict(format!(
                "login {} already registered",
                user.login
            )));
        }

        inner.last_id += 1;
        let stored = User {
            id: inner.last_id,
            login: user.login,
            password_hash: user.password_hash,
            role: user.role,
        };
        inner.users.insert(stored.id, stored.clone());

        debug!(user_id = %stored.id, "Inserted user");
        Ok(stored)
    }

    async fn save_recovery_token(
        &self,
        id: SubjectId,
        token: &str,
    ) -> Result<(), PlatformError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&id) {
            return Err(PlatformError::not_found(format!("user {id}")));
        }
        inner.recovery_digests.insert(id, digest(token));
        Ok(())
    }

    async fn verify_recovery_token(
        &self,
        token: &str,
    ) -> Result<Option<SubjectId>, PlatformError> {
        let candidate = digest(token);
        let inner = self.inner.read().await;
        let owner = inner
            .recovery_digests
            .iter()
            .find(|(_, stored)| bool::from(stored[..].ct_eq(&candidate[..])))
            .map(|(id, _)| *id);
        Ok(owner)
    }

    async fn take_recovery_token(
        &self,
        token: &str,
    ) -> Result<Option<SubjectId>, PlatformError> {
        let candidate = digest(token);
        let mut inner = self.inner.write().await;
        let owner = inner
            .recovery_digests
            .iter()
            .find(|(_, stored)| bool::from(stored[..].ct_eq(&candidate[..])))
            .map(|(id, _)| *id);
        if let Some(id) = owner {
            inner.recovery_digests.remove(&id);
        }
        Ok(owner)
    }

    async fn set_password(
        &self,
        id: SubjectId,
        password_hash: &str,
    ) -> Result<(), PlatformError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| PlatformError::not_found(format!("user {id}")))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

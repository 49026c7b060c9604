//! Sign-up and sign-in.

use crate::error::AuthError;
use crate::jwt::Role;
use crate::password::PasswordHasher;
use crate::session::{SessionIssuer, TokenPair};
use crate::store::{NewUser, User, UserStore};
use rust_common::PlatformError;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct CredentialService {
    store: Arc<dyn UserStore>,
    issuer: Arc<SessionIssuer>,
    hasher: PasswordHasher,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn UserStore>,
        issuer: Arc<SessionIssuer>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            issuer,
            hasher,
        }
    }

    /// Register a user. The login is stored trimmed.
    #[instrument(skip(self, login, password))]
    pub async fn sign_up(
        &self,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let login = login.trim();
        if login.is_empty() || password.trim().is_empty() {
            return Err(AuthError::invalid_input("login and password are required"));
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .store
            .insert(NewUser {
                login: login.to_string(),
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                PlatformError::Conflict(_) => AuthError::invalid_input("login already registered"),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Check credentials and open a session.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, login: &str, password: &str) -> Result<TokenPair, AuthError> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(AuthError::invalid_input("login and password are required"));
        }

        let Some(user) = self.store.find_by_login(login).await? else {
            debug!(reason = "unknown_login", "Sign-in rejected");
            return Err(AuthError::Unauthorized);
        };
        if !self.hasher.verify(password, &user.password_hash).await {
            debug!(user_id = %user.id, reason = "password_mismatch", "Sign-in rejected");
            return Err(AuthError::Unauthorized);
        }

        self.issuer.create_tokens_with_role(user.id, user.role)
    }
}

//! Password recovery tokens.
//!
//! A recovery token is an opaque random string, unrelated to session
//! tokens. At most one is pending per user; issuing a new one replaces the
//! old. Redeeming sets a new password and consumes the token.

use super::generator::RecoveryTokenGenerator;
use crate::error::AuthError;
use crate::metrics;
use crate::notify::DeliveryPool;
use crate::password::PasswordHasher;
use crate::store::UserStore;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// How recovery requests for unknown logins are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Answer unknown logins with success instead of `NotFound`
    pub mask_unknown_login: bool,
}

pub struct RecoveryTokenService {
    store: Arc<dyn UserStore>,
    deliveries: Arc<DeliveryPool>,
    hasher: PasswordHasher,
    policy: RecoveryPolicy,
}

impl RecoveryTokenService {
    pub fn new(
        store: Arc<dyn UserStore>,
        deliveries: Arc<DeliveryPool>,
        hasher: PasswordHasher,
        policy: RecoveryPolicy,
    ) -> Self {
        Self {
            store,
            deliveries,
            hasher,
            policy,
        }
    }

    /// Issue a recovery token for `login` and queue its delivery.
    ///
    /// Succeeds once the token is stored. Delivery happens later and its
    /// outcome is only logged.
    #[instrument(skip(self, login))]
    pub async fn issue_recovery_token(&self, login: &str) -> Result<(), AuthError> {
        let user = match self.store.find_by_login(login).await {
            Ok(Some(user)) => user,
            Ok(None) if self.policy.mask_unknown_login => {
                debug!("Recovery requested for unknown login, masked");
                metrics::record_recovery_operation("issue", "unknown_login");
                return Ok(());
            }
            Ok(None) => {
                metrics::record_recovery_operation("issue", "unknown_login");
                return Err(AuthError::NotFound("login".to_string()));
            }
            Err(e) => {
                metrics::record_recovery_operation("issue", "error");
                return Err(e.into());
            }
        };

        let token = RecoveryTokenGenerator::generate();
        if let Err(e) = self.store.save_recovery_token(user.id, &token).await {
            metrics::record_recovery_operation("issue", "error");
            return Err(e.into());
        }

        if !self.deliveries.submit(&user.login, &token) {
            warn!(user_id = %user.id, "Recovery token stored but notification was dropped");
        }

        metrics::record_recovery_operation("issue", "success");
        info!(user_id = %user.id, "Recovery token issued");
        Ok(())
    }

    /// Consume `token` and set a new password for its owner.
    ///
    /// The token is spent even when setting the password fails afterwards;
    /// the user then has to request a new one.
    #[instrument(skip_all)]
    pub async fn redeem_recovery_token(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.is_empty() {
            metrics::record_recovery_operation("redeem", "invalid_input");
            return Err(AuthError::invalid_input("new password must not be empty"));
        }
        if token.is_empty() {
            metrics::record_recovery_operation("redeem", "invalid_token");
            return Err(AuthError::InvalidToken);
        }

        // Consumed before hashing: concurrent redemptions cannot both pass.
        let subject = match self.store.take_recovery_token(token).await {
            Ok(Some(subject)) => subject,
            Ok(None) => {
                metrics::record_recovery_operation("redeem", "invalid_token");
                return Err(AuthError::InvalidToken);
            }
            Err(e) => {
                metrics::record_recovery_operation("redeem", "error");
                return Err(e.into());
            }
        };

        let result = async {
            let password_hash = self.hasher.hash(new_password).await?;
            self.store.set_password(subject, &password_hash).await?;
            Ok::<_, AuthError>(())
        }
        .await;

        match &result {
            Ok(()) => {
                metrics::record_recovery_operation("redeem", "success");
                info!(user_id = %subject, "Password reset through recovery token");
            }
            Err(e) => {
                metrics::record_recovery_operation("redeem", "error");
                warn!(user_id = %subject, error = %e, "Recovery token redemption failed");
            }
        }
        result
    }
}

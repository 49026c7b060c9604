//! Composition root.
//!
//! Owns the signing keys for the process lifetime and wires every
//! component by injection.

use crate::config::Config;
use crate::credentials::CredentialService;
use crate::error::AuthError;
use crate::gate::AuthGate;
use crate::jwt::{ClaimFactory, TokenCodec};
use crate::keys::KeyManager;
use crate::middleware::AuthLayer;
use crate::notify::{DeliveryPool, Notifier, WebhookNotifier};
use crate::password::PasswordHasher;
use crate::recovery::{RecoveryPolicy, RecoveryTokenService};
use crate::session::SessionIssuer;
use crate::store::UserStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct Authority {
    keys: Arc<KeyManager>,
    issuer: Arc<SessionIssuer>,
    gate: Arc<AuthGate>,
    recovery: RecoveryTokenService,
    credentials: CredentialService,
    deliveries: Arc<DeliveryPool>,
    shutdown_timeout: Duration,
}

impl Authority {
    /// Build every component. Must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Key generation failure is fatal; so is a delivery pool that cannot
    /// start.
    pub fn new(
        config: &Config,
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AuthError> {
        let keys = Arc::new(KeyManager::generate().map_err(|e| {
            error!(error = %e, "Signing key generation failed");
            AuthError::internal(e.to_string())
        })?);

        let factory = ClaimFactory::new(config.jwt_issuer.clone())
            .with_ttls(config.access_token_ttl, config.refresh_token_ttl);
        let codec = TokenCodec::new();
        let hasher = PasswordHasher::new(config.bcrypt_cost);

        let issuer = Arc::new(SessionIssuer::new(
            Arc::clone(&keys),
            factory,
            codec.clone(),
            Arc::clone(&store),
        ));
        let gate = Arc::new(AuthGate::new(Arc::clone(&keys), codec, Arc::clone(&store)));

        let deliveries = Arc::new(DeliveryPool::new(
            notifier,
            config.notifier_queue_capacity,
            config.notifier_workers,
        )?);
        let recovery = RecoveryTokenService::new(
            Arc::clone(&store),
            Arc::clone(&deliveries),
            hasher,
            RecoveryPolicy {
                mask_unknown_login: config.recovery_mask_unknown_login,
            },
        );
        let credentials = CredentialService::new(store, Arc::clone(&issuer), hasher);

        info!(issuer = %config.jwt_issuer, "Session authority ready");

        Ok(Self {
            keys,
            issuer,
            gate,
            recovery,
            credentials,
            deliveries,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Build with the webhook notifier named in `config`.
    ///
    /// # Errors
    ///
    /// Fails when no webhook URL is configured, or as [`Authority::new`].
    pub fn with_webhook(config: &Config, store: Arc<dyn UserStore>) -> Result<Self, AuthError> {
        let endpoint = config
            .notifier_webhook_url
            .as_deref()
            .ok_or_else(|| AuthError::config("NOTIFIER_WEBHOOK_URL is not set"))?;
        let notifier = WebhookNotifier::new(endpoint, config.recovery_link_base.clone())
            .with_timeout(config.notifier_timeout);

        Self::new(config, store, Arc::new(notifier))
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.issuer
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Tower layer guarding routes with this authority's gate.
    pub fn auth_layer(&self) -> AuthLayer {
        AuthLayer::new(Arc::clone(&self.gate))
    }

    pub fn recovery(&self) -> &RecoveryTokenService {
        &self.recovery
    }

    pub fn credentials(&self) -> &CredentialService {
        &self.credentials
    }

    /// Drain pending notifications within the configured timeout.
    pub async fn shutdown(&self) {
        info!("Shutting down session authority");
        self.deliveries.shutdown(self.shutdown_timeout).await;
    }
}

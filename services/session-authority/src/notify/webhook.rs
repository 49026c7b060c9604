//! Mail relay adapter speaking JSON over HTTP.

use super::Notifier;
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_common::PlatformError;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Subject line of recovery mails.
pub const RECOVERY_SUBJECT: &str = "Password recovery";

/// Time allowed for one relay request unless configured otherwise.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    to: &'a str,
    subject: &'a str,
    body: String,
}

/// Posts recovery mails to a relay endpoint.
///
/// Relay answers map onto [`PlatformError`]: 429 is `RateLimited`, other
/// 4xx are `InvalidInput`, 5xx are `Unavailable`, and an elapsed request
/// timeout is `Timeout`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    endpoint: String,
    link_base: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>, link_base: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            link_base: link_base.into(),
            timeout: DEFAULT_RELAY_TIMEOUT,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn body(&self, token: &str) -> String {
        format!(
            "Follow the link to set a new password: {}?token={}",
            self.link_base, token
        )
    }
}

fn relay_status_error(status: StatusCode) -> PlatformError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        PlatformError::RateLimited
    } else if status.is_client_error() {
        PlatformError::invalid_input(format!("mail relay rejected request: HTTP {status}"))
    } else {
        PlatformError::unavailable(format!("mail relay answered HTTP {status}"))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, address, token), fields(endpoint = %self.endpoint))]
    async fn send(&self, address: &str, token: &str) -> Result<(), PlatformError> {
        let start = Instant::now();
        let request = MailRequest {
            to: address,
            subject: RECOVERY_SUBJECT,
            body: self.body(token),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlatformError::timeout(format!("mail relay: {e}"))
                } else {
                    PlatformError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(relay_status_error(status));
        }

        debug!(
            delivery_time_ms = start.elapsed().as_millis() as u64,
            "Recovery mail accepted by relay"
        );
        Ok(())
    }
}

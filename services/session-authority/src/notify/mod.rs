//! Outbound delivery of recovery tokens.
//!
//! [`Notifier`] is the capability the recovery flow hands tokens to.
//! Deliveries never run on the request path: they are queued on a
//! [`DeliveryPool`] and executed by a fixed set of workers.

pub mod dispatcher;
pub mod memory;
pub mod webhook;

use async_trait::async_trait;
use rust_common::PlatformError;

pub use dispatcher::DeliveryPool;
pub use memory::{RecordingNotifier, SentNotification};
pub use webhook::WebhookNotifier;

/// Sends a recovery token to a user's address.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, address: &str, token: &str) -> Result<(), PlatformError>;
}

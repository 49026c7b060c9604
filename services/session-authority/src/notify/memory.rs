//! In-process [`Notifier`] that records deliveries.

use super::Notifier;
use async_trait::async_trait;
use rust_common::PlatformError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// A delivery captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub address: String,
    pub token: String,
}

/// Records every delivery instead of sending it.
///
/// Can be switched into a failing mode to exercise error paths.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    attempts: Mutex<usize>,
    failing: AtomicBool,
    delivered: Notify,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails.
    #[must_use]
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful deliveries so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Delivery attempts so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.lock().map(|n| *n).unwrap_or_default()
    }

    /// Wait until at least `count` attempts were made, or the timeout elapses.
    /// Returns whether the count was reached.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.delivered.notified();
                if self.attempts() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, address: &str, token: &str) -> Result<(), PlatformError> {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(PlatformError::unavailable("notifier switched off"))
        } else {
            let mut sent = self
                .sent
                .lock()
                .map_err(|_| PlatformError::internal("notifier state poisoned"))?;
            sent.push(SentNotification {
                address: address.to_string(),
                token: token.to_string(),
            });
            Ok(())
        };

        if let Ok(mut attempts) = self.attempts.lock() {
            *attempts += 1;
        }
        self.delivered.notify_waiters();
        result
    }
}

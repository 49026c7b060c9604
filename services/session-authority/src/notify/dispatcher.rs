//! Bounded background delivery of recovery notifications.
//!
//! A fixed set of workers drains a bounded queue. Submitting never waits:
//! when the queue is full the delivery is dropped and counted.

use super::Notifier;
use crate::error::AuthError;
use crate::metrics;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// A queued recovery notification. The token is wiped when dropped.
struct Delivery {
    address: String,
    token: Zeroizing<String>,
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("address", &self.address)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Delivery>>>;

/// Worker pool running [`Notifier`] deliveries off the request path.
pub struct DeliveryPool {
    sender: Mutex<Option<mpsc::Sender<Delivery>>>,
    workers: tokio::sync::Mutex<JoinSet<()>>,
}

impl fmt::Debug for DeliveryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryPool").finish_non_exhaustive()
    }
}

impl DeliveryPool {
    /// Start `workers` tasks draining a queue of `capacity` deliveries.
    ///
    /// # Errors
    ///
    /// Fails outside a tokio runtime or when either size is zero.
    pub fn new(
        notifier: Arc<dyn Notifier>,
        capacity: usize,
        workers: usize,
    ) -> Result<Self, AuthError> {
        if capacity == 0 || workers == 0 {
            return Err(AuthError::config(
                "delivery pool needs a positive capacity and worker count",
            ));
        }
        let handle = Handle::try_current()
            .map_err(|e| AuthError::config(format!("delivery pool needs a runtime: {e}")))?;

        let (sender, receiver) = mpsc::channel(capacity);
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut join_set = JoinSet::new();
        for worker in 0..workers {
            join_set.spawn_on(
                run_worker(worker, Arc::clone(&receiver), Arc::clone(&notifier)),
                &handle,
            );
        }

        info!(capacity, workers, "Started notification delivery pool");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: tokio::sync::Mutex::new(join_set),
        })
    }

    /// Queue a delivery. Returns `false` when it was dropped.
    pub fn submit(&self, address: &str, token: &str) -> bool {
        let delivery = Delivery {
            address: address.to_string(),
            token: Zeroizing::new(token.to_string()),
        };

        let Ok(guard) = self.sender.lock() else {
            warn!("Delivery queue state poisoned, dropping notification");
            metrics::record_notification("dropped", None);
            return false;
        };
        let Some(sender) = guard.as_ref() else {
            warn!("Delivery pool shut down, dropping notification");
            metrics::record_notification("dropped", None);
            return false;
        };

        match sender.try_send(delivery) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Delivery queue full, dropping notification");
                metrics::record_notification("dropped", None);
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Delivery queue closed, dropping notification");
                metrics::record_notification("dropped", None);
                false
            }
        }
    }

    /// Close the queue and let workers drain it. Workers still running when
    /// `timeout` elapses are aborted.
    pub async fn shutdown(&self, timeout: Duration) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }

        let mut workers = self.workers.lock().await;
        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = workers.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Delivery worker failed during shutdown");
                }
            }
        })
        .await;

        match drained {
            Ok(()) => info!("Notification delivery pool drained"),
            Err(_) => {
                warn!("Shutdown timeout reached, aborting delivery workers");
                workers.abort_all();
            }
        }
    }
}

async fn run_worker(worker: usize, receiver: SharedReceiver, notifier: Arc<dyn Notifier>) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(delivery) = next else {
            debug!(worker, "Delivery queue closed, worker exiting");
            return;
        };

        let start = Instant::now();
        match notifier.send(&delivery.address, &delivery.token).await {
            Ok(()) => {
                metrics::record_notification("sent", Some(start.elapsed().as_secs_f64()));
                debug!(worker, "Recovery notification delivered");
            }
            Err(e) => {
                metrics::record_notification("failed", Some(start.elapsed().as_secs_f64()));
                warn!(
                    worker,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Recovery notification delivery failed"
                );
            }
        }
    }
}

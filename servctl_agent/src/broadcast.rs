//! Background status loop: periodically polls the aggregator and fans the
//! result out to every connected observer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ControlError;
use crate::status::StatusSource;
use crate::types::StatusUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub period: Duration,
    pub backoff: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            period: Duration::from_secs(5),
            backoff: Duration::from_secs(10),
        }
    }
}

/// Fan-out point for status updates. Observers come and go freely; the hub
/// only remembers the latest update so late joiners are not left empty.
#[derive(Clone)]
pub struct StatusHub {
    tx: broadcast::Sender<StatusUpdate>,
    latest: Arc<RwLock<Option<StatusUpdate>>>,
}

impl StatusHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        StatusHub {
            tx,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.tx.subscribe()
    }

    pub async fn latest(&self) -> Option<StatusUpdate> {
        self.latest.read().await.clone()
    }

    /// Returns how many observers received the update. Zero is fine.
    pub async fn publish(&self, update: StatusUpdate) -> usize {
        *self.latest.write().await = Some(update.clone());
        self.tx.send(update).unwrap_or(0)
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        StatusHub::new(16)
    }
}

/// Runs until `shutdown` flips to true or its sender is dropped. A failed
/// cycle waits `policy.backoff` instead of `policy.period` and the loop goes on.
pub fn spawn_broadcast_loop(
    source: Arc<dyn StatusSource>,
    hub: StatusHub,
    policy: PollPolicy,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            period_ms = policy.period.as_millis() as u64,
            backoff_ms = policy.backoff.as_millis() as u64,
            "status broadcast loop started"
        );
        loop {
            let stop = *shutdown.borrow();
            if stop {
                break;
            }
            let wait = match poll_once(&source).await {
                Ok(update) => {
                    let observers = hub.publish(update).await;
                    debug!(observers, "status published");
                    policy.period
                }
                Err(e) => {
                    warn!("monitor error: {e}; retrying in {:?}", policy.backoff);
                    policy.backoff
                }
            };
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("status broadcast loop stopped");
    })
}

// Sampling blocks for the CPU window, keep it off the async workers.
async fn poll_once(source: &Arc<dyn StatusSource>) -> Result<StatusUpdate, ControlError> {
    let source = Arc::clone(source);
    Ok(tokio::task::spawn_blocking(move || source.current_status()).await?)
}

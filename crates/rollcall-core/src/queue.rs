//! Bounded hand-off between reaction handlers and the sync driver.
//!
//! Producers await free capacity when the queue is full instead of dropping
//! updates; the driver's next drain makes room. The driver drains in adaptive
//! batches: it keeps receiving while items arrive within the idle window and
//! stops once the window passes with nothing new, or the drain's hard cap is
//! reached.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{Result, RollcallError};

/// "This display name's cell should become this colour."
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpdate {
    pub name: String,
    pub colour: String,
}

impl PendingUpdate {
    pub fn new(name: impl Into<String>, colour: impl Into<String>) -> Self {
        PendingUpdate {
            name: name.into(),
            colour: colour.into(),
        }
    }
}

/// Timing for [`UpdateReceiver::drain_batch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainTiming {
    /// Stop once no item has arrived for this long.
    pub idle: Duration,
    /// Stop after this long regardless of arrivals.
    pub max_wait: Duration,
}

impl Default for DrainTiming {
    fn default() -> Self {
        DrainTiming {
            idle: Duration::from_millis(10),
            max_wait: Duration::from_secs(1),
        }
    }
}

/// Create a queue holding at most `capacity` updates (minimum 1).
pub fn update_queue(capacity: usize) -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (UpdateSender { tx }, UpdateReceiver { rx })
}

#[derive(Clone, Debug)]
pub struct UpdateSender {
    tx: mpsc::Sender<PendingUpdate>,
}

impl UpdateSender {
    /// Enqueue an update, waiting for space if the queue is full.
    pub async fn push(&self, update: PendingUpdate) -> Result<()> {
        self.tx.send(update).await.map_err(|_| RollcallError::QueueClosed)
    }
}

#[derive(Debug)]
pub struct UpdateReceiver {
    rx: mpsc::Receiver<PendingUpdate>,
}

impl UpdateReceiver {
    /// Collect everything available right now, in arrival order.
    ///
    /// Returns an empty batch after one idle window when nothing is queued.
    /// Also returns early if every sender has been dropped.
    pub async fn drain_batch(&mut self, timing: DrainTiming) -> Vec<PendingUpdate> {
        let deadline = Instant::now() + timing.max_wait;
        let mut batch = Vec::new();

        loop {
            let idle_deadline = (Instant::now() + timing.idle).min(deadline);
            match tokio::time::timeout_at(idle_deadline, self.rx.recv()).await {
                Ok(Some(update)) => batch.push(update),
                Ok(None) | Err(_) => break,
            }
            if Instant::now() >= deadline {
                break;
            }
        }

        tracing::debug!(count = batch.len(), "drained update queue");
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

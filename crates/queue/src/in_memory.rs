//! In-memory work queue for tests/dev.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::warn;

use crate::queue::{Deliveries, QueueError, WorkQueue};

/// In-memory point-to-point queue.
///
/// - Unbounded, so `publish` never waits
/// - Each message is delivered once to the single [`Deliveries`] handle
/// - `close` rejects further publishes (simulates a broker outage)
#[derive(Debug)]
pub struct InMemoryWorkQueue<M> {
    sender: Mutex<Option<mpsc::UnboundedSender<M>>>,
}

impl<M> InMemoryWorkQueue<M> {
    /// Create a queue and its consuming half.
    pub fn new() -> (Self, Deliveries<M>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            sender: Mutex::new(Some(tx)),
        };
        (queue, Deliveries::new(rx))
    }

    /// Stop accepting messages. Already-queued messages are still delivered.
    pub fn close(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }
}

impl<M> WorkQueue<M> for InMemoryWorkQueue<M>
where
    M: Send + 'static,
{
    type Error = QueueError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| QueueError::Rejected("queue lock poisoned".to_string()))?;

        match sender.as_ref() {
            Some(tx) => tx.send(message).map_err(|_| {
                warn!("work queue consumer dropped; message lost");
                QueueError::Closed
            }),
            None => Err(QueueError::Closed),
        }
    }
}

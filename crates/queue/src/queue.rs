//! Work queue abstraction (mechanics only).
//!
//! A work queue carries job messages from a producer (the submitter) to a
//! single consuming worker pool. Unlike a pub/sub bus, every message is handed
//! to **one** consumer.
//!
//! ## Delivery Guarantees
//!
//! - **At-least-once**: a message may be delivered more than once (broker
//!   redelivery after a crash); consumers must tolerate duplicates.
//! - **No cross-message ordering**: consumers may process messages
//!   concurrently, so completion order is unrelated to publish order.
//! - **Enqueue acknowledgement only**: `publish` returns once the queue has
//!   accepted the message; it never waits for processing.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The consuming side has gone away; nothing will ever process the message.
    #[error("work queue closed")]
    Closed,

    /// The queue refused the message (broker error, capacity, ...).
    #[error("work queue rejected message: {0}")]
    Rejected(String),
}

/// Consuming half of a work queue.
///
/// Owned by exactly one consumer loop.
#[derive(Debug)]
pub struct Deliveries<M> {
    receiver: mpsc::UnboundedReceiver<M>,
}

impl<M> Deliveries<M> {
    pub fn new(receiver: mpsc::UnboundedReceiver<M>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message. `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Take a message if one is already waiting.
    pub fn try_recv(&mut self) -> Option<M> {
        self.receiver.try_recv().ok()
    }
}

/// Producer side of a work queue.
pub trait WorkQueue<M>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Enqueue a message. Returns once the queue has accepted it.
    fn publish(&self, message: M) -> Result<(), Self::Error>;
}

impl<M, Q> WorkQueue<M> for Arc<Q>
where
    Q: WorkQueue<M> + ?Sized,
{
    type Error = Q::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }
}

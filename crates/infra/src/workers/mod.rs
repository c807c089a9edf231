//! Background workers.

pub mod queue_consumer;

pub use queue_consumer::{ConsumerHandle, ConsumerStats, QueueConsumer};

//! Work queue: asynchronous hand-off from job submission to job processing.

pub mod in_memory;
pub mod queue;

pub use in_memory::InMemoryWorkQueue;
pub use queue::{Deliveries, QueueError, WorkQueue};

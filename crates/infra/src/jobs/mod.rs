//! Asynchronous job system: submit now, process in the background, poll for the result.
//!
//! ## Design
//!
//! - A request is recorded as `queued` and handed to the work queue; the
//!   caller gets a job id immediately
//! - A worker consumes the message, calls the AI backend once, and writes a
//!   terminal `completed`/`failed` record
//! - A poller reads the record on a fixed interval until it is terminal,
//!   then deletes it and reports the outcome exactly once
//!
//! ## Components
//!
//! - `JobRecord`: persisted status/result keyed by `job:<jobId>`
//! - `StatusStore`: key-value persistence for records (in-memory or Redis)
//! - `JobSubmitter`: record + enqueue
//! - `JobWorker`: processes one message, never fails past its boundary
//! - `JobPoller`: cancellable, bounded wait for a terminal record
//! - `JobService`: the client-facing operations on top of the above

pub mod poller;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod service;
pub mod store;
pub mod submitter;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use poller::{JobPoller, JobStatusSource, PollError, PollHandle, PollStatus, PollerConfig};
#[cfg(feature = "redis")]
pub use redis_store::RedisStatusStore;
pub use service::JobService;
pub use store::{InMemoryStatusStore, StatusStore, StoreError, job_key};
pub use submitter::{JobSubmitter, SubmitError};
pub use types::{
    JobErrorKind, JobMessage, JobRecord, JobRequest, JobStatus, MessageError, TransitionError,
    WireMessage,
};
pub use worker::{JobError, JobWorker, SkipReason, WorkOutcome};

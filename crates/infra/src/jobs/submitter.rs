//! Job submission: record as queued, then enqueue.

use tracing::{info, instrument, warn};

use gobot_core::{DomainError, JobId};
use gobot_queue::WorkQueue;

use super::store::{StatusStore, StoreError};
use super::types::{JobMessage, JobRecord, JobRequest};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("failed to record job: {0}")]
    Store(#[from] StoreError),

    #[error("failed to enqueue job: {0}")]
    Enqueue(String),
}

/// Records a job as `queued` and hands it to the work queue.
///
/// The record is written first so a poll that races the worker never sees
/// `not_found` for a job that exists. If the enqueue then fails, the record
/// is deleted again so nothing is left waiting for a worker that will never
/// come.
#[derive(Debug, Clone)]
pub struct JobSubmitter<S, Q> {
    store: S,
    queue: Q,
}

impl<S, Q> JobSubmitter<S, Q>
where
    S: StatusStore,
    Q: WorkQueue<JobMessage>,
{
    pub fn new(store: S, queue: Q) -> Self {
        Self { store, queue }
    }

    #[instrument(skip(self, request), fields(job_type = request.job_type()))]
    pub async fn submit(&self, request: JobRequest) -> Result<JobId, SubmitError> {
        let job_id = JobId::new();
        let job_type = request.job_type();

        self.store.put(&JobRecord::queued(job_id)).await?;

        if let Err(e) = self.queue.publish(JobMessage::new(job_id, request)) {
            warn!(%job_id, job_type, error = %e, "enqueue failed; removing queued record");
            if let Err(cleanup) = self.store.delete(job_id).await {
                warn!(%job_id, error = %cleanup, "failed to remove orphaned job record");
            }
            return Err(SubmitError::Enqueue(e.to_string()));
        }

        info!(%job_id, job_type, "job submitted");
        Ok(job_id)
    }
}

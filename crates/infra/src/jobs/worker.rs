//! Job worker: turns one queued message into a terminal record.

use serde_json::Value as JsonValue;
use tracing::{debug, error, info, instrument, warn};

use gobot_ai::{AiBackend, AiError};
use gobot_core::JobId;

use super::store::{StatusStore, StoreError};
use super::types::{
    JobErrorKind, JobMessage, JobRecord, JobRequest, JobStatus, MessageError, TransitionError,
    WireMessage,
};

/// Why a delivery was acknowledged without doing any work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No record: the job was cleared (or never recorded) before it ran.
    Missing,
    /// Redelivery of a job another delivery already started or finished.
    AlreadyStarted(JobStatus),
    /// The message could not be read far enough to find its job id.
    MalformedMessage(String),
}

/// Infrastructure failure while moving a record through its lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Result of handling one delivery. Never an error: every failure the job
/// itself can have is recorded in the status store instead.
#[derive(Debug)]
pub enum WorkOutcome {
    Completed,
    /// Recorded as failed with this message.
    Failed(String),
    Skipped(SkipReason),
    /// The status store could not be updated; the record may be stale.
    Aborted(JobError),
}

impl WorkOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, WorkOutcome::Completed)
    }
}

/// Processes job messages against the AI backend.
///
/// - One backend call per job, no retries
/// - `queued -> processing -> completed|failed`, each step persisted
/// - Duplicate deliveries are detected from the stored status and skipped
#[derive(Debug, Clone)]
pub struct JobWorker<S, B> {
    store: S,
    backend: B,
}

impl<S, B> JobWorker<S, B>
where
    S: StatusStore,
    B: AiBackend,
{
    pub fn new(store: S, backend: B) -> Self {
        Self { store, backend }
    }

    /// Handle a decoded message.
    #[instrument(skip(self, message), fields(job_id = %message.job_id, job_type = message.request.job_type()))]
    pub async fn handle(&self, message: JobMessage) -> WorkOutcome {
        let record = match self.claim(message.job_id).await {
            Ok(record) => record,
            Err(outcome) => return outcome,
        };

        let outcome = match self.execute(&message.request).await {
            Ok(result) => self.complete(record, result).await,
            Err(e) => {
                let kind = JobErrorKind::from(&e);
                self.fail(record, e.to_string(), kind).await
            }
        };
        log_outcome(message.job_id, &outcome);
        outcome
    }

    /// Handle a message straight off the wire.
    ///
    /// Messages whose `type` is not a known job type still end in a `failed`
    /// record so the poller can report them.
    pub async fn handle_value(&self, raw: JsonValue) -> WorkOutcome {
        let wire: WireMessage = match serde_json::from_value(raw) {
            Ok(wire) => wire,
            Err(e) => {
                warn!(error = %e, "dropping unreadable job message");
                return WorkOutcome::Skipped(SkipReason::MalformedMessage(e.to_string()));
            }
        };

        let job_id = wire.job_id;
        match JobRequest::from_wire(&wire.job_type, wire.data) {
            Ok(request) => self.handle(JobMessage::new(job_id, request)).await,
            Err(e) => {
                let kind = match &e {
                    MessageError::UnknownJobType(_) => JobErrorKind::UnknownJobType,
                    MessageError::InvalidPayload { .. } => JobErrorKind::Internal,
                };
                let outcome = match self.claim(job_id).await {
                    Ok(record) => self.fail(record, e.to_string(), kind).await,
                    Err(outcome) => outcome,
                };
                log_outcome(job_id, &outcome);
                outcome
            }
        }
    }

    async fn execute(&self, request: &JobRequest) -> Result<JsonValue, AiError> {
        match request {
            JobRequest::ClarifyIssue(req) => self.backend.clarify(req).await,
            JobRequest::GenCode(req) => self.backend.generate_code(req).await,
        }
    }

    /// Move the stored record to `processing`, or explain why not.
    async fn claim(&self, job_id: JobId) -> Result<JobRecord, WorkOutcome> {
        let mut record = match self.store.get(job_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(WorkOutcome::Skipped(SkipReason::Missing)),
            Err(e) => return Err(WorkOutcome::Aborted(e.into())),
        };

        if record.status != JobStatus::Queued {
            return Err(WorkOutcome::Skipped(SkipReason::AlreadyStarted(record.status)));
        }

        record
            .mark_processing()
            .map_err(|e| WorkOutcome::Aborted(e.into()))?;
        self.store
            .put(&record)
            .await
            .map_err(|e| WorkOutcome::Aborted(e.into()))?;
        debug!("job processing");
        Ok(record)
    }

    async fn complete(&self, mut record: JobRecord, result: JsonValue) -> WorkOutcome {
        if let Err(e) = record.mark_completed(result) {
            return WorkOutcome::Aborted(e.into());
        }
        match self.store.put(&record).await {
            Ok(()) => WorkOutcome::Completed,
            Err(e) => WorkOutcome::Aborted(e.into()),
        }
    }

    async fn fail(&self, mut record: JobRecord, message: String, kind: JobErrorKind) -> WorkOutcome {
        if let Err(e) = record.mark_failed(message.clone(), kind) {
            return WorkOutcome::Aborted(e.into());
        }
        match self.store.put(&record).await {
            Ok(()) => WorkOutcome::Failed(message),
            Err(e) => WorkOutcome::Aborted(e.into()),
        }
    }
}

fn log_outcome(job_id: JobId, outcome: &WorkOutcome) {
    match outcome {
        WorkOutcome::Completed => info!(%job_id, "job completed"),
        WorkOutcome::Failed(message) => warn!(%job_id, error = %message, "job failed"),
        WorkOutcome::Skipped(reason) => debug!(%job_id, ?reason, "job skipped"),
        WorkOutcome::Aborted(e) => error!(%job_id, error = %e, "job record could not be updated"),
    }
}

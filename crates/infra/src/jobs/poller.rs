//! Status poller: wait for a job to reach a terminal state.
//!
//! One poll loop per job. A loop ends exactly once, with either the job's
//! result or a [`PollError`], and deletes the record when it observed a
//! terminal state. Loops are bounded (`max_attempts`) and cancellable.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gobot_core::JobId;

use super::types::{JobErrorKind, JobRecord, JobStatus};

/// Where a poller reads job records from: the service in-process, or the
/// HTTP API from a remote client.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    type Error: Display + Send + Sync + 'static;

    /// Current record; absence is reported as a `not_found` record.
    async fn job_status(&self, job_id: JobId) -> Result<JobRecord, Self::Error>;

    /// Delete the record. Idempotent.
    async fn clear_job(&self, job_id: JobId) -> Result<(), Self::Error>;
}

#[async_trait]
impl<S> JobStatusSource for Arc<S>
where
    S: JobStatusSource + ?Sized,
{
    type Error = S::Error;

    async fn job_status(&self, job_id: JobId) -> Result<JobRecord, Self::Error> {
        (**self).job_status(job_id).await
    }

    async fn clear_job(&self, job_id: JobId) -> Result<(), Self::Error> {
        (**self).clear_job(job_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between two status reads.
    pub interval: Duration,
    /// Give up after this many reads; `None` polls until terminal.
    pub max_attempts: Option<u32>,
    /// Consecutive `not_found` reads tolerated before failing.
    pub not_found_grace: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_attempts: Some(200),
            not_found_grace: 3,
        }
    }
}

/// Message used when a failed record carries no error text.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Job failed";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// The job reached `failed`.
    #[error("{message}")]
    Failed {
        message: String,
        kind: Option<JobErrorKind>,
    },

    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job did not finish after {attempts} status checks")]
    TimedOut { attempts: u32 },

    #[error("polling cancelled")]
    Cancelled,

    /// The status source could not be read.
    #[error("failed to check job status: {0}")]
    Transport(String),
}

impl PollError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            PollError::Failed {
                kind: Some(JobErrorKind::QuotaExceeded),
                ..
            }
        )
    }
}

/// Final outcome of one poll loop.
pub type PollStatus = Result<JsonValue, PollError>;

/// Handle to a spawned poll loop.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    join: JoinHandle<PollStatus>,
}

impl PollHandle {
    /// Stop polling. No callback starts once this has returned; one that
    /// is already running is not interrupted.
    /// The job itself keeps running; only the watch is abandoned.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to end and return its outcome.
    pub async fn join(self) -> PollStatus {
        match self.join.await {
            Ok(status) => status,
            Err(e) if e.is_cancelled() => Err(PollError::Cancelled),
            Err(e) => Err(PollError::Transport(format!("poll task failed: {e}"))),
        }
    }
}

/// Polls a [`JobStatusSource`] until a job is terminal.
#[derive(Debug, Clone)]
pub struct JobPoller<S> {
    source: S,
    config: PollerConfig,
}

impl<S> JobPoller<S>
where
    S: JobStatusSource,
{
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll in the current task.
    pub async fn wait(&self, job_id: JobId) -> PollStatus {
        self.run(job_id, &CancellationToken::new()).await
    }

    /// Poll in the current task until done or until `cancel` fires.
    pub async fn wait_with_cancel(&self, job_id: JobId, cancel: &CancellationToken) -> PollStatus {
        self.run(job_id, cancel).await
    }

    async fn run(&self, job_id: JobId, cancel: &CancellationToken) -> PollStatus {
        let mut attempts: u32 = 0;
        let mut missing: u32 = 0;

        loop {
            attempts += 1;
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                read = self.source.job_status(job_id) => read,
            };
            let record = read.map_err(|e| PollError::Transport(e.to_string()))?;
            debug!(%job_id, status = %record.status, attempts, "polled job status");

            // A terminal read racing a cancel: leave the record for whoever
            // watches next.
            if record.status.is_terminal() && cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }

            match record.status {
                JobStatus::Completed => {
                    self.clear(job_id).await;
                    return Ok(record.result.unwrap_or(JsonValue::Null));
                }
                JobStatus::Failed => {
                    self.clear(job_id).await;
                    return Err(PollError::Failed {
                        message: record
                            .error
                            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                        kind: record.error_kind,
                    });
                }
                JobStatus::NotFound => {
                    missing += 1;
                    if missing > self.config.not_found_grace {
                        return Err(PollError::NotFound(job_id));
                    }
                }
                JobStatus::Queued | JobStatus::Processing => missing = 0,
            }

            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                warn!(%job_id, attempts, "giving up on job");
                return Err(PollError::TimedOut { attempts });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    /// Best effort: a record left behind expires or is cleared by the next poll.
    async fn clear(&self, job_id: JobId) {
        if let Err(e) = self.source.clear_job(job_id).await {
            warn!(%job_id, error = %e, "failed to clear finished job");
        }
    }
}

impl<S> JobPoller<S>
where
    S: JobStatusSource + Clone + 'static,
{
    /// Poll on a background task and report through exactly one callback.
    ///
    /// `on_complete` receives the result, `on_error` every other ending
    /// except cancellation, which fires neither.
    pub fn spawn<C, E>(&self, job_id: JobId, on_complete: C, on_error: E) -> PollHandle
    where
        C: FnOnce(JsonValue) + Send + 'static,
        E: FnOnce(PollError) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let poller = self.clone();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut status = poller.run(job_id, &token).await;
            if token.is_cancelled() {
                status = Err(PollError::Cancelled);
            }
            match &status {
                Ok(result) => on_complete(result.clone()),
                Err(PollError::Cancelled) => {}
                Err(e) => on_error(e.clone()),
            }
            status
        });

        PollHandle { cancel, join }
    }
}

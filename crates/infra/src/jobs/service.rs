//! Client-facing job operations.

use async_trait::async_trait;

use gobot_ai::{ClarifyRequest, CodeGenRequest};
use gobot_core::{InstallId, IssueData, JobId};
use gobot_queue::WorkQueue;

use super::poller::JobStatusSource;
use super::store::{StatusStore, StoreError};
use super::submitter::{JobSubmitter, SubmitError};
use super::types::{JobMessage, JobRecord, JobRequest};

/// Start jobs, read their status, clear them.
///
/// This is the whole surface the panel talks to; everything else happens in
/// the worker.
#[derive(Debug, Clone)]
pub struct JobService<S, Q> {
    store: S,
    submitter: JobSubmitter<S, Q>,
}

impl<S, Q> JobService<S, Q>
where
    S: StatusStore + Clone,
    Q: WorkQueue<JobMessage>,
{
    pub fn new(store: S, queue: Q) -> Self {
        Self {
            submitter: JobSubmitter::new(store.clone(), queue),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queue a ticket clarification. The ticket must have a title.
    pub async fn start_clarify_issue(
        &self,
        issue: &IssueData,
        install: &InstallId,
        custom_prompt: Option<&str>,
        access_key: Option<&str>,
    ) -> Result<JobId, SubmitError> {
        issue.validate_for_clarification()?;
        let request = ClarifyRequest::new(issue, install, custom_prompt, access_key);
        self.submitter.submit(JobRequest::ClarifyIssue(request)).await
    }

    /// Queue code generation for a (usually already clarified) ticket.
    pub async fn start_gen_code(
        &self,
        issue: &IssueData,
        install: &InstallId,
        custom_prompt: Option<&str>,
        access_key: Option<&str>,
    ) -> Result<JobId, SubmitError> {
        let request = CodeGenRequest::new(issue, install, custom_prompt, access_key);
        self.submitter.submit(JobRequest::GenCode(request)).await
    }

    /// Current record; `not_found` when there is none.
    pub async fn job_status(&self, job_id: JobId) -> Result<JobRecord, StoreError> {
        self.store.status(job_id).await
    }

    /// Delete the record. Clearing an unknown job succeeds.
    pub async fn clear_job(&self, job_id: JobId) -> Result<(), StoreError> {
        self.store.delete(job_id).await.map(|_| ())
    }
}

#[async_trait]
impl<S, Q> JobStatusSource for JobService<S, Q>
where
    S: StatusStore + Clone,
    Q: WorkQueue<JobMessage>,
{
    type Error = StoreError;

    async fn job_status(&self, job_id: JobId) -> Result<JobRecord, StoreError> {
        JobService::job_status(self, job_id).await
    }

    async fn clear_job(&self, job_id: JobId) -> Result<(), StoreError> {
        JobService::clear_job(self, job_id).await
    }
}

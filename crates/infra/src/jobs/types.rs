//! Core job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use gobot_ai::{AiError, ClarifyRequest, CodeGenRequest};
use gobot_core::JobId;

/// Job status as observed through the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Recorded by the submitter, waiting for a worker
    Queued,
    /// A worker has picked it up and is calling the backend
    Processing,
    /// Finished; `result` holds the backend payload
    Completed,
    /// Finished; `error` holds a user-facing message
    Failed,
    /// No record under this id (never created, or already cleared)
    NotFound,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job failed, kept next to the message so the panel can react
/// differently (e.g. upgrade prompt on quota exhaustion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    QuotaExceeded,
    Remote,
    Network,
    Decode,
    UnknownJobType,
    Internal,
}

impl From<&AiError> for JobErrorKind {
    fn from(err: &AiError) -> Self {
        match err {
            AiError::QuotaExceeded(_) => JobErrorKind::QuotaExceeded,
            AiError::Remote { .. } => JobErrorKind::Remote,
            AiError::Network(_) => JobErrorKind::Network,
            AiError::Decode(_) => JobErrorKind::Decode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Persisted job status/result, stored under `job:<jobId>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<JobErrorKind>,
}

impl JobRecord {
    /// A freshly submitted job.
    pub fn queued(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
            created_at: Some(Utc::now()),
            started_at: None,
            completed_at: None,
            failed_at: None,
            result: None,
            error: None,
            error_kind: None,
        }
    }

    /// The absence signal returned for ids with no stored record.
    pub fn not_found(job_id: JobId) -> Self {
        Self {
            status: JobStatus::NotFound,
            created_at: None,
            ..Self::queued(job_id)
        }
    }

    fn transition(&mut self, allowed_from: &[JobStatus], to: JobStatus) -> Result<(), TransitionError> {
        if !allowed_from.contains(&self.status) {
            return Err(TransitionError { from: self.status, to });
        }
        self.status = to;
        Ok(())
    }

    pub fn mark_processing(&mut self) -> Result<(), TransitionError> {
        self.transition(&[JobStatus::Queued], JobStatus::Processing)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_completed(&mut self, result: JsonValue) -> Result<(), TransitionError> {
        self.transition(&[JobStatus::Processing], JobStatus::Completed)?;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// A job may fail before it starts (undecodable message) or while running.
    pub fn mark_failed(&mut self, error: impl Into<String>, kind: JobErrorKind) -> Result<(), TransitionError> {
        self.transition(&[JobStatus::Queued, JobStatus::Processing], JobStatus::Failed)?;
        self.error = Some(error.into());
        self.error_kind = Some(kind);
        self.failed_at = Some(Utc::now());
        Ok(())
    }
}

/// The work a job performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    ClarifyIssue(ClarifyRequest),
    GenCode(CodeGenRequest),
}

impl JobRequest {
    pub const CLARIFY_ISSUE: &'static str = "clarifyIssue";
    pub const GEN_CODE: &'static str = "genCode";

    /// Wire discriminator (`type` field of the queue message).
    pub fn job_type(&self) -> &'static str {
        match self {
            JobRequest::ClarifyIssue(_) => Self::CLARIFY_ISSUE,
            JobRequest::GenCode(_) => Self::GEN_CODE,
        }
    }

    pub fn from_wire(job_type: &str, data: JsonValue) -> Result<Self, MessageError> {
        let invalid = |e: serde_json::Error| MessageError::InvalidPayload {
            job_type: job_type.to_string(),
            reason: e.to_string(),
        };
        match job_type {
            Self::CLARIFY_ISSUE => serde_json::from_value(data).map(JobRequest::ClarifyIssue).map_err(invalid),
            Self::GEN_CODE => serde_json::from_value(data).map(JobRequest::GenCode).map_err(invalid),
            other => Err(MessageError::UnknownJobType(other.to_string())),
        }
    }

    pub fn to_data(&self) -> JsonValue {
        let data = match self {
            JobRequest::ClarifyIssue(req) => serde_json::to_value(req),
            JobRequest::GenCode(req) => serde_json::to_value(req),
        };
        // Plain string structs always serialise.
        data.unwrap_or(JsonValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    #[error("invalid {job_type} payload: {reason}")]
    InvalidPayload { job_type: String, reason: String },
}

/// Queue message: `{ jobId, type, data }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireMessage", try_from = "WireMessage")]
pub struct JobMessage {
    pub job_id: JobId,
    pub request: JobRequest,
}

impl JobMessage {
    pub fn new(job_id: JobId, request: JobRequest) -> Self {
        Self { job_id, request }
    }
}

/// Untyped form of [`JobMessage`], as it travels through a broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub job_id: JobId,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub data: JsonValue,
}

impl From<JobMessage> for WireMessage {
    fn from(message: JobMessage) -> Self {
        Self {
            job_id: message.job_id,
            job_type: message.request.job_type().to_string(),
            data: message.request.to_data(),
        }
    }
}

impl TryFrom<WireMessage> for JobMessage {
    type Error = MessageError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let request = JobRequest::from_wire(&wire.job_type, wire.data)?;
        Ok(Self::new(wire.job_id, request))
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use gobot_core::{ClarifiedOutput, CodeGenOutput, InstallId, IssueData, JobId, adf};
use gobot_infra::jobs::PollerConfig;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /jobs/clarify-issue` and `POST /jobs/gen-code`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    pub issue_data: IssueData,
    #[serde(default)]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub install: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
}

impl StartJobRequest {
    pub fn install(&self) -> InstallId {
        InstallId::or_unknown(self.install.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateKeyRequest {
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub install: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstallRequest {
    #[serde(default)]
    pub install: Option<String>,
}

/// Body of `POST /tickets/description`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub clarified_output: ClarifiedOutput,
    /// Plain text, or the issue's ADF description as Jira returns it.
    #[serde(default)]
    pub original_description: Option<JsonValue>,
}

impl DescriptionRequest {
    pub fn original_text(&self) -> Option<String> {
        match self.original_description.as_ref()? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Null => None,
            doc => Some(adf::extract_text(doc)),
        }
    }
}

/// Body of `POST /tickets/adf`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdfRequest {
    pub clarified_output: ClarifiedOutput,
}

/// Body of `POST /tickets/implementation`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationRequest {
    pub code_gen_output: CodeGenOutput,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: JobId,
}

/// Poll cadence the panel should use, from the server's configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSettings {
    pub interval_ms: u64,
    /// `null` means poll until a terminal state.
    pub max_attempts: Option<u32>,
    pub not_found_grace: u32,
}

impl From<PollerConfig> for PollSettings {
    fn from(config: PollerConfig) -> Self {
        Self {
            interval_ms: u64::try_from(config.interval.as_millis()).unwrap_or(u64::MAX),
            max_attempts: config.max_attempts,
            not_found_grace: config.not_found_grace,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackFailure {
    pub status: &'static str,
    pub message: &'static str,
}

impl FeedbackFailure {
    pub const fn new() -> Self {
        Self {
            status: "error",
            message: "Failed to submit feedback",
        }
    }
}

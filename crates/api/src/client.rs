//! Typed HTTP client for the job API.
//!
//! Mirrors what the Jira panel does: start a job, then poll it with a
//! [`JobPoller`] until it finishes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};

use gobot_core::{InstallId, IssueData, JobId};
use gobot_infra::jobs::{JobPoller, JobRecord, JobStatusSource, PollerConfig};
use gobot_infra::workers::ConsumerStats;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("{message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollSettings {
    interval_ms: u64,
    max_attempts: Option<u32>,
    not_found_grace: u32,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// A poller reading this API.
    pub fn poller(&self, config: PollerConfig) -> JobPoller<ApiClient> {
        JobPoller::new(self.clone(), config)
    }

    /// The server's poll cadence, from `GET /jobs/config`.
    pub async fn poll_settings(&self) -> Result<PollerConfig, ClientError> {
        let response = self
            .http
            .get(format!("{}/jobs/config", self.base_url))
            .send()
            .await?;
        let settings: PollSettings = read_json(response).await?;
        Ok(PollerConfig {
            interval: Duration::from_millis(settings.interval_ms),
            max_attempts: settings.max_attempts,
            not_found_grace: settings.not_found_grace,
        })
    }

    /// A poller using the server's own cadence.
    pub async fn server_poller(&self) -> Result<JobPoller<ApiClient>, ClientError> {
        Ok(self.poller(self.poll_settings().await?))
    }

    pub async fn consumer_stats(&self) -> Result<ConsumerStats, ClientError> {
        let response = self
            .http
            .get(format!("{}/jobs/stats", self.base_url))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn start_clarify_issue(
        &self,
        issue: &IssueData,
        install: &InstallId,
        custom_prompt: Option<&str>,
        access_key: Option<&str>,
    ) -> Result<JobId, ClientError> {
        self.start("/jobs/clarify-issue", issue, install, custom_prompt, access_key)
            .await
    }

    pub async fn start_gen_code(
        &self,
        issue: &IssueData,
        install: &InstallId,
        custom_prompt: Option<&str>,
        access_key: Option<&str>,
    ) -> Result<JobId, ClientError> {
        self.start("/jobs/gen-code", issue, install, custom_prompt, access_key)
            .await
    }

    pub async fn job_status(&self, job_id: JobId) -> Result<JobRecord, ClientError> {
        let response = self
            .http
            .get(format!("{}/jobs/{job_id}", self.base_url))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn clear_job(&self, job_id: JobId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/jobs/{job_id}", self.base_url))
            .send()
            .await?;
        read_json::<JsonValue>(response).await.map(|_| ())
    }

    async fn start(
        &self,
        path: &str,
        issue: &IssueData,
        install: &InstallId,
        custom_prompt: Option<&str>,
        access_key: Option<&str>,
    ) -> Result<JobId, ClientError> {
        let body = json!({
            "issueData": issue,
            "install": install.as_str(),
            "customPrompt": custom_prompt,
            "accessKey": access_key,
        });
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await?;

        let accepted: JsonValue = read_json(response).await?;
        accepted["jobId"]
            .as_str()
            .ok_or_else(|| ClientError::Decode("missing jobId".to_string()))?
            .parse()
            .map_err(|e: gobot_core::DomainError| ClientError::Decode(e.to_string()))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| ClientError::Decode(e.to_string()));
    }

    let body = response.json::<JsonValue>().await.unwrap_or(JsonValue::Null);
    let code = body["error"].as_str().map(str::to_string);
    let message = body["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
    Err(ClientError::Status {
        status: status.as_u16(),
        code,
        message,
    })
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }
}

#[async_trait]
impl JobStatusSource for ApiClient {
    type Error = ClientError;

    async fn job_status(&self, job_id: JobId) -> Result<JobRecord, ClientError> {
        ApiClient::job_status(self, job_id).await
    }

    async fn clear_job(&self, job_id: JobId) -> Result<(), ClientError> {
        ApiClient::clear_job(self, job_id).await
    }
}

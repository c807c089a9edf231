//! Request bodies for the AI endpoints.
//!
//! Every field is a plain string (never null): these structs are also the
//! `data` part of queued job messages.

use serde::{Deserialize, Serialize};

use gobot_core::{InstallId, IssueData};

/// Body of `POST /clarify`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarifyRequest {
    pub title: String,
    pub description: String,
    pub issue_type: String,
    pub priority: String,
    #[serde(default)]
    pub custom_prompt: String,
    pub install: String,
    #[serde(default)]
    pub access_key: String,
}

impl ClarifyRequest {
    pub fn new(
        issue: &IssueData,
        install: &InstallId,
        custom_prompt: Option<&str>,
        access_key: Option<&str>,
    ) -> Self {
        Self {
            title: issue.title.clone(),
            description: issue.description.clone(),
            issue_type: issue.issue_type_or_default().to_string(),
            priority: issue.priority_or_default().to_string(),
            custom_prompt: custom_prompt.unwrap_or_default().to_string(),
            install: install.as_str().to_string(),
            access_key: access_key.map(str::trim).unwrap_or_default().to_string(),
        }
    }
}

/// Body of `POST /gen-code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGenRequest {
    pub jira_description: String,
    #[serde(default)]
    pub custom_prompt: String,
    pub install: String,
    #[serde(default)]
    pub access_key: String,
}

impl CodeGenRequest {
    /// The description is expected to already carry the clarification the
    /// user applied in step one.
    pub fn new(
        issue: &IssueData,
        install: &InstallId,
        custom_prompt: Option<&str>,
        access_key: Option<&str>,
    ) -> Self {
        Self {
            jira_description: issue.jira_description(),
            custom_prompt: custom_prompt.unwrap_or_default().to_string(),
            install: install.as_str().to_string(),
            access_key: access_key.map(str::trim).unwrap_or_default().to_string(),
        }
    }
}

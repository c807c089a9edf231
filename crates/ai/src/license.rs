//! License / usage service shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Response of `POST /validate-key`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gobots_remaining: Option<i64>,
}

impl KeyValidation {
    pub const UNAVAILABLE_MESSAGE: &'static str = "Failed to validate access key. Please try again.";

    /// What the panel sees when the license service could not be reached.
    pub fn unavailable() -> Self {
        Self {
            valid: false,
            message: Some(Self::UNAVAILABLE_MESSAGE.to_string()),
            ..Default::default()
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Response of `POST /find-key-by-install`.
///
/// When no key is active only `isActive: false` and `message` are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gobot_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gobot_used: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_resets_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of `GET /usage/<key>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUsage {
    pub key_code: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    // The backend spells this one "gotbotsUsed".
    #[serde(default, alias = "gotbotsUsed")]
    pub gobots_used: i64,
    #[serde(default)]
    pub gobot_limit: i64,
    #[serde(default)]
    pub gobots_remaining: i64,
    #[serde(default)]
    pub usage_resets_at: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub activated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Upvote,
    Downvote,
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default)]
    pub ticket_data: JsonValue,
    #[serde(default)]
    pub clarified_output: JsonValue,
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub comment: Option<String>,
}

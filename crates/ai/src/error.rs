use thiserror::Error;

/// Default message when the backend answers 429 without a body we can use.
pub const QUOTA_EXCEEDED_MESSAGE: &str = "Monthly usage limit reached. Please upgrade your plan.";

/// Failure talking to the AI / license backend.
///
/// `Display` is the user-facing message: it ends up verbatim in failed job
/// records and panel error banners.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AiError {
    /// HTTP 429: the license has used up its monthly quota.
    #[error("{0}")]
    QuotaExceeded(String),

    /// Any other non-2xx response.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("request to AI backend failed: {0}")]
    Network(String),

    /// A 2xx response whose body was not the JSON we expected.
    #[error("invalid response from AI backend: {0}")]
    Decode(String),
}

impl AiError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, AiError::QuotaExceeded(_))
    }

    /// HTTP status returned by the backend, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::QuotaExceeded(_) => Some(429),
            AiError::Remote { status, .. } => Some(*status),
            AiError::Network(_) | AiError::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AiError::Decode(err.to_string())
        } else if err.is_timeout() {
            AiError::Network(format!("timed out: {err}"))
        } else {
            AiError::Network(err.to_string())
        }
    }
}

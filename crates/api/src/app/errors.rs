use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gobot_ai::AiError;
use gobot_infra::jobs::{StoreError, SubmitError};

pub fn submit_error_to_response(err: SubmitError) -> axum::response::Response {
    match err {
        SubmitError::Invalid(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        SubmitError::Store(e) => json_error(StatusCode::SERVICE_UNAVAILABLE, "submission_failed", e.to_string()),
        SubmitError::Enqueue(msg) => json_error(StatusCode::SERVICE_UNAVAILABLE, "submission_failed", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
}

/// Backend failures on the proxied license/health endpoints.
pub fn backend_error_to_response(err: AiError) -> axum::response::Response {
    match err {
        AiError::QuotaExceeded(msg) => json_error(StatusCode::TOO_MANY_REQUESTS, "quota_exceeded", msg),
        AiError::Remote { status, message } if status == 404 => {
            json_error(StatusCode::NOT_FOUND, "not_found", message)
        }
        other => json_error(StatusCode::BAD_GATEWAY, "backend_error", other.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what}"))
}

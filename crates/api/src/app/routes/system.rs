use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use gobot_ai::LicenseBackend;

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Liveness of the AI backend, as reported by the backend itself.
pub async fn backend_health(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.license.health().await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

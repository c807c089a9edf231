use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::warn;

use gobot_ai::{Feedback, KeyValidation, LicenseBackend};
use gobot_core::{InstallId, LicenseKey};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/validate", post(validate_key))
        .route("/by-install", post(find_key_by_install))
        .route("/usage/:key", get(usage))
}

/// Never an error status: the panel only needs `valid` and a message.
pub async fn validate_key(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ValidateKeyRequest>,
) -> axum::response::Response {
    let key = match LicenseKey::parse(&body.access_key) {
        Ok(key) => key,
        Err(e) => return (StatusCode::OK, Json(KeyValidation::invalid(e.to_string()))).into_response(),
    };
    let install = InstallId::or_unknown(body.install.as_deref());

    let validation = match services.license.validate_key(&key, &install).await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "access key validation failed");
            KeyValidation::unavailable()
        }
    };
    (StatusCode::OK, Json(validation)).into_response()
}

pub async fn find_key_by_install(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::InstallRequest>,
) -> axum::response::Response {
    let install = match body.install.as_deref().map(str::trim) {
        Some(install) if !install.is_empty() => InstallId::new(install),
        _ => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "install is required"),
    };

    match services.license.find_key_by_install(&install).await {
        Ok(key) => (StatusCode::OK, Json(key)).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn usage(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let key = match LicenseKey::parse(&key) {
        Ok(key) => key,
        Err(_) => return errors::invalid_id("license key"),
    };

    match services.license.usage(&key).await {
        Ok(usage) => (StatusCode::OK, Json(usage)).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

/// Feedback is fire-and-forget for the panel; failures come back as a body,
/// not an error status.
pub async fn submit_feedback(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Feedback>,
) -> axum::response::Response {
    match services.license.submit_feedback(&body).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => {
            warn!(error = %e, feedback_type = ?body.feedback_type, "feedback submission failed");
            (StatusCode::OK, Json(dto::FeedbackFailure::new())).into_response()
        }
    }
}

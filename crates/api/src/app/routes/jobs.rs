use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use gobot_core::JobId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/clarify-issue", post(start_clarify_issue))
        .route("/gen-code", post(start_gen_code))
        .route("/config", get(poll_settings))
        .route("/stats", get(consumer_stats))
        .route("/:job_id", get(job_status).delete(clear_job))
}

pub async fn start_clarify_issue(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StartJobRequest>,
) -> axum::response::Response {
    let started = services
        .jobs
        .start_clarify_issue(
            &body.issue_data,
            &body.install(),
            body.custom_prompt.as_deref(),
            body.access_key.as_deref(),
        )
        .await;

    match started {
        Ok(job_id) => (StatusCode::ACCEPTED, Json(dto::JobAccepted { job_id })).into_response(),
        Err(e) => errors::submit_error_to_response(e),
    }
}

pub async fn start_gen_code(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StartJobRequest>,
) -> axum::response::Response {
    let started = services
        .jobs
        .start_gen_code(
            &body.issue_data,
            &body.install(),
            body.custom_prompt.as_deref(),
            body.access_key.as_deref(),
        )
        .await;

    match started {
        Ok(job_id) => (StatusCode::ACCEPTED, Json(dto::JobAccepted { job_id })).into_response(),
        Err(e) => errors::submit_error_to_response(e),
    }
}

pub async fn poll_settings(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(dto::PollSettings::from(services.poller))
}

/// Worker pool counters; 503 once the consumer has been shut down.
pub async fn consumer_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.consumer_stats() {
        Some(stats) => (StatusCode::OK, Json(stats)).into_response(),
        None => errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "consumer_stopped",
            "job consumer is not running",
        ),
    }
}

/// Always 200 for a well-formed id: a missing record is `status: not_found`.
pub async fn job_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    let job_id: JobId = match job_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("job id"),
    };

    match services.jobs.job_status(job_id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn clear_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    let job_id: JobId = match job_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("job id"),
    };

    match services.jobs.clear_job(job_id).await {
        Ok(()) => (StatusCode::OK, Json(dto::Cleared { success: true })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

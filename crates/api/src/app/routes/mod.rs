use axum::{Router, routing::get};

pub mod jobs;
pub mod license;
pub mod system;
pub mod tickets;

/// Router for every endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/license", license::router())
        .nest("/tickets", tickets::router())
        .route("/backend/health", get(system::backend_health))
        .route("/feedback", axum::routing::post(license::submit_feedback))
}

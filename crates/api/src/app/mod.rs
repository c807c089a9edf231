//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: status store, work queue, worker pool, backend client
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use gobot_infra::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, BuildError};

/// Build services and the full HTTP router.
pub async fn build_app(config: &AppConfig) -> Result<(Router, Arc<AppServices>), BuildError> {
    let services = Arc::new(services::build_services(config).await?);
    Ok((router(services.clone()), services))
}

/// HTTP router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

//! Ticket formatting helpers the panel uses when applying AI output to Jira.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use chrono::Utc;

use gobot_core::adf::Document;
use gobot_core::attachment::{implementation_filename, render_implementation_markdown};
use gobot_core::description::format_clarified_description;

use crate::app::dto;

pub fn router() -> Router {
    Router::new()
        .route("/description", post(description))
        .route("/adf", post(adf_document))
        .route("/implementation", post(implementation))
}

pub async fn description(Json(body): Json<dto::DescriptionRequest>) -> axum::response::Response {
    let original = body.original_text();
    let description = format_clarified_description(&body.clarified_output, original.as_deref());
    (StatusCode::OK, Json(dto::DescriptionResponse { description })).into_response()
}

pub async fn adf_document(Json(body): Json<dto::AdfRequest>) -> axum::response::Response {
    (StatusCode::OK, Json(Document::from_clarified(&body.clarified_output))).into_response()
}

/// Markdown attachment for a code generation result.
pub async fn implementation(Json(body): Json<dto::ImplementationRequest>) -> axum::response::Response {
    let now = Utc::now();
    let attachment = dto::Attachment {
        file_name: implementation_filename(now),
        content: render_implementation_markdown(&body.code_gen_output, now),
    };
    (StatusCode::OK, Json(attachment)).into_response()
}

//! HTTP client for the AI + license backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{IntoUrl, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, instrument, warn};

use gobot_core::{InstallId, LicenseKey};

use crate::backend::{AiBackend, LicenseBackend};
use crate::error::{AiError, QUOTA_EXCEEDED_MESSAGE};
use crate::license::{Feedback, InstallKey, KeyUsage, KeyValidation};
use crate::request::{ClarifyRequest, CodeGenRequest};

/// JSON-over-HTTP client for every backend endpoint.
///
/// Cheap to clone (the inner `reqwest::Client` is reference counted).
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        read_json(response).await
    }

    /// Base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn segments_url(&self, segments: &[&str]) -> Result<Url, AiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AiError::Network(format!("invalid backend url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| AiError::Network(format!("invalid backend url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<U, T>(&self, url: U) -> Result<T, AiError>
    where
        U: IntoUrl + Send,
        T: DeserializeOwned,
    {
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }
}

/// Decode a 2xx body, or map the failure the same way for every endpoint.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, AiError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| AiError::Decode(e.to_string()));
    }

    // Error bodies are best effort: FastAPI sends {"detail": ...}, older
    // endpoints {"error": ...}, proxies sometimes plain text.
    let body = response.json::<JsonValue>().await.unwrap_or(JsonValue::Null);
    let message = error_message(&body);
    warn!(status = status.as_u16(), error = ?message, "backend returned an error");

    Err(if status == StatusCode::TOO_MANY_REQUESTS {
        AiError::QuotaExceeded(message.unwrap_or_else(|| QUOTA_EXCEEDED_MESSAGE.to_string()))
    } else {
        AiError::Remote {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| format!("API error: {}", status.as_u16())),
        }
    })
}

fn error_message(body: &JsonValue) -> Option<String> {
    ["detail", "error", "message"].iter().find_map(|field| match body.get(*field) {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(JsonValue::Null) | None => None,
        Some(JsonValue::String(_)) => None,
        // Validation errors arrive as structured detail; keep them readable.
        Some(other) => Some(other.to_string()),
    })
}

#[async_trait]
impl AiBackend for BackendClient {
    #[instrument(skip(self, request), fields(install = %request.install))]
    async fn clarify(&self, request: &ClarifyRequest) -> Result<JsonValue, AiError> {
        debug!("calling /clarify");
        self.post_json("/clarify", request).await
    }

    #[instrument(skip(self, request), fields(install = %request.install))]
    async fn generate_code(&self, request: &CodeGenRequest) -> Result<JsonValue, AiError> {
        debug!("calling /gen-code");
        self.post_json("/gen-code", request).await
    }
}

#[async_trait]
impl LicenseBackend for BackendClient {
    async fn validate_key(&self, key: &LicenseKey, install: &InstallId) -> Result<KeyValidation, AiError> {
        self.post_json(
            "/validate-key",
            &json!({ "accessKey": key.as_str(), "install": install.as_str() }),
        )
        .await
    }

    async fn find_key_by_install(&self, install: &InstallId) -> Result<InstallKey, AiError> {
        self.post_json("/find-key-by-install", &json!({ "install": install.as_str() }))
            .await
    }

    async fn usage(&self, key: &LicenseKey) -> Result<KeyUsage, AiError> {
        let url = self.segments_url(&["usage", key.as_str()])?;
        self.get_json(url).await
    }

    async fn health(&self) -> Result<JsonValue, AiError> {
        self.get_json(self.url("/health")).await
    }

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<JsonValue, AiError> {
        self.post_json("/feedback", feedback).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode as AxumStatus,
        routing::{get, post},
    };
    use gobot_core::IssueData;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> BackendClient {
        BackendClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    fn clarify_request() -> ClarifyRequest {
        let issue = IssueData::new("Add settings page", "Users need to update profile");
        ClarifyRequest::new(&issue, &InstallId::new("site-1"), None, Some("KEY"))
    }

    #[test]
    fn error_message_prefers_detail_then_error() {
        assert_eq!(
            error_message(&json!({ "detail": "Monthly usage limit reached.", "error": "x" })),
            Some("Monthly usage limit reached.".to_string())
        );
        assert_eq!(error_message(&json!({ "error": "bad key" })), Some("bad key".to_string()));
        assert_eq!(error_message(&json!({ "detail": "" })), None);
        assert_eq!(error_message(&JsonValue::Null), None);
        assert_eq!(
            error_message(&json!({ "detail": [{ "loc": ["body", "title"] }] })),
            Some(r#"[{"loc":["body","title"]}]"#.to_string())
        );
    }

    #[tokio::test]
    async fn clarify_returns_backend_body_verbatim() {
        let router = Router::new().route(
            "/clarify",
            post(|Json(body): Json<JsonValue>| async move {
                Json(json!({
                    "acceptanceCriteria": [format!("title was {}", body["title"].as_str().unwrap_or(""))],
                    "edgeCases": [],
                    "successMetrics": [],
                    "testScenarios": [],
                }))
            }),
        );
        let client = client(spawn_stub(router).await);

        let result = client.clarify(&clarify_request()).await.unwrap();
        assert_eq!(result["acceptanceCriteria"][0], "title was Add settings page");
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_quota_exceeded() {
        let router = Router::new().route(
            "/gen-code",
            post(|| async {
                (
                    AxumStatus::TOO_MANY_REQUESTS,
                    Json(json!({ "detail": "Monthly usage limit reached." })),
                )
            }),
        );
        let client = client(spawn_stub(router).await);

        let err = client.generate_code(&CodeGenRequest::default()).await.unwrap_err();
        assert_eq!(err, AiError::QuotaExceeded("Monthly usage limit reached.".to_string()));
        assert_eq!(err.to_string(), "Monthly usage limit reached.");
    }

    #[tokio::test]
    async fn bare_429_uses_default_quota_message() {
        let router = Router::new().route("/gen-code", post(|| async { AxumStatus::TOO_MANY_REQUESTS }));
        let client = client(spawn_stub(router).await);

        let err = client.generate_code(&CodeGenRequest::default()).await.unwrap_err();
        assert_eq!(err.to_string(), QUOTA_EXCEEDED_MESSAGE);
    }

    #[tokio::test]
    async fn server_error_without_body_reports_status() {
        let router = Router::new().route("/clarify", post(|| async { AxumStatus::INTERNAL_SERVER_ERROR }));
        let client = client(spawn_stub(router).await);

        let err = client.clarify(&clarify_request()).await.unwrap_err();
        assert_eq!(
            err,
            AiError::Remote {
                status: 500,
                message: "API error: 500".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}"))
            .clarify(&clarify_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Network(_)));
    }

    #[tokio::test]
    async fn license_endpoints_use_normalised_key() {
        let router = Router::new()
            .route(
                "/usage/:key",
                get(|Path(key): Path<String>| async move {
                    Json(json!({ "keyCode": key, "gotbotsUsed": 2, "gobotLimit": 5, "gobotsRemaining": 3 }))
                }),
            )
            .route(
                "/validate-key",
                post(|Json(body): Json<JsonValue>| async move {
                    Json(json!({ "valid": body["accessKey"] == "GB-ABC", "install": body["install"] }))
                }),
            );
        let client = client(spawn_stub(router).await);
        let key = LicenseKey::parse(" gb-abc ").unwrap();

        let usage = client.usage(&key).await.unwrap();
        assert_eq!(usage.key_code, "GB-ABC");
        assert_eq!(usage.gobots_used, 2);

        let validation = client.validate_key(&key, &InstallId::new("site-1")).await.unwrap();
        assert!(validation.valid);
        assert_eq!(validation.install.as_deref(), Some("site-1"));
    }

    #[tokio::test]
    async fn usage_key_stays_one_path_segment() {
        let router = Router::new().route(
            "/usage/:key",
            get(|Path(key): Path<String>| async move {
                Json(json!({ "keyCode": key, "gotbotsUsed": 0, "gobotLimit": 5, "gobotsRemaining": 5 }))
            }),
        );
        let client = client(spawn_stub(router).await);
        let key = LicenseKey::parse("gb?x/y#z").unwrap();

        let usage = client.usage(&key).await.unwrap();
        assert_eq!(usage.key_code, "GB?X/Y#Z");
    }
}

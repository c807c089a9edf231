use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode as AxumStatus,
    response::IntoResponse,
    routing::{get, post},
};
use gobot_api::ApiClient;
use gobot_api::app::AppServices;
use gobot_core::{InstallId, IssueData, JobId};
use gobot_infra::AppConfig;
use gobot_infra::jobs::{JobStatus, PollError, PollerConfig};
use reqwest::StatusCode;
use serde_json::{Value as JsonValue, json};

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
    _backend: StubBackend,
}

impl TestServer {
    async fn spawn() -> Self {
        let backend = StubBackend::spawn().await;
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            backend_url: backend.base_url.clone(),
            http_timeout: Duration::from_secs(5),
            poller: fast_poller(),
            ..AppConfig::default()
        };

        // Same router as prod, bound to an ephemeral port.
        let (app, services) = gobot_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
            _backend: backend,
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Stand-in for the AI + license backend.
///
/// Titles steer `/clarify`: "quota" answers 429, "boom" answers 500.
/// `/gen-code` always answers 429 with a FastAPI style `detail`.
struct StubBackend {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl StubBackend {
    async fn spawn() -> Self {
        let router = Router::new()
            .route("/clarify", post(clarify))
            .route(
                "/gen-code",
                post(|| async {
                    (
                        AxumStatus::TOO_MANY_REQUESTS,
                        Json(json!({ "detail": "Monthly usage limit reached." })),
                    )
                }),
            )
            .route("/validate-key", post(validate_key))
            .route(
                "/usage/:key",
                get(|Path(key): Path<String>| async move {
                    Json(json!({ "keyCode": key, "gotbotsUsed": 4, "gobotLimit": 10, "gobotsRemaining": 6 }))
                }),
            )
            .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
            .route("/feedback", post(|| async { AxumStatus::SERVICE_UNAVAILABLE }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn validate_key(Json(body): Json<JsonValue>) -> axum::response::Response {
    if body["accessKey"] == "GB-DOWN" {
        return AxumStatus::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({ "valid": body["accessKey"] == "GB-GOOD", "install": body["install"], "plan": "pro" }))
        .into_response()
}

async fn clarify(Json(body): Json<JsonValue>) -> axum::response::Response {
    match body["title"].as_str().unwrap_or_default() {
        "quota" => (AxumStatus::TOO_MANY_REQUESTS, Json(json!({}))).into_response(),
        "boom" => (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({ "error": "model unavailable" }))).into_response(),
        _ => Json(json!({
            "acceptanceCriteria": [format!("{} works for {}", body["title"].as_str().unwrap_or_default(), body["install"].as_str().unwrap_or_default())],
            "edgeCases": [],
            "successMetrics": [],
            "testScenarios": [],
            "issueType": body["issueType"],
            "priority": body["priority"]
        }))
        .into_response(),
    }
}

fn fast_poller() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(10),
        max_attempts: Some(300),
        not_found_grace: 3,
    }
}

fn settings_page() -> IssueData {
    IssueData::new("Add settings page", "Users need to update profile")
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = reqwest::get(format!("{}/backend/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn clarify_job_completes_with_backend_result() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/jobs/clarify-issue", srv.base_url))
        .json(&json!({
            "issueData": { "title": "Add settings page", "description": "Users need to update profile" },
            "install": "site-1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: JsonValue = res.json().await.unwrap();
    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert!(!job_id.is_empty());

    let result = srv
        .client()
        .poller(fast_poller())
        .wait(job_id.parse().unwrap())
        .await
        .unwrap();

    assert_eq!(result["acceptanceCriteria"][0], "Add settings page works for site-1");
    assert_eq!(result["issueType"], "Task");
    assert_eq!(result["priority"], "Medium");
}

#[tokio::test]
async fn status_is_readable_until_cleared() {
    let srv = TestServer::spawn().await;
    let api = srv.client();

    let job_id = api
        .start_clarify_issue(&settings_page(), &InstallId::default(), None, None)
        .await
        .unwrap();

    let mut status = api.job_status(job_id).await.unwrap().status;
    for _ in 0..300 {
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        status = api.job_status(job_id).await.unwrap().status;
    }
    assert_eq!(status, JobStatus::Completed);
    // reading does not consume the record
    assert_eq!(api.job_status(job_id).await.unwrap().status, JobStatus::Completed);

    api.clear_job(job_id).await.unwrap();
    assert_eq!(api.job_status(job_id).await.unwrap().status, JobStatus::NotFound);
}

#[tokio::test]
async fn gen_code_quota_failure_reaches_poller() {
    let srv = TestServer::spawn().await;
    let api = srv.client();

    let job_id = api
        .start_gen_code(&settings_page(), &InstallId::new("site-1"), Some("Use Rust"), Some("GB-GOOD"))
        .await
        .unwrap();

    let err = api.poller(fast_poller()).wait(job_id).await.unwrap_err();
    assert!(err.to_string().contains("Monthly usage limit reached."));
    assert!(err.is_quota_exceeded());

    // the poller cleared the record after reading it
    assert_eq!(api.job_status(job_id).await.unwrap().status, JobStatus::NotFound);
}

#[tokio::test]
async fn remote_errors_keep_backend_message() {
    let srv = TestServer::spawn().await;
    let api = srv.client();

    let job_id = api
        .start_clarify_issue(&IssueData::new("boom", ""), &InstallId::default(), None, None)
        .await
        .unwrap();
    let err = api.poller(fast_poller()).wait(job_id).await.unwrap_err();
    assert!(matches!(err, PollError::Failed { ref message, .. } if message == "model unavailable"));

    let job_id = api
        .start_clarify_issue(&IssueData::new("quota", ""), &InstallId::default(), None, None)
        .await
        .unwrap();
    let err = api.poller(fast_poller()).wait(job_id).await.unwrap_err();
    assert_eq!(err.to_string(), "Monthly usage limit reached. Please upgrade your plan.");
}

#[tokio::test]
async fn two_submissions_are_tracked_independently() {
    let srv = TestServer::spawn().await;
    let api = srv.client();

    let a = api
        .start_clarify_issue(&settings_page(), &InstallId::default(), None, None)
        .await
        .unwrap();
    let b = api
        .start_clarify_issue(&settings_page(), &InstallId::default(), None, None)
        .await
        .unwrap();
    assert_ne!(a, b);

    let poller = api.poller(fast_poller());
    assert!(poller.wait(a).await.is_ok());
    assert!(poller.wait(b).await.is_ok());
}

#[tokio::test]
async fn clarify_without_title_is_rejected() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(format!("{}/jobs/clarify-issue", srv.base_url))
        .json(&json!({ "issueData": { "title": " ", "description": "x" } }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn clear_is_idempotent_and_ids_are_validated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let unknown = JobId::new();

    for _ in 0..2 {
        let res = client
            .delete(format!("{}/jobs/{}", srv.base_url, unknown))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: JsonValue = res.json().await.unwrap();
        assert_eq!(body["success"], true);
    }

    let res = client
        .get(format!("{}/jobs/{}", srv.base_url, unknown))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["status"], "not_found");

    let res = client
        .get(format!("{}/jobs/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn unknown_job_gives_up_after_grace() {
    let srv = TestServer::spawn().await;
    let err = srv
        .client()
        .poller(fast_poller())
        .wait(JobId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PollError::NotFound(_)));
}

#[tokio::test]
async fn license_validation_normalises_key_and_hides_backend_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let url = format!("{}/license/validate", srv.base_url);

    let res = client
        .post(&url)
        .json(&json!({ "accessKey": " gb-good ", "install": "site-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["plan"], "pro");

    let res = client
        .post(&url)
        .json(&json!({ "accessKey": "GB-DOWN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Failed to validate access key. Please try again.");

    let res = client.post(&url).json(&json!({ "accessKey": "" })).send().await.unwrap();
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn usage_and_feedback_proxies() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = reqwest::get(format!("{}/license/usage/gb-abc", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["keyCode"], "GB-ABC");
    assert_eq!(body["gobotsUsed"], 4);

    let res = client
        .post(format!("{}/feedback", srv.base_url))
        .json(&json!({
            "ticketData": { "title": "t" },
            "clarifiedOutput": {},
            "feedbackType": "upvote",
            "orgId": "site-1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "error", "message": "Failed to submit feedback" }));
}

#[tokio::test]
async fn ticket_formatting_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let clarified = json!({
        "acceptanceCriteria": ["Page loads"],
        "edgeCases": [],
        "successMetrics": ["Fewer tickets"],
        "testScenarios": []
    });

    let res = client
        .post(format!("{}/tickets/description", srv.base_url))
        .json(&json!({
            "clarifiedOutput": clarified,
            "originalDescription": {
                "type": "doc",
                "version": 1,
                "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "Users need it" }] }]
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    let description = body["description"].as_str().unwrap();
    assert!(description.starts_with("Users need it"));
    assert!(description.contains("✅ Acceptance Criteria\n• Page loads"));
    assert!(description.contains("📊 Success Metrics\n• Fewer tickets"));
    assert!(!description.contains("Edge Cases"));

    let res = client
        .post(format!("{}/tickets/adf", srv.base_url))
        .json(&json!({ "clarifiedOutput": clarified }))
        .send()
        .await
        .unwrap();
    let doc: JsonValue = res.json().await.unwrap();
    assert_eq!(doc["type"], "doc");
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["content"][0]["type"], "heading");

    let res = client
        .post(format!("{}/tickets/implementation", srv.base_url))
        .json(&json!({ "codeGenOutput": { "implementation": "fn main() {}", "summary": "Entry point" } }))
        .send()
        .await
        .unwrap();
    let attachment: JsonValue = res.json().await.unwrap();
    assert!(attachment["fileName"].as_str().unwrap().starts_with("gobot-implementation-"));
    assert!(attachment["content"].as_str().unwrap().contains("fn main() {}"));
}

#[tokio::test]
async fn panel_polls_with_the_server_cadence() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/jobs/config", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "intervalMs": 10, "maxAttempts": 300, "notFoundGrace": 3 }));

    let api = srv.client();
    assert_eq!(api.poll_settings().await.unwrap(), fast_poller());

    let job_id = api
        .start_clarify_issue(&settings_page(), &InstallId::new("site-1"), None, None)
        .await
        .unwrap();
    let result = api.server_poller().await.unwrap().wait(job_id).await.unwrap();
    assert_eq!(result["acceptanceCriteria"][0], "Add settings page works for site-1");
}

#[tokio::test]
async fn consumer_stats_track_jobs_until_shutdown() {
    let srv = TestServer::spawn().await;
    let api = srv.client();

    let idle = api.consumer_stats().await.unwrap();
    assert_eq!(idle.received, 0);
    assert_eq!(idle.in_flight, 0);

    let ok = api
        .start_clarify_issue(&settings_page(), &InstallId::new("site-1"), None, None)
        .await
        .unwrap();
    let quota = api
        .start_gen_code(&settings_page(), &InstallId::new("site-1"), None, None)
        .await
        .unwrap();
    let poller = api.poller(fast_poller());
    poller.wait(ok).await.unwrap();
    poller.wait(quota).await.unwrap_err();

    // Counters are bumped right after the terminal write.
    let mut stats = api.consumer_stats().await.unwrap();
    for _ in 0..50 {
        if stats.completed == 1 && stats.failed == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        stats = api.consumer_stats().await.unwrap();
    }
    assert_eq!(stats.received, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.in_flight, 0);

    srv.services.shutdown().await;
    let res = reqwest::get(format!("{}/jobs/stats", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["error"], "consumer_stopped");
}

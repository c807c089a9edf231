//! Test doubles shared by the job tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use gobot_ai::{AiBackend, AiError, ClarifyRequest, CodeGenRequest};

/// Backend answering every call with the same canned result.
#[derive(Debug)]
pub(crate) struct StubBackend {
    response: Mutex<Result<JsonValue, AiError>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubBackend {
    pub(crate) fn ok(body: JsonValue) -> Self {
        Self::with(Ok(body))
    }

    pub(crate) fn failing(err: AiError) -> Self {
        Self::with(Err(err))
    }

    fn with(response: Result<JsonValue, AiError>) -> Self {
        Self {
            response: Mutex::new(response),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<JsonValue, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiBackend for StubBackend {
    async fn clarify(&self, _request: &ClarifyRequest) -> Result<JsonValue, AiError> {
        self.respond().await
    }

    async fn generate_code(&self, _request: &CodeGenRequest) -> Result<JsonValue, AiError> {
        self.respond().await
    }
}

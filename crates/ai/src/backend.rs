use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use gobot_core::{InstallId, LicenseKey};

use crate::error::AiError;
use crate::license::{Feedback, InstallKey, KeyUsage, KeyValidation};
use crate::request::{ClarifyRequest, CodeGenRequest};

/// The remote AI service.
///
/// Results are opaque JSON: callers store and forward them verbatim.
#[async_trait]
pub trait AiBackend: Send + Sync {
    async fn clarify(&self, request: &ClarifyRequest) -> Result<JsonValue, AiError>;

    async fn generate_code(&self, request: &CodeGenRequest) -> Result<JsonValue, AiError>;
}

/// The license / usage service.
#[async_trait]
pub trait LicenseBackend: Send + Sync {
    async fn validate_key(&self, key: &LicenseKey, install: &InstallId) -> Result<KeyValidation, AiError>;

    async fn find_key_by_install(&self, install: &InstallId) -> Result<InstallKey, AiError>;

    async fn usage(&self, key: &LicenseKey) -> Result<KeyUsage, AiError>;

    async fn health(&self) -> Result<JsonValue, AiError>;

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<JsonValue, AiError>;
}

#[async_trait]
impl<B> AiBackend for Arc<B>
where
    B: AiBackend + ?Sized,
{
    async fn clarify(&self, request: &ClarifyRequest) -> Result<JsonValue, AiError> {
        (**self).clarify(request).await
    }

    async fn generate_code(&self, request: &CodeGenRequest) -> Result<JsonValue, AiError> {
        (**self).generate_code(request).await
    }
}

#[async_trait]
impl<B> LicenseBackend for Arc<B>
where
    B: LicenseBackend + ?Sized,
{
    async fn validate_key(&self, key: &LicenseKey, install: &InstallId) -> Result<KeyValidation, AiError> {
        (**self).validate_key(key, install).await
    }

    async fn find_key_by_install(&self, install: &InstallId) -> Result<InstallKey, AiError> {
        (**self).find_key_by_install(install).await
    }

    async fn usage(&self, key: &LicenseKey) -> Result<KeyUsage, AiError> {
        (**self).usage(key).await
    }

    async fn health(&self) -> Result<JsonValue, AiError> {
        (**self).health().await
    }

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<JsonValue, AiError> {
        (**self).submit_feedback(feedback).await
    }
}

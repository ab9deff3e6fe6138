//! HTTP client for the hosted completion endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::CheckerConfig;
use crate::request::ComplianceCheckRequest;
use crate::result::{AiError, CheckResult};

/// Anything that can answer a compliance question.
#[async_trait]
pub trait ComplianceChecker: Send + Sync {
    async fn check(&self, request: &ComplianceCheckRequest) -> Result<CheckResult, AiError>;
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    content: String,
}

/// Sends `POST {endpoint}` as `multipart/form-data` with a `prompt` field and an
/// optional `image` file part; expects `{ "content": "<markdown>" }` back.
#[derive(Debug, Clone)]
pub struct HttpComplianceChecker {
    http: reqwest::Client,
    config: CheckerConfig,
}

impl HttpComplianceChecker {
    pub fn new(config: CheckerConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    fn form(request: &ComplianceCheckRequest) -> Result<Form, AiError> {
        let form = Form::new().text("prompt", request.prompt.trim().to_string());
        let Some(image) = &request.image else {
            return Ok(form);
        };
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        Ok(form.part("image", part))
    }
}

#[async_trait]
impl ComplianceChecker for HttpComplianceChecker {
    async fn check(&self, request: &ComplianceCheckRequest) -> Result<CheckResult, AiError> {
        request.validate(self.config.max_image_bytes)?;

        tracing::info!(
            endpoint = %self.config.endpoint,
            prompt_len = request.prompt.len(),
            has_image = request.image.is_some(),
            "sending compliance check"
        );

        let resp = self
            .http
            .post(self.config.endpoint.clone())
            .multipart(Self::form(request)?)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "compliance check rejected");
            return Err(AiError::Api { status, body });
        }

        let body: CheckResponse = resp
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        tracing::debug!(content_len = body.content.len(), "compliance check answered");
        Ok(CheckResult::new(body.content))
    }
}

//! Anthropic classifier implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use webinfer_protocols::classifier::{SYSTEM_PROMPT, build_prompt, parse_classification};
use webinfer_protocols::{Classification, ClassificationError, ClassificationRequest, Classifier};

use crate::api::{ApiMessage, ApiRequest, ApiResponse};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// Section classifier backed by the Anthropic Messages API.
pub struct AnthropicClassifier {
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl AnthropicClassifier {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self::with_url(api_key, model, DEFAULT_API_URL.to_string())
    }

    pub fn with_url(api_key: String, model: Option<String>, api_url: String) -> Self {
        Self {
            api_key,
            api_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: 400,
            temperature: 0.3,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    fn build_request(&self, request: &ClassificationRequest) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user",
                content: build_prompt(request),
            }],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }

    async fn send_request(
        &self,
        api_request: &ApiRequest,
    ) -> Result<reqwest::Response, ClassificationError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassificationError::Timeout(Duration::ZERO)
                } else {
                    ClassificationError::ProviderUnavailable(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 529 {
            // Anthropic reports overload with a non-standard status.
            let text = response.text().await.unwrap_or_default();
            return Err(ClassificationError::ProviderUnavailable(format!(
                "overloaded - {}",
                text
            )));
        }
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(ClassificationError::from_status(status, &text, retry_after));
        }

        Ok(response)
    }
}

#[async_trait]
impl Classifier for AnthropicClassifier {
    fn id(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        let api_request = self.build_request(request);
        let response = self.send_request(&api_request).await?;
        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

        debug!(
            model = %self.model,
            stop_reason = api_response.stop_reason.as_deref().unwrap_or("unknown"),
            section = %request.section_id,
            "Classifier replied"
        );
        parse_classification(&api_response.text())
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;

//! OpenAI classifier implementation.

use async_trait::async_trait;
use tracing::debug;

use webinfer_protocols::classifier::{SYSTEM_PROMPT, build_prompt, parse_classification};
use webinfer_protocols::{Classification, ClassificationError, ClassificationRequest, Classifier};

use crate::api::{ApiMessage, ApiRequest, ApiResponse, ResponseFormat};
use crate::http::{error_from_response, map_send_error};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Section classifier backed by a chat completions endpoint.
pub struct OpenAIClassifier {
    id: String,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAIClassifier {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self::with_url(api_key, model, DEFAULT_API_URL.to_string())
    }

    /// Create a classifier with a custom API URL (for OpenAI-compatible APIs).
    pub fn with_url(api_key: String, model: Option<String>, api_url: String) -> Self {
        Self {
            id: "openai".to_string(),
            api_key,
            api_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: 400,
            temperature: 0.3,
            client: reqwest::Client::new(),
        }
    }

    /// Report a different provider ID, e.g. `groq`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    fn build_request(&self, request: &ClassificationRequest) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ApiMessage {
                    role: "user",
                    content: build_prompt(request),
                },
            ],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }

    async fn send_request(
        &self,
        api_request: &ApiRequest,
    ) -> Result<reqwest::Response, ClassificationError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(api_request)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response)
    }
}

#[async_trait]
impl Classifier for OpenAIClassifier {
    fn id(&self) -> &str {
        &self.id
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

        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            ClassificationError::MalformedResponse("response contained no choices".to_string())
        })?;
        debug!(
            provider = %self.id,
            model = api_response.model.as_deref().unwrap_or(&self.model),
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            section = %request.section_id,
            "Classifier replied"
        );

        let content = choice.message.content.unwrap_or_default();
        parse_classification(&content)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;

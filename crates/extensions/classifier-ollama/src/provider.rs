//! Ollama `/api/generate` classifier.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use webinfer_protocols::classifier::{SYSTEM_PROMPT, build_prompt, parse_classification};
use webinfer_protocols::{Classification, ClassificationError, ClassificationRequest, Classifier};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";

/// Request body for Ollama /api/generate
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    system: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response body from Ollama /api/generate
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done_reason: Option<String>,
}

/// Section classifier backed by a local Ollama instance.
pub struct OllamaClassifier {
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OllamaClassifier {
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
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
}

#[async_trait]
impl Classifier for OllamaClassifier {
    fn id(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(request),
            system: SYSTEM_PROMPT,
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassificationError::Timeout(Duration::ZERO)
                } else if e.is_connect() {
                    ClassificationError::ProviderUnavailable(format!(
                        "cannot reach Ollama at {}",
                        self.base_url
                    ))
                } else {
                    ClassificationError::ProviderUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // A missing model is a configuration problem, not a transient one.
            if status.as_u16() == 404 {
                return Err(ClassificationError::Rejected {
                    status: 404,
                    message: text,
                });
            }
            return Err(ClassificationError::from_status(status.as_u16(), &text, None));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

        debug!(
            model = %self.model,
            done_reason = parsed.done_reason.as_deref().unwrap_or("unknown"),
            section = %request.section_id,
            "Classifier replied"
        );
        parse_classification(&parsed.response)
    }
}

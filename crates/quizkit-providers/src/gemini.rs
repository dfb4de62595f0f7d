//! Direct Gemini API generator.
//!
//! Sends the MCQ prompt straight to the generative model instead of going
//! through the learning-app backend. Transient failures are retried once.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizkit_core::error::GenerationError;
use quizkit_core::traits::{build_mcq_prompt, GenerateRequest, QuizGenerator};

use crate::error::{generation_status_error, retry_after_secs, transport_error};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 1;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
const INVALID_REQUEST_MESSAGE: &str = "Invalid request. Please modify your topic.";

/// Gemini `generateContent` client.
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: String,
    retries: u32,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: &str, model: Option<String>, base_url: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            client,
        })
    }

    /// Override the retry policy.
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    async fn call_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e, DEFAULT_TIMEOUT_SECS))?;

        let status = response.status().as_u16();
        if status == 400 {
            return Err(GenerationError::InvalidRequest(
                INVALID_REQUEST_MESSAGE.to_string(),
            ));
        }
        if status >= 400 {
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(generation_status_error(status, retry_after, &message));
        }

        let api_response: GeminiResponse =
            response.json().await.map_err(|e| GenerationError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        Ok(api_response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[async_trait]
impl QuizGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %self.model, topic = %request.topic))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<String> {
        let prompt = build_mcq_prompt(request);

        let mut attempt = 0;
        loop {
            match self.call_once(&prompt).await {
                Ok(text) => return Ok(text),
                // Retrying a rejected request cannot help.
                Err(e @ GenerationError::InvalidRequest(_)) => return Err(e.into()),
                Err(e) if attempt >= self.retries => return Err(e.into()),
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        "generation failed, retrying in {:?}: {e}",
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

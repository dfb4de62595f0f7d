//! Learning-app HTTP API client.
//!
//! The backend generates quiz text (`POST /mcq`), records scores
//! (`POST /mcq/score`), and lists history (`GET /history`), all behind a
//! bearer token.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizkit_core::error::GenerationError;
use quizkit_core::model::{HistoryEntry, ScoreSubmission};
use quizkit_core::traits::{GenerateRequest, HistoryStore, QuizGenerator, ScoreStore};

use crate::error::{
    error_message, generation_status_error, retry_after_secs, transport_error, StoreError,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for the learning-app REST API.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: Option<String>, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[derive(Deserialize)]
struct McqResponse {
    mcq: String,
}

#[derive(Serialize)]
struct ScoreBody<'a> {
    topic: &'a str,
    score: u32,
    total: u32,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[async_trait]
impl QuizGenerator for ApiClient {
    fn name(&self) -> &str {
        "api"
    }

    #[instrument(skip(self, request), fields(topic = %request.topic, count = request.count))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<String> {
        let response = self
            .authorized(self.client.post(format!("{}/mcq", self.base_url)))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e, DEFAULT_TIMEOUT_SECS))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(generation_status_error(status, retry_after, &body).into());
        }

        let body: McqResponse = response.json().await.map_err(|e| GenerationError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })?;

        tracing::debug!(bytes = body.mcq.len(), "received quiz text");
        Ok(body.mcq)
    }
}

#[async_trait]
impl ScoreStore for ApiClient {
    #[instrument(skip(self, submission), fields(topic = %submission.topic))]
    async fn save_score(&self, submission: &ScoreSubmission) -> anyhow::Result<()> {
        let body = ScoreBody {
            topic: &submission.topic,
            score: submission.score,
            total: submission.total,
        };
        let response = self
            .authorized(self.client.post(format!("{}/mcq/score", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        check_store_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for ApiClient {
    async fn list_history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let response = self
            .authorized(self.client.get(format!("{}/history", self.base_url)))
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let response = check_store_status(response).await?;
        let body: HistoryResponse = response
            .json()
            .await
            .context("failed to parse history response")?;
        Ok(body.history)
    }
}

async fn check_store_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status().as_u16();
    if status == 401 {
        return Err(StoreError::Unauthorized);
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::ApiError {
            status,
            message: error_message(&body),
        });
    }
    Ok(response)
}

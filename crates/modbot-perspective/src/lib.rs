//! Toxicity scoring client for Perspective-style `comments:analyze` APIs.
//!
//! Implements the [`ToxicityScorer`] port: one request per score, no retries.
//! An empty response body shape degrades to an absent score rather than an
//! error; only transport failures and non-success statuses are errors.

use std::time::Duration;

use async_trait::async_trait;
use modbot_core::{ScorerError, ToxicityScorer};
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_ANALYZE_URL: &str =
    "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze";

const MAX_ERROR_BODY_CHARS: usize = 600;

#[derive(Debug, Clone, Deserialize)]
struct AnalyzeResponse {
    #[serde(default, rename = "attributeScores")]
    attribute_scores: Option<AttributeScores>,
}

#[derive(Debug, Clone, Deserialize)]
struct AttributeScores {
    #[serde(default, rename = "TOXICITY")]
    toxicity: Option<AttributeScore>,
}

#[derive(Debug, Clone, Deserialize)]
struct AttributeScore {
    #[serde(default, rename = "summaryScore")]
    summary_score: Option<SummaryScore>,
}

#[derive(Debug, Clone, Deserialize)]
struct SummaryScore {
    #[serde(default)]
    value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PerspectiveConfig {
    pub analyze_url: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct PerspectiveClient {
    http: reqwest::Client,
    config: PerspectiveConfig,
}

impl PerspectiveClient {
    pub fn new(config: PerspectiveConfig) -> Result<Self, ScorerError> {
        if config.api_key.trim().is_empty() {
            return Err(ScorerError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|error| ScorerError::Transport(error.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl ToxicityScorer for PerspectiveClient {
    async fn score(&self, text: &str, language: &str) -> Result<Option<f64>, ScorerError> {
        let body = json!({
            "comment": { "text": text },
            "requestedAttributes": { "TOXICITY": {} },
            "languages": [language],
        });
        let response = self
            .http
            .post(&self.config.analyze_url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|error| ScorerError::Transport(error.to_string()))?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|error| ScorerError::Transport(error.to_string()))?;
        if !status.is_success() {
            return Err(ScorerError::HttpStatus {
                status: status.as_u16(),
                body: truncate_for_error(&payload),
            });
        }

        let parsed: AnalyzeResponse = serde_json::from_str(&payload)
            .map_err(|error| ScorerError::InvalidResponse(error.to_string()))?;
        Ok(parsed
            .attribute_scores
            .and_then(|scores| scores.toxicity)
            .and_then(|attribute| attribute.summary_score)
            .and_then(|summary| summary.value)
            .map(|value| value.clamp(0.0, 1.0)))
    }
}

fn truncate_for_error(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{truncated}...")
}

//! Comment posting client for the commenting platform's `comment/add` API.
//!
//! Implements the [`CommentPoster`] port: a multipart form with the thread
//! id, the parent comment id and the reply text, authenticated through the
//! `X-Device-Token` header. One attempt per post, no retries.

use std::time::Duration;

use async_trait::async_trait;
use modbot_core::{CommentPoster, PosterError};
use reqwest::multipart::Form;

pub const DEFAULT_ADD_COMMENT_URL: &str = "https://api.tjournal.ru/v1.8/comment/add";

const MAX_ERROR_BODY_CHARS: usize = 600;

#[derive(Debug, Clone)]
pub struct CommentsConfig {
    pub add_comment_url: String,
    pub device_token: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CommentsClient {
    http: reqwest::Client,
    config: CommentsConfig,
}

impl CommentsClient {
    pub fn new(config: CommentsConfig) -> Result<Self, PosterError> {
        if config.device_token.trim().is_empty() {
            return Err(PosterError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|error| PosterError::Transport(error.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl CommentPoster for CommentsClient {
    async fn post(&self, thread_id: u64, parent_id: u64, text: &str) -> Result<(), PosterError> {
        let form = Form::new()
            .text("id", thread_id.to_string())
            .text("reply_to", parent_id.to_string())
            .text("text", text.to_string());
        let response = self
            .http
            .post(&self.config.add_comment_url)
            .header("X-Device-Token", self.config.device_token.trim())
            .multipart(form)
            .send()
            .await
            .map_err(|error| PosterError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PosterError::HttpStatus {
                status: status.as_u16(),
                body: truncate_for_error(&body),
            });
        }
        Ok(())
    }
}

fn truncate_for_error(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{truncated}...")
}

//! Environment-variable configuration for the webhook binary.
//!
//! Startup fails hard when the scorer or poster credentials are absent; the
//! process must not serve traffic without them.

use modbot_core::{ResponderConfig, DEFAULT_DEDUP_CAPACITY};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BOT_ID: u64 = 400974;
pub const DEFAULT_BOT_NAME: &str = "Токсикометр";
pub const DEFAULT_SCORE_LANGUAGE: &str = "ru";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub bind_addr: String,
    pub perspective_api_key: String,
    pub perspective_url: String,
    pub comments_api_key: String,
    pub comments_add_url: String,
    pub request_timeout_ms: u64,
    pub responder: ResponderConfig,
}

impl WebhookConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let perspective_api_key = required(&lookup, "MODBOT_PERSPECTIVE_API_KEY")?;
        let comments_api_key = required(&lookup, "MODBOT_COMMENTS_API_KEY")?;

        let responder = ResponderConfig {
            bot_id: parsed_u64(&lookup, "MODBOT_BOT_ID")?.unwrap_or(DEFAULT_BOT_ID),
            bot_name: optional(&lookup, "MODBOT_BOT_NAME")
                .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            privileged_owner_id: parsed_u64(&lookup, "MODBOT_PRIVILEGED_OWNER_ID")?,
            watched_author_id: parsed_u64(&lookup, "MODBOT_WATCHED_AUTHOR_ID")?,
            moderator_id: parsed_u64(&lookup, "MODBOT_MODERATOR_ID")?,
            dedup_capacity: parsed_usize(&lookup, "MODBOT_DEDUP_CAPACITY")?
                .unwrap_or(DEFAULT_DEDUP_CAPACITY),
            score_language: optional(&lookup, "MODBOT_SCORE_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_SCORE_LANGUAGE.to_string()),
        };

        Ok(Self {
            bind_addr: optional(&lookup, "MODBOT_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            perspective_api_key,
            perspective_url: optional(&lookup, "MODBOT_PERSPECTIVE_URL")
                .unwrap_or_else(|| modbot_perspective::DEFAULT_ANALYZE_URL.to_string()),
            comments_api_key,
            comments_add_url: optional(&lookup, "MODBOT_COMMENTS_ADD_URL")
                .unwrap_or_else(|| modbot_comments::DEFAULT_ADD_COMMENT_URL.to_string()),
            request_timeout_ms: parsed_u64(&lookup, "MODBOT_REQUEST_TIMEOUT_MS")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            responder,
        })
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn parsed_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match optional(lookup, name) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

fn parsed_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<usize>, ConfigError> {
    match optional(lookup, name) {
        None => Ok(None),
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

//! Collaborator ports for the responder and their error taxonomy.
//!
//! The scoring and posting transports, the random source and the clock live
//! behind traits so the handler chain stays deterministic under test.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("scorer transport error: {0}")]
    Transport(String),
    #[error("scorer returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("scorer response malformed: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum PosterError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("poster transport error: {0}")]
    Transport(String),
    #[error("poster returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Scores the toxicity of a piece of text.
#[async_trait]
pub trait ToxicityScorer: Send + Sync {
    /// Returns a probability in [0,1], or `None` when the scoring service
    /// produced no score for the text.
    async fn score(&self, text: &str, language: &str) -> Result<Option<f64>, ScorerError>;
}

/// Posts a reply comment into a thread.
#[async_trait]
pub trait CommentPoster: Send + Sync {
    async fn post(&self, thread_id: u64, parent_id: u64, text: &str) -> Result<(), PosterError>;
}

/// Random decisions (escalation remark choice, weekend pseudo-score) go
/// through this port so tests can inject determinism.
pub trait RandomSource: Send + Sync {
    /// Uniform index into a non-empty collection of the given length.
    fn pick_index(&self, len: usize) -> usize;
    /// Uniform integer percentage in `[low, high]` inclusive.
    fn percent_in_range(&self, low: i64, high: i64) -> i64;
}

pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn pick_index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }

    fn percent_in_range(&self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        rand::rng().random_range(low..=high)
    }
}

/// Wall-clock port; the weekend policy depends on the current day of week.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

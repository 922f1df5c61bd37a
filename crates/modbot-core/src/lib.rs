//! Event classifier and responder core for the toxicity moderation bot.
//!
//! Turns raw "new reply" notifications into normalized events, collapses
//! duplicate deliveries through a bounded recency cache and runs an ordered
//! chain of case handlers that decide whether (and how) the bot replies.
//! Outbound scoring and posting stay behind the [`ToxicityScorer`] and
//! [`CommentPoster`] ports so transports remain swappable.

pub mod catalog;
pub mod dedup;
pub mod event;
pub mod ports;
pub mod responder;

pub use catalog::MessageCatalog;
pub use dedup::{DedupCache, DEFAULT_DEDUP_CAPACITY};
pub use event::{normalize_notification, InboundEvent, ParentComment};
pub use ports::{
    Clock, CommentPoster, PosterError, RandomSource, ScorerError, SystemClock, ThreadRngSource,
    ToxicityScorer,
};
pub use responder::{HandleOutcome, HandleReport, HandlerResult, Responder, ResponderConfig};

//! Event classifier and responder.
//!
//! Inbound notifications flow through an ordered chain of case handlers:
//! the missing-identifier guard, the duplicate guard, the weekend-taunt and
//! anti-harassment policies, then the general scoring case. The first handler
//! that reports `handled` terminates the chain; if none does, the event is
//! classified as not relevant.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, FixedOffset, Weekday};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    catalog::MessageCatalog,
    dedup::DedupCache,
    event::{normalize_notification, InboundEvent},
    ports::{Clock, CommentPoster, RandomSource, SystemClock, ThreadRngSource, ToxicityScorer},
};

/// Scores above this threshold get an escalation remark appended.
const ESCALATION_THRESHOLD: f64 = 0.85;
/// Implicit summons below this score stay quiet.
const IMPLICIT_SUPPRESSION_THRESHOLD: f64 = 0.8;
/// Pseudo-score range for the weekend taunt, in percent.
const TAUNT_PERCENT_LOW: i64 = -95;
const TAUNT_PERCENT_HIGH: i64 = -50;
/// The weekend policy evaluates the day of week at a fixed UTC+3 offset.
const WEEKEND_UTC_OFFSET_SECONDS: i32 = 3 * 3600;

/// Identifiers and policy knobs for one responder instance. All platform
/// identifiers are canonical `u64` values; mention tokens embed their decimal
/// rendering.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// The bot's own platform account id.
    pub bot_id: u64,
    /// Literal display name that also counts as an explicit mention.
    pub bot_name: String,
    /// Thread owner the weekend-taunt policy fires for; `None` disables it.
    pub privileged_owner_id: Option<u64>,
    /// Author the anti-harassment policy watches; `None` disables it.
    pub watched_author_id: Option<u64>,
    /// Identifier whose mention counts as an implicit summon; `None`
    /// disables implicit summons.
    pub moderator_id: Option<u64>,
    pub dedup_capacity: usize,
    /// Language hint passed to the scorer, e.g. "ru".
    pub score_language: String,
}

/// Classification result for one inbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    NoIdentifier,
    NotRelevant,
    AlreadyHandled,
    Handled,
    HandlingError,
}

impl HandleOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoIdentifier => "no identifier",
            Self::NotRelevant => "not relevant",
            Self::AlreadyHandled => "already handled",
            Self::Handled => "handled",
            Self::HandlingError => "handling error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::HandlingError)
    }
}

/// What the caller of [`Responder::handle`] receives; always structured,
/// even when a collaborator failed mid-flight.
#[derive(Debug, Clone)]
pub struct HandleReport {
    pub outcome: HandleOutcome,
    pub detail: Option<String>,
}

/// Contract returned by every case handler in the chain.
#[derive(Debug, Clone)]
pub struct HandlerResult {
    pub handled: bool,
    pub error: bool,
    pub message: Option<String>,
    outcome: HandleOutcome,
}

impl HandlerResult {
    fn declined() -> Self {
        Self {
            handled: false,
            error: false,
            message: None,
            outcome: HandleOutcome::NotRelevant,
        }
    }

    fn completed() -> Self {
        Self {
            handled: true,
            error: false,
            message: None,
            outcome: HandleOutcome::Handled,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            handled: true,
            error: true,
            message: Some(message),
            outcome: HandleOutcome::HandlingError,
        }
    }

    fn no_identifier() -> Self {
        Self {
            handled: true,
            error: false,
            message: None,
            outcome: HandleOutcome::NoIdentifier,
        }
    }

    fn already_handled() -> Self {
        Self {
            handled: true,
            error: false,
            message: None,
            outcome: HandleOutcome::AlreadyHandled,
        }
    }
}

struct ResponderContext {
    config: ResponderConfig,
    catalog: MessageCatalog,
    cache: Mutex<DedupCache>,
    scorer: Arc<dyn ToxicityScorer>,
    poster: Arc<dyn CommentPoster>,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl ResponderContext {
    // The cache is the sole cross-request mutation point; a poisoned lock
    // cannot leave it in a state worse than losing recent entries.
    fn cache(&self) -> MutexGuard<'_, DedupCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
trait CaseHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, event: &InboundEvent, ctx: &ResponderContext) -> HandlerResult;
}

/// Stateless webhook responder owning the dedup cache and the handler chain.
pub struct Responder {
    ctx: ResponderContext,
    chain: Vec<Box<dyn CaseHandler>>,
}

impl Responder {
    pub fn new(
        config: ResponderConfig,
        catalog: MessageCatalog,
        scorer: Arc<dyn ToxicityScorer>,
        poster: Arc<dyn CommentPoster>,
    ) -> Self {
        Self::with_parts(
            config,
            catalog,
            scorer,
            poster,
            Arc::new(ThreadRngSource),
            Arc::new(SystemClock),
        )
    }

    /// Full constructor with injectable random source and clock.
    pub fn with_parts(
        config: ResponderConfig,
        catalog: MessageCatalog,
        scorer: Arc<dyn ToxicityScorer>,
        poster: Arc<dyn CommentPoster>,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Mutex::new(DedupCache::new(config.dedup_capacity));
        Self {
            ctx: ResponderContext {
                config,
                catalog,
                cache,
                scorer,
                poster,
                random,
                clock,
            },
            chain: vec![
                Box::new(MissingIdGuard),
                Box::new(DuplicateGuard),
                Box::new(WeekendTauntPolicy),
                Box::new(AntiHarassmentPolicy),
                Box::new(GeneralCase),
            ],
        }
    }

    /// Classifies one raw notification payload and runs the matching case.
    pub async fn handle(&self, payload: &Value) -> HandleReport {
        let event = normalize_notification(payload);
        for handler in &self.chain {
            let result = handler.attempt(&event, &self.ctx).await;
            if result.handled {
                debug!(
                    handler = handler.name(),
                    outcome = result.outcome.message(),
                    "notification handled"
                );
                return HandleReport {
                    outcome: result.outcome,
                    detail: result.message,
                };
            }
        }
        debug!(event_id = event.event_id, "notification not relevant");
        HandleReport {
            outcome: HandleOutcome::NotRelevant,
            detail: None,
        }
    }

    /// Wipes the dedup cache; previously seen events become new again.
    pub fn clear_cache(&self) {
        self.ctx.cache().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.ctx.cache().len()
    }
}

/// Rejects events without an identifier before they can pollute the cache.
struct MissingIdGuard;

#[async_trait]
impl CaseHandler for MissingIdGuard {
    fn name(&self) -> &'static str {
        "missing-id-guard"
    }

    async fn attempt(&self, event: &InboundEvent, _ctx: &ResponderContext) -> HandlerResult {
        if event.event_id.is_some() {
            return HandlerResult::declined();
        }
        warn!("notification carries no event id, ignoring");
        HandlerResult::no_identifier()
    }
}

/// Collapses redundant deliveries of the same notification. On a cache miss
/// the identifier is marked seen immediately, before any collaborator call,
/// so duplicates racing the first delivery collapse from the second one on.
struct DuplicateGuard;

#[async_trait]
impl CaseHandler for DuplicateGuard {
    fn name(&self) -> &'static str {
        "duplicate-guard"
    }

    async fn attempt(&self, event: &InboundEvent, ctx: &ResponderContext) -> HandlerResult {
        let Some(event_id) = event.event_id else {
            return HandlerResult::declined();
        };
        let mut cache = ctx.cache();
        if cache.has(event_id) {
            debug!(event_id, "duplicate notification suppressed");
            return HandlerResult::already_handled();
        }
        cache.mark_seen(event_id);
        HandlerResult::declined()
    }
}

/// On Saturdays (UTC+3), in threads owned by the privileged account, an
/// explicit summon gets a taunt with a nonsensical negative pseudo-score
/// instead of a real measurement. Never calls the scorer.
struct WeekendTauntPolicy;

#[async_trait]
impl CaseHandler for WeekendTauntPolicy {
    fn name(&self) -> &'static str {
        "weekend-taunt"
    }

    async fn attempt(&self, event: &InboundEvent, ctx: &ResponderContext) -> HandlerResult {
        let config = &ctx.config;
        let Some(owner_id) = config.privileged_owner_id else {
            return HandlerResult::declined();
        };
        let local = ctx.clock.now_utc().with_timezone(&weekend_offset());
        if local.weekday() != Weekday::Sat {
            return HandlerResult::declined();
        }
        if event.thread_owner_id != Some(owner_id) {
            return HandlerResult::declined();
        }
        let Some(text) = event.text.as_deref() else {
            return HandlerResult::declined();
        };
        if !explicit_summon(text, config) {
            return HandlerResult::declined();
        }
        let (Some(thread_id), Some(parent_id)) = (event.thread_id, event.parent_id()) else {
            return HandlerResult::declined();
        };

        let percent = ctx
            .random
            .percent_in_range(TAUNT_PERCENT_LOW, TAUNT_PERCENT_HIGH);
        let reply = ctx.catalog.render_taunt(percent);
        post_reply(ctx, thread_id, parent_id, &reply).await
    }
}

/// When the watched account replies to the bot itself, answers with a fixed
/// policy notice. Never calls the scorer.
struct AntiHarassmentPolicy;

#[async_trait]
impl CaseHandler for AntiHarassmentPolicy {
    fn name(&self) -> &'static str {
        "anti-harassment"
    }

    async fn attempt(&self, event: &InboundEvent, ctx: &ResponderContext) -> HandlerResult {
        let config = &ctx.config;
        let Some(watched_id) = config.watched_author_id else {
            return HandlerResult::declined();
        };
        if event.parent_author_id() != Some(config.bot_id) {
            return HandlerResult::declined();
        }
        if event.author_id != Some(watched_id) {
            return HandlerResult::declined();
        }
        if event.text.is_none() {
            return HandlerResult::declined();
        }
        let (Some(thread_id), Some(parent_id)) = (event.thread_id, event.parent_id()) else {
            return HandlerResult::declined();
        };

        let notice = ctx.catalog.harassment_notice.clone();
        post_reply(ctx, thread_id, parent_id, &notice).await
    }
}

/// The general case: a summoned bot scores the parent comment and replies
/// with the result.
struct GeneralCase;

#[async_trait]
impl CaseHandler for GeneralCase {
    fn name(&self) -> &'static str {
        "general-case"
    }

    async fn attempt(&self, event: &InboundEvent, ctx: &ResponderContext) -> HandlerResult {
        let config = &ctx.config;
        let Some(text) = event.text.as_deref() else {
            return HandlerResult::declined();
        };
        let Some(parent_text) = event.parent_text() else {
            return HandlerResult::declined();
        };
        let explicit = explicit_summon(text, config);
        let implicit = implicit_summon(text, config);
        if !explicit && !implicit {
            return HandlerResult::declined();
        }
        let (Some(thread_id), Some(parent_id)) = (event.thread_id, event.parent_id()) else {
            return HandlerResult::declined();
        };

        let score = match ctx.scorer.score(parent_text, &config.score_language).await {
            Ok(score) => score,
            Err(error) => {
                warn!(%error, "toxicity scorer failed, treating score as absent");
                None
            }
        };

        // The moderator summon is a lower-confidence trigger: without an
        // explicit mention, stay quiet below the threshold. An absent score
        // counts as below it.
        if !explicit && !score.is_some_and(|value| value >= IMPLICIT_SUPPRESSION_THRESHOLD) {
            debug!(event_id = event.event_id, "implicit summon below threshold, reply suppressed");
            return HandlerResult::completed();
        }

        let reply = compose_reply(&ctx.catalog, ctx.random.as_ref(), score);
        post_reply(ctx, thread_id, parent_id, &reply).await
    }
}

async fn post_reply(
    ctx: &ResponderContext,
    thread_id: u64,
    parent_id: u64,
    text: &str,
) -> HandlerResult {
    match ctx.poster.post(thread_id, parent_id, text).await {
        Ok(()) => {
            info!(thread_id, parent_id, "reply posted");
            HandlerResult::completed()
        }
        Err(error) => {
            warn!(%error, thread_id, parent_id, "failed to post reply");
            HandlerResult::failed(error.to_string())
        }
    }
}

fn compose_reply(catalog: &MessageCatalog, random: &dyn RandomSource, score: Option<f64>) -> String {
    let mut reply = match score {
        Some(value) => catalog.render_report((value * 100.0).round() as i64),
        None => catalog.could_not_compute.clone(),
    };
    if score.is_some_and(|value| value > ESCALATION_THRESHOLD)
        && !catalog.escalation_remarks.is_empty()
    {
        let index = random.pick_index(catalog.escalation_remarks.len());
        if let Some(remark) = catalog.escalation_remark(index) {
            reply.push(' ');
            reply.push_str(remark);
        }
    }
    reply
}

fn mention_token(id: u64) -> String {
    format!("[@{id}|")
}

/// Explicit summon: the bot is named by its id-mention token or its literal
/// display name.
fn explicit_summon(text: &str, config: &ResponderConfig) -> bool {
    text.contains(&mention_token(config.bot_id))
        || (!config.bot_name.is_empty() && text.contains(&config.bot_name))
}

/// Implicit summon: the configured moderator is mentioned.
fn implicit_summon(text: &str, config: &ResponderConfig) -> bool {
    config
        .moderator_id
        .is_some_and(|id| text.contains(&mention_token(id)))
}

fn weekend_offset() -> FixedOffset {
    FixedOffset::east_opt(WEEKEND_UTC_OFFSET_SECONDS).expect("offset within bounds")
}

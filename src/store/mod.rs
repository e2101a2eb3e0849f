//! The feed store: authoritative in-memory state and the public surface.
//!
//! Every post and agent comment moves through the same lifecycle:
//!
//! ```text
//!          insert            replace             move to permanent
//!  None ──────────► Pending ─────────► Streaming ─────────────────► Complete
//!                      │                   │
//!                      └───────────────────┴──► Error (dropped, event only)
//! ```
//!
//! In-flight objects live in their own maps and are never visible in the
//! permanent list at the same time. Each transition happens under one short
//! lock and is announced on the [`EventBus`] after the lock is released.

mod state;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::join_all;
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chance::Chance;
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::events::{EventBus, FeedEvent, FeedListener, Subscription};
use crate::interaction::{CommentStream, InteractionEngine, PlannedInteraction};
use crate::persona::{PersonaRegistry, CURRENT_USER_ID};
use crate::provider::ProviderRegistry;
use crate::source::{fetch_all_kinds, sort_by_recency, ContentSource};
use crate::synth::PostSynthesizer;
use crate::trend::{select, TrendAnalyzer};
use crate::types::{
    Comment, ContentItem, Emoji, GenerationStatus, Locale, Post, PostAction, TrendAnalysis,
};

use state::FeedState;

/// Outcome of one load request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Another load was running; nothing happened.
    pub skipped: bool,
    pub requested: usize,
    /// Ids of posts that reached `Complete`, in completion order.
    pub committed: Vec<String>,
    pub failed: usize,
}

impl LoadReport {
    fn skipped(requested: usize) -> Self {
        Self {
            skipped: true,
            requested,
            ..Self::default()
        }
    }
}

/// Items fetched per kind for a load of `count` posts.
fn per_kind(count: usize) -> usize {
    count.div_ceil(4).max(1)
}

/// Start delay of the `i`-th generation in one load.
fn stagger(pacing: Duration, i: usize) -> Duration {
    pacing.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX))
}

pub struct FeedStore {
    config: FeedConfig,
    personas: Arc<PersonaRegistry>,
    source: Arc<dyn ContentSource>,
    synth: PostSynthesizer,
    engine: InteractionEngine,
    trend: TrendAnalyzer,
    selection_chance: Mutex<Box<dyn Chance>>,
    state: Mutex<FeedState>,
    bus: EventBus,
}

impl FeedStore {
    pub fn new(
        personas: Arc<PersonaRegistry>,
        providers: Arc<ProviderRegistry>,
        source: Arc<dyn ContentSource>,
    ) -> FeedResult<Self> {
        Self::with_config(FeedConfig::default(), personas, providers, source)
    }

    pub fn with_config(
        config: FeedConfig,
        personas: Arc<PersonaRegistry>,
        providers: Arc<ProviderRegistry>,
        source: Arc<dyn ContentSource>,
    ) -> FeedResult<Self> {
        config.validate()?;
        personas.get(&config.author_id)?;

        let (interaction_chance, selection_chance): (Box<dyn Chance>, Box<dyn Chance>) =
            match config.seed {
                Some(seed) => (
                    Box::new(StdRng::seed_from_u64(seed)),
                    Box::new(StdRng::seed_from_u64(seed.wrapping_add(1))),
                ),
                None => (
                    Box::new(StdRng::from_os_rng()),
                    Box::new(StdRng::from_os_rng()),
                ),
            };

        let synth = PostSynthesizer::new(personas.clone(), providers.clone())
            .with_author(config.author_id.clone())
            .with_options(config.post_options);
        let engine = InteractionEngine::new(personas.clone(), providers.clone())
            .with_chance(interaction_chance)
            .with_options(config.decision_options, config.comment_options)
            .with_pacing(config.interaction_pacing());
        let trend = TrendAnalyzer::new(source.clone(), providers)
            .with_model(config.trend_model.clone())
            .with_fetch_limit(config.trend_fetch_limit);

        Ok(Self {
            state: Mutex::new(FeedState::new(config.post_cap)),
            config,
            personas,
            source,
            synth,
            engine,
            trend,
            selection_chance: Mutex::new(selection_chance),
            bus: EventBus::new(),
        })
    }

    /// Source of the interaction gates' rolls.
    pub fn with_chance(mut self, chance: Box<dyn Chance>) -> Self {
        self.engine = self.engine.with_chance(chance);
        self
    }

    /// Source of the trend selector's top-up shuffle.
    pub fn with_selection_chance(mut self, chance: Box<dyn Chance>) -> Self {
        self.selection_chance = Mutex::new(chance);
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    pub fn subscribe(&self, listener: Arc<dyn FeedListener>) -> Subscription {
        self.bus.subscribe(listener)
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap()
    }

    fn emit(&self, event: FeedEvent) {
        self.bus.emit(&event);
    }

    // ─── Read side ──────────────────────────────────────────────────────────

    /// Permanent posts (oldest first), then posts still being generated.
    pub fn posts(&self) -> Vec<Post> {
        self.state().posts()
    }

    pub fn post(&self, post_id: &str) -> Option<Post> {
        self.state().post(post_id).cloned()
    }

    pub fn posts_by_tag(&self, tag: &str) -> Vec<Post> {
        self.posts().into_iter().filter(|p| p.has_tag(tag)).collect()
    }

    pub fn in_flight_comments(&self, post_id: &str) -> Vec<Comment> {
        self.state().in_flight_comments(post_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.state().in_flight_len()
    }

    /// Content items held back by the last trend-biased load.
    pub fn remaining_count(&self) -> usize {
        self.state().remaining_len()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    pub fn has_reacted(&self, post_id: &str, emoji: Emoji) -> bool {
        self.state().has_reacted(post_id, emoji)
    }

    pub fn trend_analysis(&self) -> Option<TrendAnalysis> {
        self.trend.cached()
    }

    pub fn is_trend_updating(&self) -> bool {
        self.trend.is_updating()
    }

    // ─── Loads ──────────────────────────────────────────────────────────────

    fn begin_load(&self, requested: usize) -> bool {
        if !self.state().try_begin_load() {
            debug!(requested, "load already in progress, skipping");
            return false;
        }
        self.emit(FeedEvent::LoadStarted { requested });
        true
    }

    fn end_load(&self, report: &LoadReport) {
        self.state().end_load();
        self.emit(FeedEvent::LoadFinished {
            committed: report.committed.len(),
            failed: report.failed,
        });
        info!(
            requested = report.requested,
            committed = report.committed.len(),
            failed = report.failed,
            "load finished"
        );
    }

    fn replace_feed(&self) {
        let removed = self.state().clear();
        self.emit(FeedEvent::PostsReplaced { count: removed });
    }

    /// Replace the feed with `count` posts narrating the freshest content.
    pub async fn load(&self, count: usize, locale: Locale) -> LoadReport {
        if !self.begin_load(count) {
            return LoadReport::skipped(count);
        }
        self.replace_feed();

        let mut items = fetch_all_kinds(self.source.as_ref(), per_kind(count)).await;
        sort_by_recency(&mut items);
        items.truncate(count);

        let report = self.generate_all(items, count, locale).await;
        self.end_load(&report);
        report
    }

    /// Replace the feed with posts picked by [`select`] for `analysis`,
    /// remembering the unpicked items for [`FeedStore::load_more`].
    pub async fn load_by_trend(
        &self,
        analysis: &TrendAnalysis,
        count: usize,
        locale: Locale,
    ) -> LoadReport {
        if !self.begin_load(count) {
            return LoadReport::skipped(count);
        }
        self.replace_feed();

        let limit = self.config.selection_fetch_limit.max(per_kind(count));
        let items = fetch_all_kinds(self.source.as_ref(), limit).await;
        let selection = {
            let mut chance = self.selection_chance.lock().unwrap();
            select(analysis, items, count, chance.as_mut())
        };
        debug!(
            selected = selection.selected.len(),
            remaining = selection.remaining.len(),
            "trend selection"
        );
        self.state().set_remaining(selection.remaining);

        let report = self.generate_all(selection.selected, count, locale).await;
        self.end_load(&report);
        report
    }

    /// Append up to `count` posts: remembered items first, then fresh content
    /// not yet narrated.
    pub async fn load_more(&self, count: usize, locale: Locale) -> LoadReport {
        if !self.begin_load(count) {
            return LoadReport::skipped(count);
        }

        let mut items = self.state().take_remaining(count);
        if items.len() < count {
            let limit = self.config.selection_fetch_limit.max(per_kind(count));
            let mut fresh = fetch_all_kinds(self.source.as_ref(), limit).await;
            sort_by_recency(&mut fresh);
            let needed = count - items.len();
            let picked: Vec<ContentItem> = {
                let state = self.state();
                fresh
                    .into_iter()
                    .filter(|item| !state.is_seen(&item.id) && !items.iter().any(|i| i.id == item.id))
                    .take(needed)
                    .collect()
            };
            items.extend(picked);
        }

        let report = self.generate_all(items, count, locale).await;
        self.end_load(&report);
        report
    }

    /// [`FeedStore::load`] with the configured `loadCount`.
    pub async fn refresh(&self, locale: Locale) -> LoadReport {
        self.load(self.config.load_count, locale).await
    }

    /// [`FeedStore::load_more`] with the configured `loadMoreCount`.
    pub async fn next_page(&self, locale: Locale) -> LoadReport {
        self.load_more(self.config.load_more_count, locale).await
    }

    /// Stream the trend analysis, forwarding raw tokens to `token_tx`.
    pub async fn refresh_trend(
        &self,
        locale: Locale,
        token_tx: mpsc::UnboundedSender<String>,
    ) -> TrendAnalysis {
        let analysis = self.trend.refresh(locale, token_tx).await;
        self.emit(FeedEvent::TrendUpdated {
            topics: analysis.topics.len(),
        });
        analysis
    }

    /// Non-streaming trend analysis; keeps the previous result on failure.
    pub async fn analyze_trend(&self, locale: Locale) -> TrendAnalysis {
        let analysis = self.trend.analyze(locale).await;
        self.emit(FeedEvent::TrendUpdated {
            topics: analysis.topics.len(),
        });
        analysis
    }

    /// Refresh the trend analysis, then load the feed around it.
    pub async fn refresh_trend_and_load(
        &self,
        count: usize,
        locale: Locale,
        token_tx: mpsc::UnboundedSender<String>,
    ) -> (TrendAnalysis, LoadReport) {
        let analysis = self.refresh_trend(locale, token_tx).await;
        let report = self.load_by_trend(&analysis, count, locale).await;
        (analysis, report)
    }

    async fn generate_all(&self, items: Vec<ContentItem>, requested: usize, locale: Locale) -> LoadReport {
        {
            let mut state = self.state();
            for item in &items {
                state.mark_seen(&item.id);
            }
        }

        let pacing = self.config.post_pacing();
        let runs = items.into_iter().enumerate().map(|(i, item)| async move {
            if !pacing.is_zero() && i > 0 {
                tokio::time::sleep(stagger(pacing, i)).await;
            }
            self.run_post(item, locale).await
        });
        let outcomes = join_all(runs).await;

        let mut report = LoadReport {
            requested,
            ..LoadReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Some(post_id) => report.committed.push(post_id),
                None => report.failed += 1,
            }
        }
        report
    }

    // ─── Post lifecycle ─────────────────────────────────────────────────────

    /// Drive one post through its lifecycle. Returns its id once committed.
    async fn run_post(&self, item: ContentItem, locale: Locale) -> Option<String> {
        let mut stream = self.synth.generate_streaming(&item, locale);
        let mut current: Option<String> = None;
        let mut finished: Option<Post> = None;

        while let Some(snapshot) = stream.next().await {
            let post = match snapshot {
                Ok(post) => post,
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "post generation failed");
                    if let Some(post_id) = current.take() {
                        self.state().discard(&post_id);
                        self.emit(FeedEvent::PostFailed {
                            post_id,
                            message: e.to_string(),
                        });
                    }
                    return None;
                }
            };

            match post.status {
                GenerationStatus::Pending => {
                    current = Some(post.id.clone());
                    let post_id = post.id.clone();
                    self.state().insert_in_flight(post);
                    self.emit(FeedEvent::PostProgress {
                        post_id,
                        status: GenerationStatus::Pending,
                    });
                }
                GenerationStatus::Streaming => {
                    let post_id = post.id.clone();
                    if self.state().update_in_flight(post) {
                        self.emit(FeedEvent::PostProgress {
                            post_id,
                            status: GenerationStatus::Streaming,
                        });
                    }
                }
                GenerationStatus::Complete => finished = Some(post),
                // The error itself follows as the next item.
                GenerationStatus::Error => {}
            }
        }

        let post = finished?;
        let post_id = post.id.clone();
        let evicted = self.state().commit(post.clone());
        self.emit(FeedEvent::PostCommitted {
            post_id: post_id.clone(),
        });
        if !evicted.is_empty() {
            self.emit(FeedEvent::PostsEvicted { post_ids: evicted });
        }
        debug!(post_id = %post_id, tags = ?post.tags, "post committed");

        if self.config.simulate_interactions {
            self.simulate_interactions(&post, locale).await;
        }
        Some(post_id)
    }

    /// Let the other personas react to a freshly committed post.
    async fn simulate_interactions(&self, post: &Post, locale: Locale) {
        let planned = self.engine.plan_interactions(post, locale).await;
        for plan in planned {
            self.apply_planned(post, plan, locale).await;
        }
    }

    async fn apply_planned(&self, post: &Post, plan: PlannedInteraction, locale: Locale) {
        let decision = plan.decision;

        if let Some(emoji) = decision.emoji {
            let count = {
                let mut state = self.state();
                match state.permanent_mut(&post.id) {
                    Ok(target) => {
                        target.reactions.increment(emoji);
                        Some(target.reactions.get(emoji))
                    }
                    Err(_) => None,
                }
            };
            let Some(count) = count else {
                debug!(post_id = %post.id, "post evicted before interactions applied");
                return;
            };
            self.emit(FeedEvent::Reacted {
                post_id: post.id.clone(),
                emoji,
                count,
            });
        }

        if decision.will_forward {
            let forwarded = self
                .state()
                .permanent_mut(&post.id)
                .map(|target| target.apply_action(PostAction::Forward))
                .is_ok();
            if forwarded {
                self.emit(FeedEvent::Interacted {
                    post_id: post.id.clone(),
                    action: PostAction::Forward,
                });
            }
        }

        if decision.will_comment {
            let Ok(persona) = self.personas.get(&plan.persona_id) else {
                return;
            };
            let stream = self.engine.stream_comment(persona, post, locale);
            if let Err(e) = self.run_comment(&post.id, stream).await {
                warn!(persona_id = %plan.persona_id, post_id = %post.id, error = %e, "agent comment failed");
            }
        }
    }

    // ─── Comment lifecycle ──────────────────────────────────────────────────

    /// Drive one comment through its lifecycle. `Ok(None)` when the persona
    /// declined or the post disappeared meanwhile.
    async fn run_comment(&self, post_id: &str, mut stream: CommentStream) -> FeedResult<Option<Comment>> {
        let mut current: Option<String> = None;
        let mut finished: Option<Comment> = None;

        while let Some(snapshot) = stream.next().await {
            let comment = match snapshot {
                Ok(comment) => comment,
                Err(e) => {
                    if let Some(comment_id) = current.take() {
                        self.state().discard_comment(post_id, &comment_id);
                        self.emit(FeedEvent::CommentFailed {
                            post_id: post_id.to_string(),
                            comment_id,
                            message: e.to_string(),
                        });
                    }
                    return Err(e);
                }
            };

            match comment.status {
                GenerationStatus::Pending => {
                    current = Some(comment.id.clone());
                    let comment_id = comment.id.clone();
                    self.state().insert_comment(post_id, comment);
                    self.emit(FeedEvent::CommentProgress {
                        post_id: post_id.to_string(),
                        comment_id,
                        status: GenerationStatus::Pending,
                    });
                }
                GenerationStatus::Streaming => {
                    let comment_id = comment.id.clone();
                    if self.state().update_comment(post_id, comment) {
                        self.emit(FeedEvent::CommentProgress {
                            post_id: post_id.to_string(),
                            comment_id,
                            status: GenerationStatus::Streaming,
                        });
                    }
                }
                GenerationStatus::Complete => finished = Some(comment),
                GenerationStatus::Error => {}
            }
        }

        let Some(comment) = finished else {
            if let Some(comment_id) = current {
                self.state().discard_comment(post_id, &comment_id);
                self.emit(FeedEvent::CommentWithdrawn {
                    post_id: post_id.to_string(),
                    comment_id,
                });
            }
            return Ok(None);
        };

        let comment_id = comment.id.clone();
        if self.state().commit_comment(post_id, comment.clone()).is_err() {
            self.emit(FeedEvent::CommentWithdrawn {
                post_id: post_id.to_string(),
                comment_id,
            });
            return Ok(None);
        }
        self.emit(FeedEvent::CommentCommitted {
            post_id: post_id.to_string(),
            comment_id,
        });
        Ok(Some(comment))
    }

    // ─── Human actions ──────────────────────────────────────────────────────

    /// Like, dislike or forward a post.
    pub fn interact(&self, post_id: &str, action: PostAction) -> FeedResult<Post> {
        let post = {
            let mut state = self.state();
            let post = state.permanent_mut(post_id)?;
            post.apply_action(action);
            post.clone()
        };
        self.emit(FeedEvent::Interacted {
            post_id: post_id.to_string(),
            action,
        });
        Ok(post)
    }

    /// Add the current user's `emoji`. Returns the new count.
    pub fn react(&self, post_id: &str, emoji: Emoji) -> FeedResult<u32> {
        let count = self.state().react(post_id, emoji)?;
        self.emit(FeedEvent::Reacted {
            post_id: post_id.to_string(),
            emoji,
            count,
        });
        Ok(count)
    }

    /// Withdraw the current user's `emoji`. A no-op returning the current
    /// count if they had not reacted with it.
    pub fn unreact(&self, post_id: &str, emoji: Emoji) -> FeedResult<u32> {
        let withdrawn = self.state().unreact(post_id, emoji)?;
        match withdrawn {
            Some(count) => {
                self.emit(FeedEvent::Reacted {
                    post_id: post_id.to_string(),
                    emoji,
                    count,
                });
                Ok(count)
            }
            None => {
                let count = self.state().permanent(post_id)?.reactions.get(emoji);
                Ok(count)
            }
        }
    }

    /// React if the current user has not yet, otherwise withdraw.
    /// Returns whether the reaction is now on.
    pub fn toggle_reaction(&self, post_id: &str, emoji: Emoji) -> FeedResult<bool> {
        if self.has_reacted(post_id, emoji) {
            self.unreact(post_id, emoji)?;
            Ok(false)
        } else {
            self.react(post_id, emoji)?;
            Ok(true)
        }
    }

    /// Append a comment by the current user.
    pub fn comment(&self, post_id: &str, text: &str) -> FeedResult<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FeedError::InvalidInput("comment text is empty".into()));
        }
        let comment = Comment::new(CURRENT_USER_ID, text);
        self.state()
            .permanent_mut(post_id)?
            .comments
            .push(comment.clone());
        self.emit(FeedEvent::CommentCommitted {
            post_id: post_id.to_string(),
            comment_id: comment.id.clone(),
        });
        Ok(comment)
    }

    /// Have `persona_id` reply to a post now, streaming through the comment
    /// lifecycle. `None` when the persona is not interested.
    pub async fn request_agent_reply(
        &self,
        post_id: &str,
        persona_id: &str,
        locale: Locale,
    ) -> FeedResult<Option<Comment>> {
        let post = self.state().permanent(post_id)?.clone();
        let persona = self.personas.get(persona_id)?;
        let stream = self.engine.stream_comment(persona, &post, locale);
        self.run_comment(post_id, stream).await
    }

    /// Ask every persona `@mentioned` in `text` to reply. A persona whose
    /// reply fails is logged and skipped.
    pub async fn reply_to_mentions(
        &self,
        post_id: &str,
        text: &str,
        locale: Locale,
    ) -> FeedResult<Vec<Comment>> {
        self.state().permanent(post_id)?;
        let mentioned: Vec<String> = self
            .personas
            .resolve_mentions(text)
            .into_iter()
            .map(|p| p.id.clone())
            .collect();

        let mut replies = Vec::new();
        for persona_id in mentioned {
            match self.request_agent_reply(post_id, &persona_id, locale).await {
                Ok(Some(comment)) => replies.push(comment),
                Ok(None) => {}
                Err(e) if e.is_not_found() => return Err(e),
                Err(e) => warn!(persona_id = %persona_id, post_id, error = %e, "mention reply failed"),
            }
        }
        Ok(replies)
    }
}

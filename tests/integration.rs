use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use feed_core::chance::FixedChance;
use feed_core::config::FeedConfig;
use feed_core::error::{FeedError, FeedResult};
use feed_core::events::{CallbackListener, FeedEvent, MemoryListener};
use feed_core::interaction::InteractionEngine;
use feed_core::persona::{Persona, PersonaRegistry, ResponseStyle};
use feed_core::provider::{tokenize, ProviderRegistry, ScriptedProvider, SimulatedProvider, TextProvider};
use feed_core::source::{ContentSource, MemorySource, SourceFuture};
use feed_core::store::FeedStore;
use feed_core::synth::extract_tags;
use feed_core::trend::select;
use feed_core::types::*;

// ─── Mock Provider ──────────────────────────────────────────────────────────

/// Echoes each prompt back, token by token, and counts calls.
struct EchoProvider {
    calls: AtomicUsize,
}

impl EchoProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn stream(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
        delta_tx: mpsc::UnboundedSender<String>,
    ) -> FeedResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for token in tokenize(prompt) {
            let _ = delta_tx.send(token);
            tokio::task::yield_now().await;
        }
        Ok(prompt.to_string())
    }
}

// ─── Mock Source ────────────────────────────────────────────────────────────

/// Source whose every fetch fails.
struct OfflineSource;

impl ContentSource for OfflineSource {
    fn fetch_latest(&self, kind: ContentKind, _limit: usize) -> SourceFuture<'_, Vec<ContentItem>> {
        Box::pin(async move { Err(FeedError::Source(format!("{kind} feed offline"))) })
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────────────

fn one_per_kind() -> MemorySource {
    MemorySource::with_items([
        ContentItem::new(ContentKind::Paper, "paper-1", "Scaling laws revisited")
            .with_description("We study #scaling behaviour"),
        ContentItem::new(ContentKind::Model, "model-1", "Tiny-LLM")
            .with_description("A #quantized chat model")
            .with_tags(["LLM"]),
        ContentItem::new(ContentKind::Dataset, "dataset-1", "street-scenes")
            .with_description("Dashcam frames for #segmentation"),
        ContentItem::new(ContentKind::Space, "space-1", "sketch-to-image")
            .with_description("Draw and #generate"),
    ])
}

fn persona(id: &str, frequency: f64) -> Persona {
    Persona {
        id: id.into(),
        name: id.to_uppercase(),
        handle: id.replace('-', "_"),
        avatar_url: String::new(),
        model: ModelKind::Gpt4o,
        description: String::new(),
        color: "#888888".into(),
        verified: false,
        interests: vec!["models".into()],
        interaction_frequency: frequency,
        opinionated: 0.5,
        response_style: ResponseStyle::Technical,
    }
}

fn registry(provider: Arc<dyn TextProvider>) -> Arc<ProviderRegistry> {
    Arc::new(ProviderRegistry::new(provider))
}

fn store(
    provider: Arc<dyn TextProvider>,
    source: Arc<dyn ContentSource>,
    config: FeedConfig,
) -> FeedStore {
    FeedStore::with_config(
        config,
        Arc::new(PersonaRegistry::default()),
        registry(provider),
        source,
    )
    .unwrap()
}

fn is_lifecycle(statuses: &[GenerationStatus]) -> bool {
    let Some((first, rest)) = statuses.split_first() else {
        return true;
    };
    if *first != GenerationStatus::Pending {
        return false;
    }
    match rest.split_last() {
        None => true,
        Some((last, middle)) => {
            middle.iter().all(|s| *s == GenerationStatus::Streaming)
                && matches!(
                    last,
                    GenerationStatus::Streaming | GenerationStatus::Complete | GenerationStatus::Error
                )
        }
    }
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_load_from_echo_provider() {
    let provider = Arc::new(EchoProvider::new());
    let store = store(
        provider.clone(),
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    );

    let report = store.load(4, Locale::En).await;

    assert_eq!(report.committed.len(), 4);
    assert_eq!(store.posts().len(), 4);
    assert_eq!(store.in_flight_count(), 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 4);

    let expected: HashSet<&str> = ["scaling", "quantized", "segmentation", "generate"].into();
    for post in store.posts() {
        assert_eq!(post.status, GenerationStatus::Complete);
        assert_eq!(post.tags, extract_tags(&post.text));
        assert!(expected.contains(post.tags[0].as_str()), "tags: {:?}", post.tags);
    }
}

#[tokio::test]
async fn scenario_trend_biased_load() {
    let store = store(
        Arc::new(ScriptedProvider::always("Worth a look")),
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    );
    let analysis = TrendAnalysis::new(vec![TrendTopic::new("LLM")]);

    let report = store.load_by_trend(&analysis, 1, Locale::En).await;

    assert_eq!(report.committed.len(), 1);
    assert_eq!(store.posts()[0].source_id.as_deref(), Some("model-1"));
    assert_eq!(store.remaining_count(), 3);

    // Same split straight from the selector.
    let items = vec![
        ContentItem::new(ContentKind::Model, "m", "x").with_tags(["LLM"]),
        ContentItem::new(ContentKind::Dataset, "d", "street-scenes"),
    ];
    let selection = select(&analysis, items, 1, &mut FixedChance(0.0));
    assert_eq!(selection.selected[0].id, "m");
    assert_eq!(selection.remaining[0].id, "d");
}

#[tokio::test]
async fn scenario_provider_failure_skips_one_persona() {
    let personas = PersonaRegistry::new(vec![
        persona("author", 0.5),
        persona("first", 1.0),
        persona("second", 1.0),
        persona("third", 1.0),
    ])
    .unwrap();
    let provider = Arc::new(ScriptedProvider::always("👍").fail_on_call(2));
    let engine = InteractionEngine::new(Arc::new(personas), registry(provider.clone()))
        .with_chance(Box::new(FixedChance(0.0)));
    let post = Post::new("author", "New model out today");

    let updated = engine.apply_interactions(&post, Locale::En).await;

    assert_eq!(provider.call_count(), 3);
    assert_eq!(updated.reactions.get(Emoji::ThumbsUp), 2);
    assert_eq!(updated.reactions.total(), 2);
    assert_eq!(updated.status, GenerationStatus::Complete);
    assert!(updated.comments.is_empty());
}

// ─── Properties ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_sequences_follow_lifecycle() {
    let provider = ScriptedProvider::always("👍 评论：是 转发：是 #AI rocks").fail_on_call(3);
    let store = store(
        Arc::new(provider),
        Arc::new(one_per_kind()),
        FeedConfig::default().with_seed(11),
    );
    let listener = Arc::new(MemoryListener::new());
    store.subscribe(listener.clone());

    store.load(4, Locale::Zh).await;

    let events = listener.events();
    let post_ids: HashSet<String> = events
        .iter()
        .filter_map(|e| e.post_id().map(str::to_string))
        .collect();
    assert!(!post_ids.is_empty());
    for id in &post_ids {
        let statuses = listener.post_statuses(id);
        assert!(is_lifecycle(&statuses), "{id}: {statuses:?}");
    }

    let mut comment_statuses: std::collections::HashMap<String, Vec<GenerationStatus>> =
        Default::default();
    for event in &events {
        match event {
            FeedEvent::CommentProgress { comment_id, status, .. } => {
                comment_statuses.entry(comment_id.clone()).or_default().push(*status)
            }
            FeedEvent::CommentCommitted { comment_id, .. } => comment_statuses
                .entry(comment_id.clone())
                .or_default()
                .push(GenerationStatus::Complete),
            FeedEvent::CommentFailed { comment_id, .. } => comment_statuses
                .entry(comment_id.clone())
                .or_default()
                .push(GenerationStatus::Error),
            _ => {}
        }
    }
    for (id, statuses) in comment_statuses {
        assert!(is_lifecycle(&statuses), "{id}: {statuses:?}");
    }
}

#[tokio::test]
async fn never_in_flight_and_permanent_at_once() {
    let store = Arc::new(store(
        Arc::new(EchoProvider::new()),
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    ));
    let violations = Arc::new(AtomicUsize::new(0));
    let checks = Arc::new(AtomicUsize::new(0));

    let weak = Arc::downgrade(&store);
    let (v, c) = (violations.clone(), checks.clone());
    store.subscribe(Arc::new(CallbackListener::new(move |_| {
        if let Some(store) = weak.upgrade() {
            let posts = store.posts();
            let ids: HashSet<_> = posts.iter().map(|p| p.id.clone()).collect();
            if ids.len() != posts.len() {
                v.fetch_add(1, Ordering::SeqCst);
            }
            c.fetch_add(1, Ordering::SeqCst);
        }
    })));

    store.load(4, Locale::En).await;

    assert!(checks.load(Ordering::SeqCst) > 8);
    assert_eq!(violations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cap_retains_most_recent_posts() {
    let source = MemorySource::new();
    for i in 0..12 {
        source.insert(ContentItem::new(ContentKind::ALL[i % 4], format!("item-{i}"), format!("Item {i}")));
    }
    let store = store(
        Arc::new(ScriptedProvider::always("post")),
        Arc::new(source),
        FeedConfig::default().without_interactions().with_post_cap(3),
    );
    let listener = Arc::new(MemoryListener::new());
    store.subscribe(listener.clone());

    store.load(4, Locale::En).await;
    assert!(store.posts().len() <= 3);
    store.load_more(2, Locale::En).await;
    assert_eq!(store.posts().len(), 3);

    let committed: Vec<String> = listener
        .events()
        .into_iter()
        .filter_map(|e| match e {
            FeedEvent::PostCommitted { post_id } => Some(post_id),
            _ => None,
        })
        .collect();
    let newest: Vec<String> = committed[committed.len() - 3..].to_vec();
    let kept: Vec<String> = store.posts().into_iter().map(|p| p.id).collect();
    assert_eq!(kept, newest);
}

#[tokio::test]
async fn concurrent_load_is_skipped() {
    let store = store(
        Arc::new(ScriptedProvider::always("a streamed post")),
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    );

    let (first, second) = tokio::join!(store.load(4, Locale::En), store.load(4, Locale::En));

    assert!(!first.skipped);
    assert!(second.skipped);
    assert!(second.committed.is_empty());
    assert_eq!(store.posts().len(), 4);
}

#[tokio::test]
async fn toggling_one_reaction_leaves_others() {
    let store = store(
        Arc::new(ScriptedProvider::always("post")),
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    );
    store.load(1, Locale::En).await;
    let id = store.posts()[0].id.clone();

    for emoji in Emoji::ALL {
        store.react(&id, emoji).unwrap();
    }
    assert!(!store.toggle_reaction(&id, Emoji::Smile).unwrap());

    let reactions = store.post(&id).unwrap().reactions;
    assert_eq!(reactions.get(Emoji::Smile), 0);
    for emoji in [Emoji::ThumbsUp, Emoji::Heart, Emoji::Eyes] {
        assert_eq!(reactions.get(emoji), 1);
    }
}

#[tokio::test]
async fn frequency_bounds_the_decision() {
    let personas = Arc::new(
        PersonaRegistry::new(vec![persona("author", 0.5), persona("never", 0.0), persona("always", 1.0)])
            .unwrap(),
    );
    let provider = Arc::new(ScriptedProvider::always("👍"));
    let engine = InteractionEngine::new(personas.clone(), registry(provider))
        .with_chance(Box::new(StdRng::seed_from_u64(3)));
    let post = Post::new("author", "hello");

    for _ in 0..20 {
        let never = engine
            .decide(personas.get("never").unwrap(), &post, Locale::En)
            .await
            .unwrap();
        assert!(never.is_none());
    }
    let always = engine
        .decide(personas.get("always").unwrap(), &post, Locale::En)
        .await
        .unwrap();
    assert_eq!(always.emoji, Some(Emoji::ThumbsUp));
    assert_eq!(always.probability, 0.9);
}

// ─── Trends ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trend_refresh_then_load() {
    let reply = r#"```json
{"topics": [{"name": "LLM", "count": 4, "popularity": 91, "relatedTags": ["chat"]}], "summary": "chatty"}
```"#;
    let provider = ScriptedProvider::new([reply]).with_fallback(feed_core::Script::Reply("post".into()));
    let store = store(
        Arc::new(provider),
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    );
    let listener = Arc::new(MemoryListener::new());
    store.subscribe(listener.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let (analysis, report) = store.refresh_trend_and_load(1, Locale::En, tx).await;

    assert_eq!(analysis.topics[0].name, "LLM");
    assert_eq!(store.trend_analysis(), Some(analysis));
    assert_eq!(report.committed.len(), 1);
    assert_eq!(store.posts()[0].source_id.as_deref(), Some("model-1"));

    let mut streamed = String::new();
    while let Ok(token) = rx.try_recv() {
        streamed.push_str(&token);
    }
    assert_eq!(streamed, reply);
    assert!(listener
        .events()
        .contains(&FeedEvent::TrendUpdated { topics: 1 }));
}

#[tokio::test]
async fn offline_everything_still_yields_trends() {
    let store = store(
        Arc::new(ScriptedProvider::new(Vec::<String>::new())),
        Arc::new(OfflineSource),
        FeedConfig::default(),
    );
    let (tx, _rx) = mpsc::unbounded_channel();

    let analysis = store.refresh_trend(Locale::Zh, tx).await;
    assert_eq!(analysis.topics.len(), 6);

    let report = store.load(4, Locale::Zh).await;
    assert!(!report.skipped);
    assert!(report.committed.is_empty());
    assert!(!store.is_loading());
}

// ─── Agents ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn interactions_land_on_committed_posts() {
    let store = store(
        Arc::new(ScriptedProvider::always("❤️ comment: yes forward: yes")),
        Arc::new(MemorySource::with_items([ContentItem::new(ContentKind::Model, "m", "M")])),
        FeedConfig::default(),
    )
    .with_chance(Box::new(FixedChance(0.0)));

    store.load(1, Locale::En).await;

    let posts = store.posts();
    let post = &posts[0];
    let others = store.personas().len() - 1;
    assert_eq!(post.reactions.get(Emoji::Heart) as usize, others);
    assert_eq!(post.forwards as usize, others);
    assert_eq!(post.comments.len(), others);
    assert!(post.comments.iter().all(|c| c.status == GenerationStatus::Complete));
    assert!(store.in_flight_comments(&post.id).is_empty());
}

#[tokio::test]
async fn mention_replies_are_streamed() {
    let store = store(
        Arc::new(ScriptedProvider::always("Great question")),
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    );
    store.load(1, Locale::En).await;
    let id = store.posts()[0].id.clone();

    store.comment(&id, "@deep_diver @policy_pundit thoughts?").unwrap();
    let replies = store
        .reply_to_mentions(&id, "@deep_diver @policy_pundit thoughts?", Locale::En)
        .await
        .unwrap();

    let authors: Vec<_> = replies.iter().map(|c| c.author_id.as_str()).collect();
    assert_eq!(authors, vec!["agent-2", "agent-6"]);
    assert_eq!(store.post(&id).unwrap().comments.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn simulated_provider_drives_the_store() {
    let provider: Arc<dyn TextProvider> = Arc::new(SimulatedProvider::new(ModelKind::Gpt4o));
    let store = store(
        provider,
        Arc::new(one_per_kind()),
        FeedConfig::default().without_interactions(),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(Arc::new(CallbackListener::new(move |event| {
        if let FeedEvent::PostProgress { status, .. } = event {
            sink.lock().unwrap().push(*status);
        }
    })));

    let report = store.load(2, Locale::En).await;

    assert_eq!(report.committed.len(), 2);
    let posts = store.posts();
    let post = &posts[0];
    assert!(post.text.starts_with("Hello world"));
    assert!(seen.lock().unwrap().contains(&GenerationStatus::Streaming));
}

//! Trend analysis: one summarization call over the latest content.

use std::sync::{Arc, LazyLock, Mutex};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use regex::Regex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{FeedError, FeedResult};
use crate::prompt;
use crate::provider::ProviderRegistry;
use crate::source::{fetch_all_kinds, ContentSource};
use crate::synth::{text_events, TextEvent};
use crate::types::{new_topic_id, GenerationOptions, Locale, ModelKind, TrendAnalysis, TrendTopic};

use super::fallback::fallback_analysis;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n?(.*?)\n?```").unwrap());
static BARE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```\n?(.*?)\n?```").unwrap());

/// Items fetched per kind for one analysis.
pub const TREND_FETCH_LIMIT: usize = 20;

pub fn default_stream_options() -> GenerationOptions {
    GenerationOptions::new(0.7).with_max_tokens(1500)
}

pub fn default_analyze_options() -> GenerationOptions {
    GenerationOptions::new(0.7).with_max_tokens(1000)
}

#[derive(Default)]
struct TrendState {
    cached: Option<TrendAnalysis>,
    last_updated: Option<DateTime<Utc>>,
    updating: bool,
}

pub struct TrendAnalyzer {
    source: Arc<dyn ContentSource>,
    providers: Arc<ProviderRegistry>,
    model: ModelKind,
    fetch_limit: usize,
    stream_options: GenerationOptions,
    analyze_options: GenerationOptions,
    state: Mutex<TrendState>,
}

impl TrendAnalyzer {
    pub fn new(source: Arc<dyn ContentSource>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            source,
            providers,
            model: ModelKind::Gpt4o,
            fetch_limit: TREND_FETCH_LIMIT,
            stream_options: default_stream_options(),
            analyze_options: default_analyze_options(),
            state: Mutex::new(TrendState::default()),
        }
    }

    /// Route analysis calls through `model` instead of GPT-4o.
    pub fn with_model(mut self, model: ModelKind) -> Self {
        self.model = model;
        self
    }

    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub fn with_options(mut self, stream: GenerationOptions, analyze: GenerationOptions) -> Self {
        self.stream_options = stream;
        self.analyze_options = analyze;
        self
    }

    pub fn cached(&self) -> Option<TrendAnalysis> {
        self.state.lock().unwrap().cached.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().last_updated
    }

    pub fn is_updating(&self) -> bool {
        self.state.lock().unwrap().updating
    }

    fn set_updating(&self, updating: bool) {
        self.state.lock().unwrap().updating = updating;
    }

    fn store(&self, analysis: &TrendAnalysis) {
        let mut state = self.state.lock().unwrap();
        state.cached = Some(analysis.clone());
        state.last_updated = Some(Utc::now());
    }

    async fn build_prompt(&self, locale: Locale) -> String {
        let items = fetch_all_kinds(self.source.as_ref(), self.fetch_limit).await;
        debug!(items = items.len(), "building trend prompt");
        let digest = prompt::trend_digest(&items, locale);
        prompt::trend_prompt(&digest, locale)
    }

    /// Stream a fresh analysis, forwarding raw tokens to `token_tx`.
    ///
    /// Always yields an analysis: provider or parse failures fall back to
    /// the built-in topic list. The result replaces the cached one.
    pub async fn refresh(
        &self,
        locale: Locale,
        token_tx: mpsc::UnboundedSender<String>,
    ) -> TrendAnalysis {
        self.set_updating(true);
        let prompt = self.build_prompt(locale).await;
        let provider = self.providers.get(&self.model);

        let mut text = String::new();
        let mut outcome: FeedResult<String> =
            Err(FeedError::Provider("analysis stream ended early".into()));
        let mut events = text_events(provider, prompt, self.stream_options);
        while let Some(event) = events.next().await {
            match event {
                TextEvent::Token(token) => {
                    text.push_str(&token);
                    let _ = token_tx.send(token);
                }
                TextEvent::Done(full) => outcome = Ok(full),
                TextEvent::Failed(e) => outcome = Err(e),
            }
        }

        let analysis = match outcome.and_then(|full| parse_analysis(&full)) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "trend analysis failed, using fallback topics");
                debug!(raw = %text, "unparsed analysis text");
                fallback_analysis(locale)
            }
        };

        self.store(&analysis);
        self.set_updating(false);
        info!(topics = analysis.topics.len(), "trend analysis refreshed");
        analysis
    }

    /// Non-streaming analysis. On failure keeps the cached analysis if
    /// there is one, otherwise returns (and caches) the fallback.
    pub async fn analyze(&self, locale: Locale) -> TrendAnalysis {
        self.set_updating(true);
        let prompt = self.build_prompt(locale).await;
        let provider = self.providers.get(&self.model);

        let result = provider
            .complete(&prompt, &self.analyze_options)
            .await
            .and_then(|text| parse_analysis(&text));

        let analysis = match result {
            Ok(analysis) => {
                self.store(&analysis);
                analysis
            }
            Err(e) => {
                warn!(error = %e, "trend analysis failed");
                match self.cached() {
                    Some(cached) => cached,
                    None => {
                        let fallback = fallback_analysis(locale);
                        self.store(&fallback);
                        fallback
                    }
                }
            }
        };

        self.set_updating(false);
        analysis
    }
}

/// Body of a fenced code block if there is one, otherwise the whole text.
fn unfence(text: &str) -> &str {
    let inner = JSON_FENCE
        .captures(text)
        .or_else(|| BARE_FENCE.captures(text))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("");
    if inner.is_empty() {
        text.trim()
    } else {
        inner
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_topic(value: &Value) -> Option<TrendTopic> {
    let name = string(value.get("name"))?;
    let related = value
        .get("relatedTags")
        .or_else(|| value.get("related_tags"))
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut topic = TrendTopic::new(name)
        .with_count(number(value.get("count")).map_or(0, |c| c.max(0.0).round() as u64))
        .with_popularity(number(value.get("popularity")).unwrap_or(0.0))
        .with_related_tags(related);
    topic.id = string(value.get("id")).unwrap_or_else(new_topic_id);
    topic.description = string(value.get("description"));
    Some(topic)
}

/// Parse a model's analysis reply.
///
/// Tolerates a fenced code wrapper, missing ids and timestamps, numbers
/// sent as strings and out-of-range popularity. A reply without a single
/// named topic is an error.
pub fn parse_analysis(text: &str) -> FeedResult<TrendAnalysis> {
    let json = unfence(text);
    let value: Value =
        serde_json::from_str(json).map_err(|e| FeedError::Parse(format!("trend JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| FeedError::Parse("trend JSON is not an object".into()))?;

    let topics: Vec<TrendTopic> = object
        .get("topics")
        .and_then(Value::as_array)
        .map(|topics| topics.iter().filter_map(parse_topic).collect())
        .unwrap_or_default();
    if topics.is_empty() {
        return Err(FeedError::Parse("trend JSON has no topics".into()));
    }

    let mut analysis = TrendAnalysis::new(topics);
    if let Some(ts) = string(object.get("timestamp")) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&ts) {
            analysis.timestamp = parsed.with_timezone(&Utc);
        }
    }
    analysis.summary = string(object.get("summary"));
    Ok(analysis)
}

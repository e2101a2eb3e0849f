use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Locale ─────────────────────────────────────────────────────────────────

/// Output language for prompts and the literal markers parsed out of replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    /// Map a language tag (`zh-CN`, `en-US`, ...) onto a locale.
    ///
    /// Anything that does not start with `zh` is treated as English.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_lowercase().starts_with("zh") {
            Locale::Zh
        } else {
            Locale::En
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ─── Content ────────────────────────────────────────────────────────────────

/// The four kinds of externally sourced content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Paper,
    Model,
    Dataset,
    Space,
}

impl ContentKind {
    /// Fixed iteration order used by loads and selection.
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Paper,
        ContentKind::Model,
        ContentKind::Dataset,
        ContentKind::Space,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Paper => "paper",
            ContentKind::Model => "model",
            ContentKind::Dataset => "dataset",
            ContentKind::Space => "space",
        }
    }

    /// Position in [`ContentKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            ContentKind::Paper => 0,
            ContentKind::Model => 1,
            ContentKind::Dataset => 2,
            ContentKind::Space => 3,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One externally sourced record eligible to become a post. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    /// Paper title, or model/dataset/space name.
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Publication date for papers, last modification for everything else.
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
}

impl ContentItem {
    pub fn new(kind: ContentKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            authors: Vec::new(),
            description: String::new(),
            tags: Vec::new(),
            updated_at: Utc::now(),
            url: String::new(),
            downloads: None,
            likes: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn with_downloads(mut self, downloads: u64) -> Self {
        self.downloads = Some(downloads);
        self
    }

    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = Some(likes);
        self
    }
}

/// Inclusive calendar-day range: `from` is widened to 00:00, `to` to the end of its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.from
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.to.date_naive().and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
            - Duration::milliseconds(1)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at <= self.end()
    }

    /// Whole days spanned, rounded up.
    pub fn days(&self) -> i64 {
        let span = self.end() - self.start();
        (span.num_milliseconds() + 86_399_999) / 86_400_000
    }
}

// ─── Generation Status ──────────────────────────────────────────────────────

/// Lifecycle of a generated post or comment.
///
/// `Pending → Streaming* → {Complete | Error}`; `Streaming` may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Pending,
    Streaming,
    Complete,
    Error,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Complete | GenerationStatus::Error)
    }

    /// Whether `next` may follow `self`.
    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        use GenerationStatus::*;
        match (self, next) {
            (Pending, Streaming | Complete | Error) => true,
            (Streaming, Streaming | Complete | Error) => true,
            _ => false,
        }
    }
}

// ─── Reactions ──────────────────────────────────────────────────────────────

/// The fixed set of reaction symbols, declared in parse priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Emoji {
    #[serde(rename = "👍")]
    ThumbsUp,
    #[serde(rename = "❤️")]
    Heart,
    #[serde(rename = "😄")]
    Smile,
    #[serde(rename = "👀")]
    Eyes,
}

impl Emoji {
    pub const ALL: [Emoji; 4] = [Emoji::ThumbsUp, Emoji::Heart, Emoji::Smile, Emoji::Eyes];

    pub fn symbol(&self) -> &'static str {
        match self {
            Emoji::ThumbsUp => "👍",
            Emoji::Heart => "❤️",
            Emoji::Smile => "😄",
            Emoji::Eyes => "👀",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Emoji> {
        Emoji::ALL.into_iter().find(|e| e.symbol() == symbol.trim())
    }
}

impl std::fmt::Display for Emoji {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Per-symbol reaction counts. Keys are exactly the four [`Emoji`] values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTally {
    #[serde(rename = "👍", default)]
    thumbs_up: u32,
    #[serde(rename = "❤️", default)]
    heart: u32,
    #[serde(rename = "😄", default)]
    smile: u32,
    #[serde(rename = "👀", default)]
    eyes: u32,
}

impl ReactionTally {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, emoji: Emoji) -> &mut u32 {
        match emoji {
            Emoji::ThumbsUp => &mut self.thumbs_up,
            Emoji::Heart => &mut self.heart,
            Emoji::Smile => &mut self.smile,
            Emoji::Eyes => &mut self.eyes,
        }
    }

    pub fn get(&self, emoji: Emoji) -> u32 {
        match emoji {
            Emoji::ThumbsUp => self.thumbs_up,
            Emoji::Heart => self.heart,
            Emoji::Smile => self.smile,
            Emoji::Eyes => self.eyes,
        }
    }

    pub fn increment(&mut self, emoji: Emoji) {
        *self.slot(emoji) += 1;
    }

    /// Decrement, saturating at zero.
    pub fn decrement(&mut self, emoji: Emoji) {
        let slot = self.slot(emoji);
        *slot = slot.saturating_sub(1);
    }

    pub fn total(&self) -> u32 {
        self.thumbs_up + self.heart + self.smile + self.eyes
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emoji, u32)> + '_ {
        Emoji::ALL.into_iter().map(move |e| (e, self.get(e)))
    }
}

// ─── Posts & Comments ───────────────────────────────────────────────────────

pub fn new_post_id() -> String {
    format!("post-{}", Uuid::new_v4())
}

pub fn new_comment_id() -> String {
    format!("comment-{}", Uuid::new_v4())
}

pub fn new_topic_id() -> String {
    format!("topic-{}", Uuid::new_v4())
}

/// A comment on a post, written by a persona or the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    pub status: GenerationStatus,
}

impl Comment {
    /// A finished comment, e.g. one typed by a human.
    pub fn new(author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: new_comment_id(),
            author_id: author_id.into(),
            text: text.into(),
            created_at: Utc::now(),
            likes: 0,
            dislikes: 0,
            status: GenerationStatus::Complete,
        }
    }

    /// An empty placeholder at the start of generation.
    pub fn pending(author_id: impl Into<String>) -> Self {
        Self {
            status: GenerationStatus::Pending,
            ..Self::new(author_id, "")
        }
    }
}

/// Human feed actions that bump a post counter directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostAction {
    Like,
    Dislike,
    Forward,
}

/// A feed post narrated by a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    /// Id of the [`ContentItem`] the post narrates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    #[serde(default)]
    pub forwards: u32,
    #[serde(default)]
    pub reactions: ReactionTally,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: GenerationStatus,
}

impl Post {
    pub fn new(author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: new_post_id(),
            author_id: author_id.into(),
            source_id: None,
            text: text.into(),
            created_at: Utc::now(),
            likes: 0,
            dislikes: 0,
            forwards: 0,
            reactions: ReactionTally::new(),
            comments: Vec::new(),
            tags: Vec::new(),
            status: GenerationStatus::Complete,
        }
    }

    pub fn pending(author_id: impl Into<String>, source_id: Option<String>) -> Self {
        Self {
            source_id,
            status: GenerationStatus::Pending,
            ..Self::new(author_id, "")
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn apply_action(&mut self, action: PostAction) {
        match action {
            PostAction::Like => self.likes += 1,
            PostAction::Dislike => self.dislikes += 1,
            PostAction::Forward => self.forwards += 1,
        }
    }
}

// ─── Trends ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendTopic {
    pub id: String,
    pub name: String,
    pub count: u64,
    /// 0–100.
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub related_tags: Vec<String>,
}

impl TrendTopic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_topic_id(),
            name: name.into(),
            count: 0,
            popularity: 0.0,
            description: None,
            related_tags: Vec::new(),
        }
    }

    pub fn with_related_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity.clamp(0.0, 100.0);
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ranked topic list, replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub timestamp: DateTime<Utc>,
    /// Descending popularity.
    pub topics: Vec<TrendTopic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl TrendAnalysis {
    pub fn new(topics: Vec<TrendTopic>) -> Self {
        let mut analysis = Self {
            timestamp: Utc::now(),
            topics,
            summary: None,
        };
        analysis.sort_topics();
        analysis
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn sort_topics(&mut self) {
        self.topics.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

// ─── Models & Generation Options ────────────────────────────────────────────

/// Backing model a persona speaks through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "GPT-4o")]
    Gpt4o,
    #[serde(rename = "Claude-3.5-Sonnet")]
    Claude35Sonnet,
    #[serde(rename = "DeepSeek")]
    DeepSeek,
    #[serde(rename = "Llama-3")]
    Llama3,
    #[serde(rename = "Gemini-Pro")]
    GeminiPro,
    #[serde(rename = "Mistral")]
    Mistral,
    Custom(String),
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Gpt4o => write!(f, "GPT-4o"),
            ModelKind::Claude35Sonnet => write!(f, "Claude-3.5-Sonnet"),
            ModelKind::DeepSeek => write!(f, "DeepSeek"),
            ModelKind::Llama3 => write!(f, "Llama-3"),
            ModelKind::GeminiPro => write!(f, "Gemini-Pro"),
            ModelKind::Mistral => write!(f, "Mistral"),
            ModelKind::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// Sampling parameters for one text-provider call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn locale_from_tag() {
        assert_eq!(Locale::from_tag("zh-CN"), Locale::Zh);
        assert_eq!(Locale::from_tag("ZH"), Locale::Zh);
        assert_eq!(Locale::from_tag("en-US"), Locale::En);
        assert_eq!(Locale::from_tag("fr"), Locale::En);
        assert_eq!(Locale::default(), Locale::Zh);
    }

    #[test]
    fn status_transitions() {
        use GenerationStatus::*;
        assert!(Pending.can_transition_to(Streaming));
        assert!(Pending.can_transition_to(Complete));
        assert!(Streaming.can_transition_to(Streaming));
        assert!(Streaming.can_transition_to(Error));
        assert!(!Complete.can_transition_to(Streaming));
        assert!(!Error.can_transition_to(Complete));
        assert!(!Streaming.can_transition_to(Pending));
        assert!(Complete.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn emoji_symbols_roundtrip() {
        for emoji in Emoji::ALL {
            assert_eq!(Emoji::from_symbol(emoji.symbol()), Some(emoji));
        }
        assert_eq!(Emoji::from_symbol("🔥"), None);
    }

    #[test]
    fn tally_keys_are_the_four_symbols() {
        let mut tally = ReactionTally::new();
        tally.increment(Emoji::Heart);
        let json = serde_json::to_value(tally).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        for emoji in Emoji::ALL {
            assert!(obj.contains_key(emoji.symbol()));
        }
        assert_eq!(obj["❤️"], 1);
    }

    #[test]
    fn tally_decrement_saturates() {
        let mut tally = ReactionTally::new();
        tally.decrement(Emoji::Eyes);
        assert_eq!(tally.get(Emoji::Eyes), 0);
        tally.increment(Emoji::Eyes);
        tally.increment(Emoji::Eyes);
        tally.decrement(Emoji::Eyes);
        assert_eq!(tally.get(Emoji::Eyes), 1);
        assert_eq!(tally.total(), 1);
    }

    #[test]
    fn post_actions_bump_counters() {
        let mut post = Post::new("agent-1", "hello");
        post.apply_action(PostAction::Like);
        post.apply_action(PostAction::Like);
        post.apply_action(PostAction::Forward);
        assert_eq!(post.likes, 2);
        assert_eq!(post.dislikes, 0);
        assert_eq!(post.forwards, 1);
    }

    #[test]
    fn pending_post_is_empty() {
        let post = Post::pending("agent-1", Some("paper-1".into()));
        assert_eq!(post.status, GenerationStatus::Pending);
        assert!(post.text.is_empty());
        assert!(post.id.starts_with("post-"));
        assert_eq!(post.source_id.as_deref(), Some("paper-1"));
    }

    #[test]
    fn date_range_is_inclusive_by_day() {
        let range = DateRange::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 3, 1, 0, 0).unwrap(),
        );
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap()));
        assert_eq!(range.days(), 3);
    }

    #[test]
    fn trend_topics_sorted_by_popularity() {
        let analysis = TrendAnalysis::new(vec![
            TrendTopic::new("b").with_popularity(40.0),
            TrendTopic::new("a").with_popularity(90.0),
            TrendTopic::new("c").with_popularity(140.0),
        ]);
        let names: Vec<_> = analysis.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(analysis.topics[0].popularity, 100.0);
    }

    #[test]
    fn trend_topic_uses_camel_case() {
        let topic = TrendTopic::new("LLM").with_related_tags(["NLP"]);
        let json = serde_json::to_value(&topic).unwrap();
        assert!(json.get("relatedTags").is_some());
    }

    #[test]
    fn model_kind_serializes_display_names() {
        let json = serde_json::to_string(&ModelKind::Claude35Sonnet).unwrap();
        assert_eq!(json, "\"Claude-3.5-Sonnet\"");
        assert_eq!(ModelKind::Gpt4o.to_string(), "GPT-4o");
    }
}

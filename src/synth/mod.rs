//! Post synthesis: one content item in, one narrated post out.
//!
//! [`PostSynthesizer::generate`] makes a single atomic provider call.
//! [`PostSynthesizer::generate_streaming`] returns a snapshot stream instead:
//!
//! ```text
//! Pending ──► Streaming (per token, cumulative text) ──► Complete
//!    │                     │
//!    └─────────────────────┴──► Error, then Err(e) as the final item
//! ```
//!
//! Each snapshot is a full [`Post`] clone, so a consumer can simply replace
//! whatever it holds for that post id.

pub mod stream;
pub mod tags;

pub use stream::{text_events, TextEvent};
pub use tags::{extract_tags, KEYWORDS};

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use crate::error::{FeedError, FeedResult};
use crate::persona::{PersonaRegistry, DEFAULT_AUTHOR_ID};
use crate::prompt;
use crate::provider::{ProviderRegistry, TextProvider};
use crate::types::{ContentItem, GenerationOptions, GenerationStatus, Locale, Post};

/// Lazily evaluated sequence of post snapshots. Consume once.
pub type PostStream = BoxStream<'static, FeedResult<Post>>;

pub fn default_post_options() -> GenerationOptions {
    GenerationOptions::new(0.7).with_max_tokens(300)
}

pub struct PostSynthesizer {
    personas: Arc<PersonaRegistry>,
    providers: Arc<ProviderRegistry>,
    author_id: String,
    options: GenerationOptions,
}

impl PostSynthesizer {
    pub fn new(personas: Arc<PersonaRegistry>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            personas,
            providers,
            author_id: DEFAULT_AUTHOR_ID.into(),
            options: default_post_options(),
        }
    }

    /// Narrate items as `author_id` instead of the default author.
    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = author_id.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    /// Provider, prompt and empty pending post for `item`.
    fn prepare(
        &self,
        item: &ContentItem,
        locale: Locale,
    ) -> FeedResult<(Arc<dyn TextProvider>, String, Post)> {
        let author = self.personas.get(&self.author_id)?;
        let provider = self.providers.get(&author.model);
        let content = prompt::item_content(item, locale);
        let prompt = prompt::post_prompt(&author.name, &content, locale);
        let post = Post::pending(author.id.clone(), Some(item.id.clone()));
        Ok((provider, prompt, post))
    }

    /// Generate a finished post with one non-streaming call.
    pub async fn generate(&self, item: &ContentItem, locale: Locale) -> FeedResult<Post> {
        let (provider, prompt, mut post) = self.prepare(item, locale)?;
        debug!(item_id = %item.id, kind = %item.kind, provider = provider.name(), "generating post");

        let text = provider.complete(&prompt, &self.options).await?;
        post.tags = extract_tags(&text);
        post.text = text;
        post.status = GenerationStatus::Complete;
        Ok(post)
    }

    /// Stream snapshots of the post as it is generated.
    ///
    /// Lookup failures (unknown author) surface as the stream's only item.
    pub fn generate_streaming(&self, item: &ContentItem, locale: Locale) -> PostStream {
        let prepared = self.prepare(item, locale);
        let options = self.options;
        let item_id = item.id.clone();

        Box::pin(async_stream::stream! {
            let (provider, prompt, mut post) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            debug!(item_id = %item_id, post_id = %post.id, provider = provider.name(), "streaming post");
            yield Ok(post.clone());

            let mut events = text_events(provider, prompt, options);
            while let Some(event) = events.next().await {
                match event {
                    TextEvent::Token(token) => {
                        post.text.push_str(&token);
                        post.tags = extract_tags(&post.text);
                        post.status = GenerationStatus::Streaming;
                        yield Ok(post.clone());
                    }
                    TextEvent::Done(text) => {
                        post.tags = extract_tags(&text);
                        post.text = text;
                        post.status = GenerationStatus::Complete;
                        yield Ok(post.clone());
                    }
                    TextEvent::Failed(e) => {
                        post.status = GenerationStatus::Error;
                        yield Ok(post.clone());
                        yield Err(e);
                    }
                }
            }
        })
    }
}

/// Drain a post stream and return the finalized post.
pub async fn finish(mut stream: PostStream) -> FeedResult<Post> {
    let mut last = None;
    while let Some(snapshot) = stream.next().await {
        let post = snapshot?;
        if post.status == GenerationStatus::Complete {
            last = Some(post);
        }
    }
    last.ok_or_else(|| FeedError::Provider("post stream ended before completion".into()))
}

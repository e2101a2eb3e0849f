//! Streamed comment generation.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::FeedResult;
use crate::provider::TextProvider;
use crate::synth::{text_events, TextEvent};
use crate::types::{Comment, GenerationOptions, GenerationStatus};

use super::parse::{is_not_interested, may_become_not_interested};

/// Snapshot stream for one comment. Consume once.
///
/// Same lifecycle as a post stream, with one addition: a reply that turns
/// out to be the "not interested" sentinel ends the stream with no
/// `Complete` snapshot. Snapshots are withheld while the text could still
/// become the sentinel.
pub type CommentStream = BoxStream<'static, FeedResult<Comment>>;

pub fn default_comment_options() -> GenerationOptions {
    GenerationOptions::new(0.8).with_max_tokens(200)
}

pub(crate) fn comment_stream(
    provider: Arc<dyn TextProvider>,
    prompt: String,
    options: GenerationOptions,
    author_id: String,
) -> CommentStream {
    Box::pin(async_stream::stream! {
        let mut comment = Comment::pending(author_id);
        yield Ok(comment.clone());

        let mut raw = String::new();
        let mut events = text_events(provider, prompt, options);
        while let Some(event) = events.next().await {
            match event {
                TextEvent::Token(token) => {
                    raw.push_str(&token);
                    if may_become_not_interested(&raw) {
                        continue;
                    }
                    comment.text = raw.trim().to_string();
                    comment.status = GenerationStatus::Streaming;
                    yield Ok(comment.clone());
                }
                TextEvent::Done(text) => {
                    if is_not_interested(&text) {
                        return;
                    }
                    comment.text = text.trim().to_string();
                    comment.status = GenerationStatus::Complete;
                    yield Ok(comment.clone());
                }
                TextEvent::Failed(e) => {
                    comment.status = GenerationStatus::Error;
                    yield Ok(comment.clone());
                    yield Err(e);
                }
            }
        }
    })
}

/// Drain a comment stream. `Ok(None)` when the persona declined.
pub async fn finish_comment(mut stream: CommentStream) -> FeedResult<Option<Comment>> {
    let mut last = None;
    while let Some(snapshot) = stream.next().await {
        let comment = snapshot?;
        if comment.status == GenerationStatus::Complete {
            last = Some(comment);
        }
    }
    Ok(last)
}

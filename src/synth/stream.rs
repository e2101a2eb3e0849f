//! Bridge from a provider's token channel to a pull-based stream.

use std::sync::Arc;

use futures::stream::BoxStream;
use tokio::sync::mpsc;

use crate::error::FeedError;
use crate::provider::TextProvider;
use crate::types::GenerationOptions;

/// One step of a streamed provider call.
#[derive(Debug)]
pub enum TextEvent {
    Token(String),
    /// Full text as reported by the provider.
    Done(String),
    Failed(FeedError),
}

enum Step {
    Token(String),
    Finished(Result<String, FeedError>),
}

/// Run `provider.stream` and surface its tokens as they arrive.
///
/// Ends with exactly one `Done` or `Failed`. Tokens sent before a failure are
/// still delivered first.
pub fn text_events(
    provider: Arc<dyn TextProvider>,
    prompt: String,
    options: GenerationOptions,
) -> BoxStream<'static, TextEvent> {
    Box::pin(async_stream::stream! {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut call = provider.stream(&prompt, &options, tx);

        let result = loop {
            let step = tokio::select! {
                biased;
                Some(token) = rx.recv() => Step::Token(token),
                result = &mut call => Step::Finished(result),
            };
            match step {
                Step::Token(token) => yield TextEvent::Token(token),
                Step::Finished(result) => break result,
            }
        };

        while let Ok(token) = rx.try_recv() {
            yield TextEvent::Token(token);
        }

        match result {
            Ok(text) => yield TextEvent::Done(text),
            Err(e) => yield TextEvent::Failed(e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Script, ScriptedProvider};
    use futures::StreamExt;

    #[tokio::test]
    async fn tokens_then_done() {
        let provider = Arc::new(ScriptedProvider::new(["a b c"]));
        let events: Vec<_> = text_events(provider, "p".into(), GenerationOptions::new(0.7))
            .collect()
            .await;
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], TextEvent::Token(t) if t == "a "));
        assert!(matches!(&events[3], TextEvent::Done(t) if t == "a b c"));
    }

    #[tokio::test]
    async fn tokens_then_failure() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()).then(
            Script::Partial {
                text: "one two three".into(),
                tokens: 1,
            },
        ));
        let events: Vec<_> = text_events(provider, "p".into(), GenerationOptions::new(0.7))
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], TextEvent::Token(t) if t == "one "));
        assert!(matches!(&events[1], TextEvent::Failed(FeedError::Provider(_))));
    }
}

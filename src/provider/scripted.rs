use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::error::{FeedError, FeedResult};
use crate::types::GenerationOptions;

use super::traits::TextProvider;

/// Split text into whitespace-terminated tokens; concatenating them restores the text.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

/// One scripted provider turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Script {
    Reply(String),
    /// Reply with the prompt itself.
    Echo,
    Fail(String),
    /// Stream the first `tokens` tokens of `text`, then fail.
    Partial { text: String, tokens: usize },
}

/// Provider that plays back canned turns, for tests and offline runs.
///
/// Turns are consumed in order; once the queue is empty every call plays
/// the fallback. Calls listed via [`ScriptedProvider::fail_on_call`] fail
/// without consuming a turn.
pub struct ScriptedProvider {
    name: String,
    scripts: Mutex<VecDeque<Script>>,
    fallback: Script,
    fail_on: HashSet<usize>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "scripted".into(),
            scripts: Mutex::new(replies.into_iter().map(|r| Script::Reply(r.into())).collect()),
            fallback: Script::Fail("no more scripted replies".into()),
            fail_on: HashSet::new(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Echo every prompt back.
    pub fn echo() -> Self {
        Self::new(Vec::<String>::new()).with_fallback(Script::Echo)
    }

    /// Answer every call with the same reply.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new(Vec::<String>::new()).with_fallback(Script::Reply(reply.into()))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_fallback(mut self, script: Script) -> Self {
        self.fallback = script;
        self
    }

    pub fn then(self, script: Script) -> Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    /// Make the `n`th call (1-based) fail.
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on.insert(n);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    async fn send_tokens(text: &str, limit: usize, delta_tx: &mpsc::UnboundedSender<String>) {
        for token in tokenize(text).into_iter().take(limit) {
            let _ = delta_tx.send(token);
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait::async_trait]
impl TextProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
        delta_tx: mpsc::UnboundedSender<String>,
    ) -> FeedResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.fail_on.contains(&call) {
            return Err(FeedError::Provider(format!(
                "{}: scripted failure on call {call}",
                self.name
            )));
        }

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match script {
            Script::Reply(text) => {
                Self::send_tokens(&text, usize::MAX, &delta_tx).await;
                Ok(text)
            }
            Script::Echo => {
                Self::send_tokens(prompt, usize::MAX, &delta_tx).await;
                Ok(prompt.to_string())
            }
            Script::Fail(message) => Err(FeedError::Provider(message)),
            Script::Partial { text, tokens } => {
                Self::send_tokens(&text, tokens, &delta_tx).await;
                Err(FeedError::Provider(format!(
                    "{}: stream interrupted after {tokens} tokens",
                    self.name
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> GenerationOptions {
        GenerationOptions::new(0.7)
    }

    #[test]
    fn tokenize_preserves_text() {
        let tokens = tokenize("hello  world\nagain");
        assert_eq!(tokens.concat(), "hello  world\nagain");
        assert_eq!(tokens[0], "hello ");
    }

    #[tokio::test]
    async fn replies_in_order_then_fallback() {
        let provider = ScriptedProvider::new(["one", "two"]);
        assert_eq!(provider.complete("p", &opts()).await.unwrap(), "one");
        assert_eq!(provider.complete("p", &opts()).await.unwrap(), "two");
        assert!(provider.complete("p", &opts()).await.is_err());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn echo_streams_prompt_tokens() {
        let provider = ScriptedProvider::echo();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let text = provider.stream("a b c", &opts(), tx).await.unwrap();
        assert_eq!(text, "a b c");
        let mut streamed = String::new();
        while let Ok(token) = rx.try_recv() {
            streamed.push_str(&token);
        }
        assert_eq!(streamed, "a b c");
        assert_eq!(provider.prompts(), vec!["a b c".to_string()]);
    }

    #[tokio::test]
    async fn fail_on_call_skips_queue() {
        let provider = ScriptedProvider::new(["first", "second"]).fail_on_call(1);
        assert!(provider.complete("p", &opts()).await.is_err());
        assert_eq!(provider.complete("p", &opts()).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn partial_sends_some_tokens_then_fails() {
        let provider = ScriptedProvider::new(Vec::<String>::new()).then(Script::Partial {
            text: "one two three".into(),
            tokens: 2,
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = provider.stream("p", &opts(), tx).await;
        assert!(matches!(result, Err(FeedError::Provider(_))));
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}

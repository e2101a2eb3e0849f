use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::FeedResult;
use crate::types::{GenerationOptions, ModelKind};

use super::traits::TextProvider;

/// Offline stand-in for a real model: fixed canned text, paced like a live stream.
pub struct SimulatedProvider {
    model: ModelKind,
    name: String,
    token_delay: Duration,
    response_delay: Duration,
}

impl SimulatedProvider {
    pub fn new(model: ModelKind) -> Self {
        Self {
            name: format!("simulated:{model}"),
            model,
            token_delay: Duration::from_millis(300),
            response_delay: Duration::from_millis(1000),
        }
    }

    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    fn words(&self) -> Vec<String> {
        let model = self.model.to_string();
        [
            "Hello",
            "world",
            "this",
            "is",
            "a",
            "simulated",
            "streaming",
            "response",
            "from",
            model.as_str(),
            "model",
        ]
        .iter()
        .map(|w| w.to_string())
        .collect()
    }
}

#[async_trait::async_trait]
impl TextProvider for SimulatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
        delta_tx: mpsc::UnboundedSender<String>,
    ) -> FeedResult<String> {
        let words = self.words();
        let last = words.len() - 1;
        let mut text = String::new();
        for (i, word) in words.into_iter().enumerate() {
            tokio::time::sleep(self.token_delay).await;
            let token = if i < last { format!("{word} ") } else { word };
            text.push_str(&token);
            let _ = delta_tx.send(token);
        }
        Ok(text)
    }

    async fn complete(&self, _prompt: &str, _options: &GenerationOptions) -> FeedResult<String> {
        tokio::time::sleep(self.response_delay).await;
        Ok(format!("This is a simulated response from {} model.", self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn streams_words_with_model_name() {
        let provider = SimulatedProvider::new(ModelKind::DeepSeek);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let text = provider
            .stream("ignored", &GenerationOptions::new(0.7), tx)
            .await
            .unwrap();
        assert_eq!(
            text,
            "Hello world this is a simulated streaming response from DeepSeek model"
        );
        let mut tokens = 0;
        while rx.try_recv().is_ok() {
            tokens += 1;
        }
        assert_eq!(tokens, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn complete_is_canned() {
        let provider = SimulatedProvider::new(ModelKind::Gpt4o);
        let text = provider
            .complete("ignored", &GenerationOptions::new(0.7))
            .await
            .unwrap();
        assert_eq!(text, "This is a simulated response from GPT-4o model.");
    }
}

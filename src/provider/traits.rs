use tokio::sync::mpsc;

use crate::error::FeedResult;
use crate::types::GenerationOptions;

/// Text-generation backend used for posts, comments, decisions and trend analysis
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name, used in logs
    fn name(&self) -> &str;

    /// Stream a completion, sending each token through the channel.
    ///
    /// Returns the full text once the provider signals completion. A failure
    /// may arrive after some tokens were already sent.
    async fn stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        delta_tx: mpsc::UnboundedSender<String>,
    ) -> FeedResult<String>;

    /// Non-streaming completion (convenience, default impl collects stream)
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> FeedResult<String> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let text = self.stream(prompt, options, tx).await?;
        // Drain any remaining deltas
        while rx.try_recv().is_ok() {}
        Ok(text)
    }
}

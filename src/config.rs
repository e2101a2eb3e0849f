//! Store configuration, loadable from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, FeedResult};
use crate::interaction::{default_comment_options, default_decision_options};
use crate::persona::DEFAULT_AUTHOR_ID;
use crate::synth::default_post_options;
use crate::trend::TREND_FETCH_LIMIT;
use crate::types::{GenerationOptions, ModelKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Permanent posts kept; the oldest are evicted beyond this.
    #[serde(default = "default_post_cap")]
    pub post_cap: usize,
    /// Posts requested by a plain refresh.
    #[serde(default = "default_load_count")]
    pub load_count: usize,
    /// Posts requested by "load more".
    #[serde(default = "default_load_more_count")]
    pub load_more_count: usize,
    /// Items fetched per kind when sourcing a trend-biased load.
    #[serde(default = "default_selection_fetch_limit")]
    pub selection_fetch_limit: usize,
    /// Items fetched per kind for trend analysis.
    #[serde(default = "default_trend_fetch_limit")]
    pub trend_fetch_limit: usize,
    /// Stagger between post generations started by one load.
    #[serde(default)]
    pub post_pacing_ms: u64,
    /// Delay between personas while simulating interactions.
    #[serde(default)]
    pub interaction_pacing_ms: u64,
    #[serde(default = "default_author")]
    pub author_id: String,
    #[serde(default = "default_trend_model")]
    pub trend_model: ModelKind,
    #[serde(default = "default_post_options")]
    pub post_options: GenerationOptions,
    #[serde(default = "default_decision_options")]
    pub decision_options: GenerationOptions,
    #[serde(default = "default_comment_options")]
    pub comment_options: GenerationOptions,
    /// Simulate agent interactions once a post completes.
    #[serde(default = "default_true")]
    pub simulate_interactions: bool,
    /// Seed for every random draw; entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_post_cap() -> usize {
    100
}

fn default_load_count() -> usize {
    10
}

fn default_load_more_count() -> usize {
    5
}

fn default_selection_fetch_limit() -> usize {
    10
}

fn default_trend_fetch_limit() -> usize {
    TREND_FETCH_LIMIT
}

fn default_author() -> String {
    DEFAULT_AUTHOR_ID.to_string()
}

fn default_trend_model() -> ModelKind {
    ModelKind::Gpt4o
}

fn default_true() -> bool {
    true
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            post_cap: default_post_cap(),
            load_count: default_load_count(),
            load_more_count: default_load_more_count(),
            selection_fetch_limit: default_selection_fetch_limit(),
            trend_fetch_limit: default_trend_fetch_limit(),
            post_pacing_ms: 0,
            interaction_pacing_ms: 0,
            author_id: default_author(),
            trend_model: default_trend_model(),
            post_options: default_post_options(),
            decision_options: default_decision_options(),
            comment_options: default_comment_options(),
            simulate_interactions: true,
            seed: None,
        }
    }
}

impl FeedConfig {
    pub fn from_json(json: &str) -> FeedResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> FeedResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> FeedResult<()> {
        if self.post_cap == 0 {
            return Err(FeedError::Config("postCap must be at least 1".into()));
        }
        if self.author_id.trim().is_empty() {
            return Err(FeedError::Config("authorId must not be empty".into()));
        }
        Ok(())
    }

    pub fn post_pacing(&self) -> Duration {
        Duration::from_millis(self.post_pacing_ms)
    }

    pub fn interaction_pacing(&self) -> Duration {
        Duration::from_millis(self.interaction_pacing_ms)
    }

    pub fn with_post_cap(mut self, cap: usize) -> Self {
        self.post_cap = cap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_pacing(mut self, post: Duration, interaction: Duration) -> Self {
        self.post_pacing_ms = u64::try_from(post.as_millis()).unwrap_or(u64::MAX);
        self.interaction_pacing_ms = u64::try_from(interaction.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn without_interactions(mut self) -> Self {
        self.simulate_interactions = false;
        self
    }
}

//! # feed-core
//!
//! Persona-driven synthetic social feed. Synthetic authors narrate freshly
//! published papers, models, datasets and spaces as posts that stream in
//! token by token, while the other personas react, comment and forward on
//! their own. A trend analyzer ranks what is hot and biases which items get
//! narrated next.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use feed_core::{
//!     FeedStore, Locale, MemoryListener, MemorySource, PersonaRegistry, ProviderRegistry,
//!     SimulatedProvider, ModelKind, TextProvider,
//! };
//!
//! # async fn run() -> feed_core::FeedResult<()> {
//! let provider: Arc<dyn TextProvider> = Arc::new(SimulatedProvider::new(ModelKind::Gpt4o));
//! let store = FeedStore::new(
//!     Arc::new(PersonaRegistry::default()),
//!     Arc::new(ProviderRegistry::new(provider)),
//!     Arc::new(MemorySource::new()),
//! )?;
//!
//! let events = Arc::new(MemoryListener::new());
//! store.subscribe(events.clone());
//!
//! let report = store.load(10, Locale::En).await;
//! println!("{} posts, {} events", report.committed.len(), events.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Data model: `ContentItem`, `Post`, `Comment`, `Emoji`, `TrendAnalysis`, `Locale` |
//! | [`persona`] | Read-only roster of synthetic authors and their personality blocks |
//! | [`provider`] | `TextProvider` seam, per-model registry, scripted and simulated providers |
//! | [`source`] | `ContentSource` seam with in-memory and Hugging Face implementations |
//! | [`prompt`] | Locale-aware prompt templates |
//! | [`synth`] | Post synthesis, atomic or as a snapshot stream, plus tag extraction |
//! | [`interaction`] | Two-gate interaction decisions and comment generation |
//! | [`trend`] | Trend analysis with fallback topics and trend-biased content selection |
//! | [`store`] | `FeedStore`: the in-memory state machine and public surface |
//! | [`events`] | `FeedEvent` bus and listeners |
//! | [`chance`] | Injected randomness |
//! | [`config`] | `FeedConfig`, loadable from JSON |
//! | [`error`] | `FeedError` with thiserror |

pub mod chance;
pub mod config;
pub mod error;
pub mod events;
pub mod interaction;
pub mod persona;
pub mod prompt;
pub mod provider;
pub mod source;
pub mod store;
pub mod synth;
pub mod trend;
pub mod types;

pub use chance::{Chance, FixedChance, ScriptedChance};
pub use config::FeedConfig;
pub use error::{FeedError, FeedResult};
pub use events::{CallbackListener, EventBus, FeedEvent, FeedListener, MemoryListener, Subscription};
pub use interaction::{InteractionDecision, InteractionEngine, PlannedInteraction};
pub use persona::{Persona, PersonaRegistry, ResponseStyle};
pub use provider::{ProviderRegistry, Script, ScriptedProvider, SimulatedProvider, TextProvider};
#[cfg(feature = "huggingface")]
pub use source::HfSource;
pub use source::{ContentSource, MemorySource};
pub use store::{FeedStore, LoadReport};
pub use synth::{PostStream, PostSynthesizer};
pub use trend::{Selection, TrendAnalyzer};
pub use types::*;

//! Feed events, the change-notification pipeline of the store.
//!
//! Every committed mutation in [`FeedStore`](crate::store::FeedStore) emits
//! one [`FeedEvent`] which is dispatched synchronously to every subscribed
//! listener, after the mutation is fully applied.
//!
//! ```text
//! FeedStore mutation (lock held, state updated, lock released)
//!           │
//!           ▼
//!      EventBus::emit(event)
//!           │
//!      ┌────┼────┐
//!      ▼    ▼    ▼
//!   UI   Memory Callback
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::types::{Emoji, GenerationStatus, PostAction};

/// A committed change to feed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    LoadStarted {
        requested: usize,
    },
    LoadFinished {
        committed: usize,
        failed: usize,
    },
    /// A post entered or advanced through the in-flight map.
    PostProgress {
        post_id: String,
        status: GenerationStatus,
    },
    PostCommitted {
        post_id: String,
    },
    PostFailed {
        post_id: String,
        message: String,
    },
    PostsEvicted {
        post_ids: Vec<String>,
    },
    PostsReplaced {
        count: usize,
    },
    CommentProgress {
        post_id: String,
        comment_id: String,
        status: GenerationStatus,
    },
    CommentCommitted {
        post_id: String,
        comment_id: String,
    },
    CommentFailed {
        post_id: String,
        comment_id: String,
        message: String,
    },
    /// The persona declined to comment; the placeholder was withdrawn.
    CommentWithdrawn {
        post_id: String,
        comment_id: String,
    },
    Reacted {
        post_id: String,
        emoji: Emoji,
        count: u32,
    },
    Interacted {
        post_id: String,
        action: PostAction,
    },
    TrendUpdated {
        topics: usize,
    },
}

impl FeedEvent {
    /// Id of the post the event concerns, if any.
    pub fn post_id(&self) -> Option<&str> {
        match self {
            FeedEvent::PostProgress { post_id, .. }
            | FeedEvent::PostCommitted { post_id }
            | FeedEvent::PostFailed { post_id, .. }
            | FeedEvent::CommentProgress { post_id, .. }
            | FeedEvent::CommentCommitted { post_id, .. }
            | FeedEvent::CommentFailed { post_id, .. }
            | FeedEvent::CommentWithdrawn { post_id, .. }
            | FeedEvent::Reacted { post_id, .. }
            | FeedEvent::Interacted { post_id, .. } => Some(post_id),
            _ => None,
        }
    }
}

/// Receives feed events. Called synchronously; must not block.
pub trait FeedListener: Send + Sync {
    fn on_event(&self, event: &FeedEvent);
}

type ListenerMap = Mutex<BTreeMap<u64, Arc<dyn FeedListener>>>;

/// Dispatches events to subscribed listeners in subscription order.
pub struct EventBus {
    listeners: Arc<ListenerMap>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn FeedListener>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap().insert(id, listener);
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn emit(&self, event: &FeedEvent) {
        // Snapshot so a listener may unsubscribe from inside its callback.
        let listeners: Vec<_> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener.on_event(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping it keeps the listener attached; call [`Subscription::unsubscribe`].
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().unwrap().remove(&self.id);
        }
    }
}

// ─── Built-in Listeners ────────────────────────────────────────────────────

/// Collects events in memory (for testing / inspection).
pub struct MemoryListener {
    events: Mutex<Vec<FeedEvent>>,
}

impl MemoryListener {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<FeedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Ordered status sequence observed for one post.
    pub fn post_statuses(&self, post_id: &str) -> Vec<GenerationStatus> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                FeedEvent::PostProgress { post_id: id, status } if id == post_id => Some(*status),
                FeedEvent::PostCommitted { post_id: id } if id == post_id => {
                    Some(GenerationStatus::Complete)
                }
                FeedEvent::PostFailed { post_id: id, .. } if id == post_id => {
                    Some(GenerationStatus::Error)
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for MemoryListener {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedListener for MemoryListener {
    fn on_event(&self, event: &FeedEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Forwards events to a closure.
pub struct CallbackListener {
    callback: Box<dyn Fn(&FeedEvent) + Send + Sync>,
}

impl CallbackListener {
    pub fn new(callback: impl Fn(&FeedEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl FeedListener for CallbackListener {
    fn on_event(&self, event: &FeedEvent) {
        (self.callback)(event);
    }
}

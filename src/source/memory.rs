//! In-memory content source for tests and offline runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{FeedError, FeedResult};
use crate::types::{ContentItem, ContentKind};

use super::{sort_by_recency, ContentSource, SourceFuture};

/// Fixed catalogue of items, grouped by kind.
///
/// Individual kinds can be marked as failing to exercise partial-fetch paths.
pub struct MemorySource {
    items: RwLock<BTreeMap<ContentKind, Vec<ContentItem>>>,
    failing: RwLock<Vec<ContentKind>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            failing: RwLock::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_items(items: impl IntoIterator<Item = ContentItem>) -> Self {
        let source = Self::new();
        source.extend(items);
        source
    }

    pub fn insert(&self, item: ContentItem) {
        let mut items = self.items.write().unwrap();
        let bucket = items.entry(item.kind).or_default();
        bucket.retain(|existing| existing.id != item.id);
        bucket.push(item);
    }

    pub fn extend(&self, items: impl IntoIterator<Item = ContentItem>) {
        for item in items {
            self.insert(item);
        }
    }

    /// Make every fetch of `kind` fail.
    pub fn fail_kind(&self, kind: ContentKind) {
        self.failing.write().unwrap().push(kind);
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn latest(&self, kind: ContentKind, limit: usize) -> FeedResult<Vec<ContentItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().unwrap().contains(&kind) {
            return Err(FeedError::Source(format!("{kind} fetch failed")));
        }
        let mut items = self
            .items
            .read()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        sort_by_recency(&mut items);
        items.truncate(limit);
        Ok(items)
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSource for MemorySource {
    fn fetch_latest(&self, kind: ContentKind, limit: usize) -> SourceFuture<'_, Vec<ContentItem>> {
        Box::pin(async move { self.latest(kind, limit) })
    }
}

//! Content sources: where posts get their raw material.
//!
//! A [`ContentSource`] returns the most recent [`ContentItem`]s of one
//! [`ContentKind`]. [`MemorySource`] serves a fixed catalogue (tests, offline
//! runs); [`HfSource`] reads the public Hugging Face API (behind the
//! `huggingface` feature).

mod memory;
#[cfg(feature = "huggingface")]
mod huggingface;

pub use memory::MemorySource;
#[cfg(feature = "huggingface")]
pub use huggingface::HfSource;

use std::future::Future;
use std::pin::Pin;

use futures::future::join_all;
use tracing::warn;

use crate::error::FeedResult;
use crate::types::{ContentItem, ContentKind, DateRange};

/// Boxed future returned by [`ContentSource`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = FeedResult<T>> + Send + 'a>>;

/// Read-only access to externally sourced content.
pub trait ContentSource: Send + Sync {
    /// Up to `limit` items of `kind`, newest first.
    fn fetch_latest(&self, kind: ContentKind, limit: usize) -> SourceFuture<'_, Vec<ContentItem>>;

    /// Items of `kind` whose timestamp falls inside `range` (whole days, inclusive).
    ///
    /// The default over-fetches `max(100, days * 10)` of the latest items and
    /// filters them locally.
    fn fetch_latest_by_date_range(
        &self,
        kind: ContentKind,
        range: DateRange,
    ) -> SourceFuture<'_, Vec<ContentItem>> {
        Box::pin(async move {
            let limit = (range.days().max(0) as usize * 10).max(100);
            let items = self.fetch_latest(kind, limit).await?;
            Ok(items
                .into_iter()
                .filter(|item| range.contains(item.updated_at))
                .collect())
        })
    }
}

/// Latest `limit` items of every kind, fetched concurrently. A kind whose
/// fetch fails is logged and contributes nothing.
pub async fn fetch_all_kinds(source: &dyn ContentSource, limit: usize) -> Vec<ContentItem> {
    let results = join_all(
        ContentKind::ALL
            .iter()
            .map(|&kind| source.fetch_latest(kind, limit)),
    )
    .await;

    let mut items = Vec::new();
    for (kind, result) in ContentKind::ALL.iter().zip(results) {
        match result {
            Ok(mut batch) => items.append(&mut batch),
            Err(e) => warn!(%kind, error = %e, "content fetch failed"),
        }
    }
    items
}

/// Sort newest first.
pub fn sort_by_recency(items: &mut [ContentItem]) {
    items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

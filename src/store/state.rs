//! Synchronous feed state behind the store's mutex.
//!
//! Every method completes a whole transition, so a caller holding the lock
//! for one call never exposes a half-applied change.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::error::{FeedError, FeedResult};
use crate::types::{Comment, ContentItem, Emoji, GenerationStatus, Post};

/// A non-terminal step forward in the generation lifecycle.
fn advances(from: GenerationStatus, to: GenerationStatus) -> bool {
    !to.is_terminal() && from.can_transition_to(to)
}

pub(crate) struct FeedState {
    cap: usize,
    /// Oldest first.
    posts: VecDeque<Post>,
    /// Insertion order.
    in_flight: Vec<Post>,
    in_flight_comments: HashMap<String, Vec<Comment>>,
    remaining: Vec<ContentItem>,
    seen_sources: HashSet<String>,
    user_reactions: HashMap<String, BTreeSet<Emoji>>,
    loading: bool,
}

impl FeedState {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            posts: VecDeque::new(),
            in_flight: Vec::new(),
            in_flight_comments: HashMap::new(),
            remaining: Vec::new(),
            seen_sources: HashSet::new(),
            user_reactions: HashMap::new(),
            loading: false,
        }
    }

    // ─── Loads ──────────────────────────────────────────────────────────────

    /// Claim the load slot. False while a load runs or a post is in flight.
    pub fn try_begin_load(&mut self) -> bool {
        if self.loading || !self.in_flight.is_empty() {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn end_load(&mut self) {
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Drop every permanent post along with what hangs off them. Returns the
    /// number of posts removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.posts.len();
        self.posts.clear();
        self.in_flight_comments.clear();
        self.user_reactions.clear();
        self.remaining.clear();
        self.seen_sources.clear();
        removed
    }

    pub fn set_remaining(&mut self, items: Vec<ContentItem>) {
        self.remaining = items;
    }

    /// Up to `n` remembered items, oldest remembered first.
    pub fn take_remaining(&mut self, n: usize) -> Vec<ContentItem> {
        let n = n.min(self.remaining.len());
        self.remaining.drain(..n).collect()
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// Record `source_id` as used. False if it already was.
    pub fn mark_seen(&mut self, source_id: &str) -> bool {
        self.seen_sources.insert(source_id.to_string())
    }

    pub fn is_seen(&self, source_id: &str) -> bool {
        self.seen_sources.contains(source_id)
    }

    // ─── Posts ──────────────────────────────────────────────────────────────

    pub fn insert_in_flight(&mut self, post: Post) {
        self.in_flight.push(post);
    }

    /// Replace the in-flight snapshot with the same id. Refused when the
    /// status would move backwards or is terminal; those go through
    /// [`FeedState::commit`] or [`FeedState::discard`].
    pub fn update_in_flight(&mut self, post: Post) -> bool {
        match self.in_flight.iter_mut().find(|p| p.id == post.id) {
            Some(slot) if advances(slot.status, post.status) => {
                *slot = post;
                true
            }
            _ => false,
        }
    }

    /// Move `post` from in-flight to permanent, evicting past the cap.
    /// Returns the ids of evicted posts.
    pub fn commit(&mut self, post: Post) -> Vec<String> {
        self.in_flight.retain(|p| p.id != post.id);
        self.posts.push_back(post);

        let mut evicted = Vec::new();
        while self.posts.len() > self.cap {
            if let Some(old) = self.posts.pop_front() {
                self.in_flight_comments.remove(&old.id);
                self.user_reactions.remove(&old.id);
                evicted.push(old.id);
            }
        }
        evicted
    }

    /// Remove an in-flight post without a permanent record.
    pub fn discard(&mut self, post_id: &str) -> bool {
        let before = self.in_flight.len();
        self.in_flight.retain(|p| p.id != post_id);
        self.in_flight.len() != before
    }

    /// Permanent posts, then in-flight ones.
    pub fn posts(&self) -> Vec<Post> {
        self.posts
            .iter()
            .chain(self.in_flight.iter())
            .cloned()
            .collect()
    }

    pub fn permanent_len(&self) -> usize {
        self.posts.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn post(&self, post_id: &str) -> Option<&Post> {
        self.posts
            .iter()
            .chain(self.in_flight.iter())
            .find(|p| p.id == post_id)
    }

    pub fn permanent(&self, post_id: &str) -> FeedResult<&Post> {
        self.posts
            .iter()
            .find(|p| p.id == post_id)
            .ok_or_else(|| FeedError::post_not_found(post_id))
    }

    pub fn permanent_mut(&mut self, post_id: &str) -> FeedResult<&mut Post> {
        self.posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| FeedError::post_not_found(post_id))
    }

    // ─── Reactions ──────────────────────────────────────────────────────────

    /// Bump `emoji` on behalf of the current user. Returns the new count.
    pub fn react(&mut self, post_id: &str, emoji: Emoji) -> FeedResult<u32> {
        let post = self.permanent_mut(post_id)?;
        post.reactions.increment(emoji);
        let count = post.reactions.get(emoji);
        self.user_reactions
            .entry(post_id.to_string())
            .or_default()
            .insert(emoji);
        Ok(count)
    }

    /// Take back the current user's `emoji`. `None` if they had not reacted.
    pub fn unreact(&mut self, post_id: &str, emoji: Emoji) -> FeedResult<Option<u32>> {
        let reacted = self
            .user_reactions
            .get_mut(post_id)
            .is_some_and(|set| set.remove(&emoji));
        let post = self.permanent_mut(post_id)?;
        if !reacted {
            return Ok(None);
        }
        post.reactions.decrement(emoji);
        Ok(Some(post.reactions.get(emoji)))
    }

    pub fn has_reacted(&self, post_id: &str, emoji: Emoji) -> bool {
        self.user_reactions
            .get(post_id)
            .is_some_and(|set| set.contains(&emoji))
    }

    // ─── Comments ───────────────────────────────────────────────────────────

    pub fn insert_comment(&mut self, post_id: &str, comment: Comment) {
        self.in_flight_comments
            .entry(post_id.to_string())
            .or_default()
            .push(comment);
    }

    pub fn update_comment(&mut self, post_id: &str, comment: Comment) -> bool {
        let slot = self
            .in_flight_comments
            .get_mut(post_id)
            .and_then(|list| list.iter_mut().find(|c| c.id == comment.id));
        match slot {
            Some(slot) if advances(slot.status, comment.status) => {
                *slot = comment;
                true
            }
            _ => false,
        }
    }

    /// Remove an in-flight comment. True if it was there.
    pub fn discard_comment(&mut self, post_id: &str, comment_id: &str) -> bool {
        let Some(list) = self.in_flight_comments.get_mut(post_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|c| c.id != comment_id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.in_flight_comments.remove(post_id);
        }
        removed
    }

    /// Move a comment onto its post. Fails when the post is gone, in which
    /// case the in-flight copy is still dropped.
    pub fn commit_comment(&mut self, post_id: &str, comment: Comment) -> FeedResult<()> {
        self.discard_comment(post_id, &comment.id);
        self.permanent_mut(post_id)?.comments.push(comment);
        Ok(())
    }

    pub fn in_flight_comments(&self, post_id: &str) -> Vec<Comment> {
        self.in_flight_comments
            .get(post_id)
            .cloned()
            .unwrap_or_default()
    }
}

//! The story collection
//!
//! Insertion-ordered and keyed by id, so uniqueness holds by construction.
//! Nothing here ever removes an item; expiry is a view concern (see
//! [`crate::filter`]).

use crate::filter::visible_stories;
use crate::model::{StoryId, StoryItem};
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;

/// All stories known to this viewer, expired ones included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryCollection {
    items: IndexMap<StoryId, StoryItem>,
}

impl StoryCollection {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a persisted list, keeping the first occurrence of each id
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = StoryItem>) -> Self {
        let mut collection = Self::new();
        for item in items {
            collection.items.entry(item.id.clone()).or_insert(item);
        }
        collection
    }

    /// Number of stories, expired included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if id is known
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &StoryId) -> bool {
        self.items.contains_key(id)
    }

    /// Look up by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &StoryId) -> Option<&StoryItem> {
        self.items.get(id)
    }

    /// Iterate in collection order
    pub fn iter(&self) -> impl Iterator<Item = &StoryItem> {
        self.items.values()
    }

    /// Snapshot for persistence
    #[must_use]
    pub fn to_vec(&self) -> Vec<StoryItem> {
        self.items.values().cloned().collect()
    }

    /// Insert at the front
    ///
    /// Returns `false` (and changes nothing) if the id is already present.
    pub fn push_front(&mut self, item: StoryItem) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        self.items.shift_insert(0, item.id.clone(), item);
        true
    }

    /// Append every item whose id is not yet known
    ///
    /// Union keyed by id: idempotent, and the resulting id set does not depend
    /// on the order in which remote batches arrive. Returns the number added.
    pub fn merge_remote(&mut self, remote: impl IntoIterator<Item = StoryItem>) -> usize {
        let mut added = 0;
        for item in remote {
            if !self.items.contains_key(&item.id) {
                self.items.insert(item.id.clone(), item);
                added += 1;
            }
        }
        added
    }

    /// A local id not used by any story in the collection
    #[must_use]
    pub fn fresh_local_id(&self) -> StoryId {
        loop {
            let id = StoryId::local();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Stories inside the retention window, newest first
    #[inline]
    #[must_use]
    pub fn visible(&self, now: DateTime<Utc>, retention: TimeDelta) -> Vec<StoryItem> {
        visible_stories(self.items.values(), now, retention)
    }
}

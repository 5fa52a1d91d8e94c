//! Seen tracking
//!
//! Monotonic: ids are only ever added.

use crate::model::StoryId;
use indexmap::IndexSet;

/// Ids of stories the viewer has opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    ids: IndexSet<StoryId>,
}

impl SeenSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted ids
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = StoryId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Record an id as seen; returns `true` if it was new
    #[inline]
    pub fn mark(&mut self, id: StoryId) -> bool {
        self.ids.insert(id)
    }

    /// Check if seen
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &StoryId) -> bool {
        self.ids.contains(id)
    }

    /// Number of seen ids
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate in the order ids were first seen
    pub fn iter(&self) -> impl Iterator<Item = &StoryId> {
        self.ids.iter()
    }

    /// Snapshot for persistence
    #[must_use]
    pub fn to_vec(&self) -> Vec<StoryId> {
        self.ids.iter().cloned().collect()
    }
}

//! Visible-collection filter
//!
//! A story is visible while `created_at >= now - retention`. The result is
//! ordered newest first; equal timestamps keep their collection order.
//! Expired stories are only hidden here, never removed from the collection.

use crate::model::StoryItem;
use chrono::{DateTime, TimeDelta, Utc};

/// Oldest creation time that is still visible
#[inline]
#[must_use]
pub fn cutoff(now: DateTime<Utc>, retention: TimeDelta) -> DateTime<Utc> {
    now.checked_sub_signed(retention)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whether a story has aged out of the retention window
#[inline]
#[must_use]
pub fn is_expired(item: &StoryItem, now: DateTime<Utc>, retention: TimeDelta) -> bool {
    item.created_at < cutoff(now, retention)
}

/// Visible stories, newest first
#[must_use]
pub fn visible_stories<'a, I>(items: I, now: DateTime<Utc>, retention: TimeDelta) -> Vec<StoryItem>
where
    I: IntoIterator<Item = &'a StoryItem>,
{
    let cutoff = cutoff(now, retention);
    let mut visible: Vec<StoryItem> = items
        .into_iter()
        .filter(|item| item.created_at >= cutoff)
        .cloned()
        .collect();

    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}

/// Earliest instant at which one of the given stories expires
///
/// Lets a caller schedule the next recomputation instead of polling.
#[must_use]
pub fn next_expiry<'a, I>(items: I, now: DateTime<Utc>, retention: TimeDelta) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a StoryItem>,
{
    items
        .into_iter()
        .filter(|item| !is_expired(item, now, retention))
        .filter_map(|item| item.created_at.checked_add_signed(retention))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaKind, Provenance, StoryId};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn aged(id: &str, hours: i64) -> StoryItem {
        StoryItem {
            id: StoryId::new(id),
            owner_id: "u".into(),
            owner_display_name: "U".into(),
            owner_avatar_url: None,
            media_url: format!("https://cdn/{id}"),
            media_kind: MediaKind::Image,
            created_at: now() - TimeDelta::hours(hours),
            provenance: Provenance::Confirmed,
        }
    }

    #[test]
    fn hides_items_older_than_window() {
        let items = vec![aged("a", 23), aged("b", 25)];
        let visible = visible_stories(&items, now(), TimeDelta::hours(24));
        let ids: Vec<_> = visible.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn boundary_item_is_still_visible() {
        let items = vec![aged("edge", 24)];
        assert_eq!(visible_stories(&items, now(), TimeDelta::hours(24)).len(), 1);
        assert!(!is_expired(&items[0], now(), TimeDelta::hours(24)));
    }

    #[test]
    fn orders_newest_first() {
        let items = vec![aged("old", 10), aged("new", 1), aged("mid", 5)];
        let visible = visible_stories(&items, now(), TimeDelta::hours(24));
        let ids: Vec<_> = visible.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn ties_keep_collection_order() {
        let items = vec![aged("first", 2), aged("second", 2)];
        let visible = visible_stories(&items, now(), TimeDelta::hours(24));
        assert_eq!(visible[0].id.as_str(), "first");
        assert_eq!(visible[1].id.as_str(), "second");
    }

    #[test]
    fn unbounded_retention_shows_everything() {
        let items = vec![aged("ancient", 24 * 365 * 50)];
        assert_eq!(visible_stories(&items, now(), TimeDelta::MAX).len(), 1);
    }

    #[test]
    fn next_expiry_is_oldest_visible_plus_window() {
        let items = vec![aged("a", 2), aged("b", 20), aged("gone", 30)];
        let next = next_expiry(&items, now(), TimeDelta::hours(24)).unwrap();
        assert_eq!(next, now() + TimeDelta::hours(4));
    }
}

use chrono::TimeDelta;
use proptest::prelude::*;
use std::collections::HashSet;
use storytray_core::{MediaKind, SeenSet, StoryCollection, StoryId, StoryItem};
use storytray_test_utils::{base_time, story_aged};

const WINDOW_MINUTES: i64 = 24 * 60;

fn item(n: u8, age_minutes: i64) -> StoryItem {
    story_aged(
        &format!("s{n}"),
        "friend",
        TimeDelta::minutes(age_minutes),
        MediaKind::Image,
    )
}

fn items() -> impl Strategy<Value = Vec<StoryItem>> {
    prop::collection::vec((0u8..24, 0i64..3 * WINDOW_MINUTES), 0..30)
        .prop_map(|raw| raw.into_iter().map(|(n, age)| item(n, age)).collect())
}

fn id_set(collection: &StoryCollection) -> HashSet<StoryId> {
    collection.iter().map(|s| s.id.clone()).collect()
}

proptest! {
    #[test]
    fn prop_visible_respects_window(stories in items()) {
        let collection = StoryCollection::from_items(stories);
        let window = TimeDelta::minutes(WINDOW_MINUTES);
        let visible = collection.visible(base_time(), window);
        let cutoff = base_time() - window;

        for story in &visible {
            prop_assert!(story.created_at >= cutoff);
        }
        let shown: HashSet<_> = visible.iter().map(|s| s.id.clone()).collect();
        for story in collection.iter().filter(|s| !shown.contains(&s.id)) {
            prop_assert!(story.created_at < cutoff);
        }
        for pair in visible.windows(2) {
            prop_assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[test]
    fn prop_merge_is_idempotent(local in items(), remote in items()) {
        let mut once = StoryCollection::from_items(local);
        once.merge_remote(remote.clone());
        let mut twice = once.clone();
        prop_assert_eq!(twice.merge_remote(remote), 0);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn prop_merge_never_drops_and_ignores_order(
        local in items(),
        first in items(),
        second in items(),
    ) {
        let base = StoryCollection::from_items(local);

        let mut ab = base.clone();
        ab.merge_remote(first.clone());
        ab.merge_remote(second.clone());

        let mut ba = base.clone();
        ba.merge_remote(second);
        ba.merge_remote(first);

        prop_assert!(id_set(&base).is_subset(&id_set(&ab)));
        prop_assert_eq!(id_set(&ab), id_set(&ba));
        // Existing entries keep their fields
        for story in base.iter() {
            prop_assert_eq!(ab.get(&story.id), Some(story));
        }
    }

    #[test]
    fn prop_seen_only_grows(marks in prop::collection::vec(0u8..16, 0..40)) {
        let mut seen = SeenSet::new();
        let mut marked = Vec::new();
        for n in marks {
            let id = StoryId::new(format!("s{n}"));
            seen.mark(id.clone());
            marked.push(id);
            for earlier in &marked {
                prop_assert!(seen.contains(earlier));
            }
        }
        let distinct: HashSet<_> = marked.iter().collect();
        prop_assert_eq!(seen.len(), distinct.len());
    }
}

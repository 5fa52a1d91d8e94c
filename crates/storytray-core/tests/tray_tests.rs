use chrono::TimeDelta;
use pretty_assertions::assert_eq;
use std::time::Duration;
use storytray_core::entry::OWN_STORY_LABEL;
use storytray_core::store::{save_collection, STORIES_RECORD};
use storytray_core::{
    CloseReason, MediaKind, PlaybackEvent, PlaybackState, Provenance, PublishError,
    StoryCollection, StoryId, StoryItem,
};
use storytray_test_utils::{
    base_time, image_request, image_story, story_aged, video_story, TrayHarness,
};

async fn seed(h: &TrayHarness, items: Vec<StoryItem>) {
    save_collection(&h.store, &StoryCollection::from_items(items))
        .await
        .unwrap();
}

fn ids(items: &[StoryItem]) -> Vec<String> {
    items.iter().map(|s| s.id.to_string()).collect()
}

#[tokio::test]
async fn expired_story_hidden_and_last_item_closes() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("A", 23), image_story("B", 25)]).await;
    let mut tray = h.tray().await;

    assert_eq!(ids(&tray.visible()), vec!["A"]);

    let event = tray.open(&"A".into()).await;
    assert_eq!(
        event,
        PlaybackEvent::Showing {
            index: 0,
            story_id: "A".into()
        }
    );
    assert!(tray.is_seen(&"A".into()));
    assert_eq!(h.timers.latest().unwrap().delay, Duration::from_secs(6));

    let event = tray.on_advance(h.timers.fire_latest()).await;
    assert_eq!(event, PlaybackEvent::Closed(CloseReason::Finished));
    assert_eq!(tray.playback_state(), &PlaybackState::Closed);
}

#[tokio::test]
async fn expired_stories_stay_in_the_store() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("A", 23), image_story("B", 25)]).await;
    let mut tray = h.tray().await;
    h.service.fail_create(true);

    tray.publish(image_request("new.jpg")).await.unwrap();

    let reloaded = h.tray().await;
    assert!(reloaded.collection().contains(&"B".into()));
    assert_eq!(reloaded.collection().len(), 3);
}

#[tokio::test]
async fn auto_advance_walks_newest_first() {
    let h = TrayHarness::new();
    seed(&h, vec![video_story("old", 5), image_story("new", 1)]).await;
    let mut tray = h.tray().await;

    tray.open(&"new".into()).await;
    let event = tray.on_advance(h.timers.fire_latest()).await;
    assert_eq!(
        event,
        PlaybackEvent::Showing {
            index: 1,
            story_id: "old".into()
        }
    );
    assert!(tray.is_seen(&"old".into()));
    assert_eq!(h.timers.latest().unwrap().delay, Duration::from_secs(10));
    assert_eq!(h.timers.pending().len(), 1);

    let event = tray.on_advance(h.timers.fire_latest()).await;
    assert_eq!(event, PlaybackEvent::Closed(CloseReason::Finished));
    assert!(h.timers.pending().is_empty());
}

#[tokio::test]
async fn manual_close_cancels_timer() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("a", 1), image_story("b", 2)]).await;
    let mut tray = h.tray().await;

    tray.open(&"a".into()).await;
    let stale = h.timers.latest().unwrap().ticket;
    assert_eq!(tray.close(), PlaybackEvent::Closed(CloseReason::Manual));
    assert!(h.timers.pending().is_empty());

    assert_eq!(tray.on_advance(stale).await, PlaybackEvent::Unchanged);
    assert!(!tray.is_seen(&"b".into()));
}

#[tokio::test]
async fn opening_expired_story_marks_seen_then_closes() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("gone", 30)]).await;
    let mut tray = h.tray().await;

    let event = tray.open(&"gone".into()).await;
    assert_eq!(event, PlaybackEvent::Closed(CloseReason::NotVisible));
    assert!(tray.is_seen(&"gone".into()));
    assert!(h.timers.armed().is_empty());
}

#[tokio::test]
async fn expiry_under_open_session_closes() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("n", 1), image_story("o", 23)]).await;
    let mut tray = h.tray().await;

    tray.open(&"o".into()).await;
    assert_eq!(tray.playback_state().index(), Some(1));

    h.clock.advance(TimeDelta::hours(2));
    let event = tray.refresh().await;
    assert_eq!(event, PlaybackEvent::Closed(CloseReason::OutOfRange));
    assert!(h.timers.pending().is_empty());
}

#[tokio::test]
async fn replacement_story_rearms_for_its_kind() {
    let h = TrayHarness::new();
    let expiring = story_aged("b", "friend", TimeDelta::minutes(23 * 60 + 50), MediaKind::Image);
    seed(&h, vec![video_story("x", 1), expiring]).await;
    let mut tray = h.tray().await;

    tray.open(&"b".into()).await;
    assert_eq!(h.timers.latest().unwrap().delay, Duration::from_secs(6));

    // b expires and a newer story pushes x into b's slot
    h.clock.advance(TimeDelta::minutes(20));
    h.service.set_remote(&[story_aged(
        "c",
        "friend",
        TimeDelta::minutes(30),
        MediaKind::Image,
    )]);
    assert_eq!(tray.reconcile().await, 1);

    assert_eq!(tray.playback_state().index(), Some(1));
    assert_eq!(tray.current_story().unwrap().id.as_str(), "x");
    assert!(tray.is_seen(&"x".into()));

    let pending = h.timers.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].delay, Duration::from_secs(10));
    assert_eq!(h.timers.armed().len(), 2);
}

#[tokio::test]
async fn seen_set_survives_reload() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("a", 1), image_story("b", 2)]).await;
    let mut tray = h.tray().await;
    tray.open(&"b".into()).await;
    drop(tray);

    let tray = h.tray().await;
    assert!(tray.is_seen(&"b".into()));
    assert!(!tray.is_seen(&"a".into()));
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let h = TrayHarness::new();
    h.service
        .set_remote(&[image_story("x", 1), image_story("y", 2)]);
    let mut tray = h.tray().await;

    assert_eq!(tray.reconcile().await, 2);
    assert_eq!(tray.reconcile().await, 0);
    assert_eq!(tray.collection().len(), 2);
    assert_eq!(h.service.list_calls(), 2);
}

#[tokio::test]
async fn reconcile_keeps_local_only_stories() {
    let h = TrayHarness::new();
    let mut local = image_story("local-01", 1);
    local.provenance = Provenance::Local;
    seed(&h, vec![local]).await;
    h.service.set_remote(&[image_story("r1", 2)]);
    let mut tray = h.tray().await;

    tray.reconcile().await;
    let ids: Vec<_> = tray.collection().iter().map(|s| s.id.to_string()).collect();
    assert_eq!(ids, vec!["local-01", "r1"]);
}

#[tokio::test]
async fn failed_reconcile_leaves_tray_untouched() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("a", 1)]).await;
    h.service.fail_list(true);
    let mut tray = h.tray().await;
    let before = tray.collection().clone();

    assert_eq!(tray.reconcile().await, 0);
    assert_eq!(tray.collection(), &before);
}

#[tokio::test]
async fn publish_with_registration_down_stays_local() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("a", 1), image_story("b", 2)]).await;
    h.service.fail_create(true);
    let mut tray = h.tray().await;

    let item = tray.publish(image_request("beach.jpg")).await.unwrap();

    assert!(item.id.is_local());
    assert_eq!(item.provenance, Provenance::Local);
    assert_eq!(item.created_at, base_time());
    assert_eq!(item.owner_id, "me");
    assert_eq!(item.media_url, "https://cdn.test/stories/beach.jpg");
    assert_eq!(tray.collection().len(), 3);
    assert_eq!(tray.collection().iter().next().unwrap().id, item.id);
    assert_eq!(tray.visible()[0].id, item.id);

    let reloaded = h.tray().await;
    assert!(reloaded.collection().contains(&item.id));
}

#[tokio::test]
async fn repeated_local_publishes_get_distinct_ids() {
    let h = TrayHarness::new();
    h.service.fail_create(true);
    let mut tray = h.tray().await;

    let first = tray.publish(image_request("one.jpg")).await.unwrap();
    let second = tray.publish(image_request("two.jpg")).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(tray.collection().len(), 2);
}

#[tokio::test]
async fn publish_registers_and_confirms() {
    let h = TrayHarness::new();
    let mut tray = h.tray().await;

    let item = tray.publish(image_request("beach.jpg")).await.unwrap();

    assert_eq!(item.id, StoryId::new("srv-1"));
    assert_eq!(item.provenance, Provenance::Confirmed);
    assert_eq!(item.owner_display_name, "Ada");
    assert_eq!(
        h.uploader.uploads(),
        vec![("beach.jpg".to_string(), "stories".to_string())]
    );
    assert_eq!(h.service.created().len(), 1);
    assert_eq!(h.service.created()[0].media_url, item.media_url);
}

#[tokio::test]
async fn upload_failure_records_nothing() {
    let h = TrayHarness::new();
    h.uploader.fail(true);
    let mut tray = h.tray().await;

    let result = tray.publish(image_request("beach.jpg")).await;

    assert!(matches!(result, Err(PublishError::Upload(_))));
    assert!(tray.collection().is_empty());
    assert!(h.service.created().is_empty());
    assert!(h.store.raw(STORIES_RECORD).is_none());
    assert!(!tray.is_publishing());
}

#[tokio::test]
async fn second_publish_while_busy_is_rejected() {
    let h = TrayHarness::new();
    let mut tray = h.tray().await;

    let first = tray.begin_publish(image_request("one.jpg")).unwrap();
    assert!(tray.is_publishing());
    assert!(matches!(
        tray.begin_publish(image_request("two.jpg")),
        Err(PublishError::Busy)
    ));

    let outcome = first.await;
    tray.finish_publish(outcome).await.unwrap();
    assert!(!tray.is_publishing());
    assert_eq!(tray.collection().len(), 1);
    assert_eq!(h.uploader.uploads().len(), 1);
}

#[tokio::test]
async fn dropped_publish_releases_the_tray() {
    let h = TrayHarness::new();
    let mut tray = h.tray().await;

    let abandoned = tray.begin_publish(image_request("one.jpg")).unwrap();
    assert!(tray.is_publishing());
    drop(abandoned);
    assert!(!tray.is_publishing());

    let item = tray.publish(image_request("two.jpg")).await.unwrap();
    assert_eq!(tray.collection().len(), 1);
    assert!(tray.collection().contains(&item.id));
}

#[tokio::test]
async fn publish_during_playback_keeps_current_story() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("a", 1), image_story("b", 2)]).await;
    let mut tray = h.tray().await;

    tray.open(&"a".into()).await;
    let armed = h.timers.armed().len();
    tray.publish(image_request("mine.jpg")).await.unwrap();

    assert_eq!(tray.playback_state().index(), Some(1));
    assert_eq!(tray.current_story().unwrap().id.as_str(), "a");
    assert_eq!(h.timers.armed().len(), armed);
}

#[tokio::test]
async fn strip_entries_and_my_story() {
    let h = TrayHarness::new();
    seed(&h, vec![image_story("f1", 3)]).await;
    let mut tray = h.tray().await;
    assert!(tray.my_story().is_none());

    let mine = tray.publish(image_request("me.jpg")).await.unwrap();
    tray.open(&"f1".into()).await;

    let entries = tray.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].label, OWN_STORY_LABEL);
    assert!(entries[0].is_mine);
    assert!(!entries[0].seen);
    assert_eq!(entries[1].label, "FRIEND");
    assert!(entries[1].seen);
    assert_eq!(
        entries[1].avatar_url.as_deref(),
        Some("https://cdn.test/avatars/me.png")
    );
    assert_eq!(tray.my_story().unwrap().id, mine.id);
}

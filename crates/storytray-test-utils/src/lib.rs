//! Testing utilities for the story tray workspace
//!
//! Shared fakes, fixtures, and a harness that wires a tray to them.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storytray_core::timer::PendingTimer;
use storytray_core::{
    AdvanceTicket, Clock, Collaborators, MediaFile, MediaKind, MediaUploader, MemoryStore,
    NewStory, Provenance, PublishRequest, RemoteError, StoryId, StoryItem, StoryRecord,
    StoryService, StoryTray, TimerFactory, TrayConfig, UploadError, Viewer,
};

/// Fixed reference instant used across tests
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(base_time())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// A timer armed through [`ManualTimers`]
#[derive(Debug, Clone)]
pub struct ArmedTimer {
    pub delay: Duration,
    pub ticket: AdvanceTicket,
    cancelled: Arc<AtomicBool>,
}

impl ArmedTimer {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct ManualPendingTimer {
    cancelled: Arc<AtomicBool>,
}

impl PendingTimer for ManualPendingTimer {
    fn cancel(self: Box<Self>) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Timers that never fire on their own; tests fire them explicitly
#[derive(Debug, Clone, Default)]
pub struct ManualTimers {
    armed: Arc<Mutex<Vec<ArmedTimer>>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every timer armed so far, oldest first
    pub fn armed(&self) -> Vec<ArmedTimer> {
        self.armed.lock().clone()
    }

    /// Timers neither cancelled nor fired via [`ManualTimers::fire_latest`]
    pub fn pending(&self) -> Vec<ArmedTimer> {
        self.armed
            .lock()
            .iter()
            .filter(|t| !t.is_cancelled())
            .cloned()
            .collect()
    }

    /// Most recently armed timer
    pub fn latest(&self) -> Option<ArmedTimer> {
        self.armed.lock().last().cloned()
    }

    /// Ticket of the most recent timer, marking it as no longer pending
    pub fn fire_latest(&self) -> AdvanceTicket {
        let guard = self.armed.lock();
        let timer = guard.last().expect("no timer armed");
        timer.cancelled.store(true, Ordering::SeqCst);
        timer.ticket
    }
}

impl TimerFactory for ManualTimers {
    fn arm(&self, delay: Duration, ticket: AdvanceTicket) -> Box<dyn PendingTimer> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.armed.lock().push(ArmedTimer {
            delay,
            ticket,
            cancelled: Arc::clone(&cancelled),
        });
        Box::new(ManualPendingTimer { cancelled })
    }
}

/// Scripted remote story service
#[derive(Debug, Default)]
pub struct FakeStoryService {
    remote: Mutex<Vec<StoryRecord>>,
    created: Mutex<Vec<NewStory>>,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    list_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeStoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace what `list` returns
    pub fn set_remote(&self, items: &[StoryItem]) {
        *self.remote.lock() = items.iter().map(StoryRecord::from).collect();
    }

    /// Replace what `list` returns with raw records
    pub fn set_records(&self, records: Vec<StoryRecord>) {
        *self.remote.lock() = records;
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Stories registered through `create`
    pub fn created(&self) -> Vec<NewStory> {
        self.created.lock().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoryService for FakeStoryService {
    async fn list(&self) -> Result<Vec<StoryRecord>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection refused".into()));
        }
        Ok(self.remote.lock().clone())
    }

    async fn create(&self, story: &NewStory) -> Result<StoryRecord, RemoteError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RemoteError::status(503, "service unavailable"));
        }
        self.created.lock().push(story.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StoryRecord {
            id: Some(format!("srv-{n}")),
            media_url: Some(story.media_url.clone()),
            media_kind: Some(story.media_kind),
            ..Default::default()
        })
    }
}

/// Scripted media uploader
#[derive(Debug, Default)]
pub struct FakeUploader {
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    uploads: Mutex<Vec<(String, String)>>,
}

impl FakeUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make every upload take `delay` of tokio time
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// `(file name, category)` of every successful upload
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(&self, file: &MediaFile, category: &str) -> Result<String, UploadError> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(UploadError::Transport("storage unreachable".into()));
        }
        self.uploads
            .lock()
            .push((file.file_name.clone(), category.to_string()));
        Ok(format!("https://cdn.test/{category}/{}", file.file_name))
    }
}

/// Story created `age` before [`base_time`]
pub fn story_aged(id: &str, owner: &str, age: TimeDelta, kind: MediaKind) -> StoryItem {
    StoryItem {
        id: StoryId::new(id),
        owner_id: owner.to_string(),
        owner_display_name: owner.to_uppercase(),
        owner_avatar_url: None,
        media_url: format!("https://cdn.test/stories/{id}"),
        media_kind: kind,
        created_at: base_time() - age,
        provenance: Provenance::Confirmed,
    }
}

/// Image story created `hours` before [`base_time`]
pub fn image_story(id: &str, hours: i64) -> StoryItem {
    story_aged(id, "friend", TimeDelta::hours(hours), MediaKind::Image)
}

/// Video story created `hours` before [`base_time`]
pub fn video_story(id: &str, hours: i64) -> StoryItem {
    story_aged(id, "friend", TimeDelta::hours(hours), MediaKind::Video)
}

pub fn viewer() -> Viewer {
    Viewer::new("me")
        .with_name("Ada")
        .with_avatar("https://cdn.test/avatars/me.png")
}

pub fn image_request(name: &str) -> PublishRequest {
    PublishRequest::new(
        MediaFile::new(format!("/tmp/{name}")).with_content_type("image/jpeg"),
        MediaKind::Image,
    )
}

/// A tray wired to in-memory fakes
pub struct TrayHarness {
    pub clock: ManualClock,
    pub timers: ManualTimers,
    pub store: MemoryStore,
    pub service: Arc<FakeStoryService>,
    pub uploader: Arc<FakeUploader>,
    pub config: TrayConfig,
}

impl TrayHarness {
    pub fn new() -> Self {
        Self {
            clock: ManualClock::default(),
            timers: ManualTimers::new(),
            store: MemoryStore::new(),
            service: Arc::new(FakeStoryService::new()),
            uploader: Arc::new(FakeUploader::new()),
            config: TrayConfig::default(),
        }
    }

    /// Collaborators sharing this harness's fakes
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            clock: Arc::new(self.clock.clone()),
            store: Arc::new(self.store.clone()),
            stories: self.service.clone(),
            uploader: self.uploader.clone(),
            timers: Box::new(self.timers.clone()),
        }
    }

    /// Load a tray from the harness store
    pub async fn tray(&self) -> StoryTray {
        StoryTray::load(self.config.clone(), viewer(), self.collaborators()).await
    }
}

impl Default for TrayHarness {
    fn default() -> Self {
        Self::new()
    }
}

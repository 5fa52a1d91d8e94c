//! The story tray
//!
//! An explicitly owned state container. Views get a `&StoryTray` to render
//! and call its mutation API; nothing else writes to the collection, the seen
//! set or the persisted store.
//!
//! # Mutation API
//!
//! - **Reconcile**: [`StoryTray::fetch_task`] + [`StoryTray::apply_remote`]
//! - **Publish**: [`StoryTray::begin_publish`] + [`StoryTray::finish_publish`]
//! - **Open / advance / close**: [`StoryTray::open`], [`StoryTray::on_advance`],
//!   [`StoryTray::close`]
//! - **Time passing**: [`StoryTray::refresh`]
//!
//! The network halves of reconcile and publish are returned as `'static`
//! futures so a driver can run them without borrowing the tray. The one-call
//! forms ([`StoryTray::reconcile`], [`StoryTray::publish`]) are for callers
//! that do not care.

use crate::clock::Clock;
use crate::collection::StoryCollection;
use crate::config::TrayConfig;
use crate::entry::TrayEntry;
use crate::error::PublishError;
use crate::model::{PublishRequest, StoryId, StoryItem, Viewer};
use crate::playback::{AdvanceDelays, PlaybackEvent, PlaybackMachine, PlaybackState};
use crate::publish::{PreparedStory, Publisher};
use crate::reconcile::fetch_remote;
use crate::seen::SeenSet;
use crate::service::{MediaUploader, StoryService};
use crate::store::{self, KeyValueStore};
use crate::timer::{AdvanceTicket, TimerFactory};
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything the tray talks to
pub struct Collaborators {
    /// Source of "now"
    pub clock: Arc<dyn Clock>,
    /// Persisted collection and seen set
    pub store: Arc<dyn KeyValueStore>,
    /// Remote story list and registration
    pub stories: Arc<dyn StoryService>,
    /// Media storage
    pub uploader: Arc<dyn MediaUploader>,
    /// Auto-advance timers
    pub timers: Box<dyn TimerFactory>,
}

/// Ephemeral story tray for one logged-in viewer
pub struct StoryTray {
    config: TrayConfig,
    viewer: Viewer,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    stories: Arc<dyn StoryService>,
    publisher: Publisher,
    collection: StoryCollection,
    seen: SeenSet,
    playback: PlaybackMachine,
    publishing: Arc<AtomicBool>,
}

impl fmt::Debug for StoryTray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryTray")
            .field("viewer", &self.viewer.id)
            .field("stories", &self.collection.len())
            .field("seen", &self.seen.len())
            .field("playback", self.playback.state())
            .field("publishing", &self.is_publishing())
            .finish_non_exhaustive()
    }
}

impl StoryTray {
    /// Create tray, populated from the persisted store
    ///
    /// Does not contact the remote service; reconcile afterwards.
    pub async fn load(config: TrayConfig, viewer: Viewer, collaborators: Collaborators) -> Self {
        let Collaborators {
            clock,
            store,
            stories,
            uploader,
            timers,
        } = collaborators;

        let collection = store::load_collection(store.as_ref()).await;
        let seen = store::load_seen(store.as_ref()).await;
        tracing::info!(
            "Loaded {} cached stories ({} seen) for viewer {}",
            collection.len(),
            seen.len(),
            viewer.id
        );

        let delays = AdvanceDelays {
            image: config.image_advance(),
            video: config.video_advance(),
        };
        let publisher = Publisher::new(uploader, Arc::clone(&stories), config.upload_category.clone());

        Self {
            config,
            viewer,
            clock,
            store,
            stories,
            publisher,
            collection,
            seen,
            playback: PlaybackMachine::new(timers, delays),
            publishing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    /// Logged-in viewer
    #[inline]
    #[must_use]
    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Full collection, expired stories included
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &StoryCollection {
        &self.collection
    }

    /// Seen ids
    #[inline]
    #[must_use]
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Check if a story was opened
    #[inline]
    #[must_use]
    pub fn is_seen(&self, id: &StoryId) -> bool {
        self.seen.contains(id)
    }

    /// Playback state
    #[inline]
    #[must_use]
    pub fn playback_state(&self) -> &PlaybackState {
        self.playback.state()
    }

    /// Whether a publish is in flight
    #[inline]
    #[must_use]
    pub fn is_publishing(&self) -> bool {
        self.publishing.load(Ordering::Acquire)
    }

    /// Current time from the injected clock
    #[inline]
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Stories inside the retention window, newest first
    #[must_use]
    pub fn visible(&self) -> Vec<StoryItem> {
        self.collection.visible(self.now(), self.config.retention())
    }

    /// Strip entries for the visible stories
    #[must_use]
    pub fn entries(&self) -> Vec<TrayEntry> {
        self.visible()
            .into_iter()
            .map(|story| TrayEntry::new(story, &self.viewer, &self.seen))
            .collect()
    }

    /// Newest visible story contributed by the viewer
    #[must_use]
    pub fn my_story(&self) -> Option<StoryItem> {
        self.visible()
            .into_iter()
            .find(|story| story.is_owned_by(&self.viewer))
    }

    /// Story currently shown by playback
    #[must_use]
    pub fn current_story(&self) -> Option<StoryItem> {
        self.playback.current(&self.visible()).cloned()
    }

    /// Network half of reconciliation, detached from the tray
    pub fn fetch_task(&self) -> impl Future<Output = Option<Vec<StoryItem>>> + Send + 'static {
        let stories = Arc::clone(&self.stories);
        let clock = Arc::clone(&self.clock);
        async move { fetch_remote(stories.as_ref(), clock.now()).await }
    }

    /// Merge fetched stories; returns how many were new
    pub async fn apply_remote(&mut self, remote: Vec<StoryItem>) -> usize {
        let added = self.collection.merge_remote(remote);
        if added > 0 {
            tracing::info!("Reconciled {} new stories", added);
            self.persist_collection().await;
            self.revalidate_playback().await;
        }
        added
    }

    /// Fetch and merge in one call; failures leave the tray untouched
    pub async fn reconcile(&mut self) -> usize {
        match self.fetch_task().await {
            Some(remote) => self.apply_remote(remote).await,
            None => 0,
        }
    }

    /// Start a publish
    ///
    /// Returns the upload + registration future. Feed its output to
    /// [`StoryTray::finish_publish`]. The tray counts as publishing until the
    /// future completes or is dropped.
    ///
    /// # Errors
    /// - `PublishError::Busy` if a publish is already in flight
    pub fn begin_publish(
        &mut self,
        request: PublishRequest,
    ) -> Result<impl Future<Output = Result<PreparedStory, PublishError>> + Send + 'static, PublishError>
    {
        let Some(guard) = PublishingGuard::acquire(&self.publishing) else {
            tracing::warn!("Publish of {} rejected: busy", request.file.file_name);
            return Err(PublishError::Busy);
        };

        let publisher = self.publisher.clone();
        Ok(async move {
            let outcome = publisher.prepare(request).await;
            drop(guard);
            outcome
        })
    }

    /// Insert a prepared story at the front and persist
    ///
    /// # Errors
    /// Passes through the failure of the prepare step; nothing is recorded.
    pub async fn finish_publish(
        &mut self,
        outcome: Result<PreparedStory, PublishError>,
    ) -> Result<StoryItem, PublishError> {
        let prepared = outcome?;

        let item = prepared.into_item(&self.viewer, &self.collection, self.now());
        if self.collection.push_front(item.clone()) {
            self.persist_collection().await;
            self.revalidate_playback().await;
        } else {
            // Reconciliation got there first.
            tracing::debug!("Published story {} already known", item.id);
        }

        tracing::info!(
            "Published {} story {} ({:?})",
            item.media_kind,
            item.id,
            item.provenance
        );
        Ok(item)
    }

    /// Publish in one call
    ///
    /// # Errors
    /// - `PublishError::Busy` if a publish is already in flight
    /// - `PublishError::Upload` if the media could not be uploaded
    pub async fn publish(&mut self, request: PublishRequest) -> Result<StoryItem, PublishError> {
        let prepare = self.begin_publish(request)?;
        let outcome = prepare.await;
        self.finish_publish(outcome).await
    }

    /// Open a story and mark it seen
    pub async fn open(&mut self, id: &StoryId) -> PlaybackEvent {
        self.mark_seen(id.clone()).await;
        let visible = self.visible();
        self.playback.open(&visible, id)
    }

    /// Handle a fired auto-advance timer
    pub async fn on_advance(&mut self, ticket: AdvanceTicket) -> PlaybackEvent {
        let visible = self.visible();
        let event = self.playback.on_timer(&visible, ticket);
        self.record_shown(&event).await;
        event
    }

    /// Close playback
    pub fn close(&mut self) -> PlaybackEvent {
        self.playback.close()
    }

    /// Re-check playback against the current time window
    pub async fn refresh(&mut self) -> PlaybackEvent {
        self.revalidate_playback().await
    }

    async fn revalidate_playback(&mut self) -> PlaybackEvent {
        let visible = self.visible();
        let event = self.playback.revalidate(&visible);
        self.record_shown(&event).await;
        event
    }

    async fn record_shown(&mut self, event: &PlaybackEvent) {
        if let PlaybackEvent::Showing { story_id, .. } = event {
            self.mark_seen(story_id.clone()).await;
        }
    }

    async fn mark_seen(&mut self, id: StoryId) {
        if self.seen.mark(id) {
            if let Err(e) = store::save_seen(self.store.as_ref(), &self.seen).await {
                tracing::warn!("Failed to persist seen stories: {}", e);
            }
        }
    }

    async fn persist_collection(&self) {
        if let Err(e) = store::save_collection(self.store.as_ref(), &self.collection).await {
            tracing::warn!("Failed to persist stories: {}", e);
        }
    }
}

/// Holds the publishing flag; released on drop
struct PublishingGuard(Arc<AtomicBool>);

impl PublishingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for PublishingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

//! Playback state machine
//!
//! States are `Closed` and `Playing { index }`, where `index` addresses the
//! visible collection. Every entry into `Playing` cancels the previous timer
//! and arms exactly one new one; every exit cancels it. At most one timer is
//! pending at any time.
//!
//! A timer can fire after it was cancelled if its ticket was already queued.
//! Each arm bumps a generation counter, and tickets from older generations are
//! ignored.

use crate::model::{MediaKind, StoryId, StoryItem};
use crate::timer::{AdvanceTicket, PendingTimer, TimerFactory};
use std::time::Duration;

/// Playback state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing is being shown
    #[default]
    Closed,
    /// Showing the visible story at `index`
    Playing {
        /// Position in the visible collection
        index: usize,
        /// Story shown at that position when it was entered
        story_id: StoryId,
    },
}

impl PlaybackState {
    /// Check if playing
    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    /// Current index, if playing
    #[inline]
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Playing { index, .. } => Some(*index),
            Self::Closed => None,
        }
    }
}

/// Why playback closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Viewer closed it
    Manual,
    /// Auto-advance ran past the last visible story
    Finished,
    /// The opened story was not in the visible collection
    NotVisible,
    /// The visible collection shrank under the current index
    OutOfRange,
}

/// Outcome of feeding an event to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A story is now being shown and should be marked seen
    Showing {
        /// Position in the visible collection
        index: usize,
        /// Story now shown
        story_id: StoryId,
    },
    /// Playback moved to `Closed`
    Closed(CloseReason),
    /// Nothing changed
    Unchanged,
}

/// Auto-advance delay per media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceDelays {
    /// How long an image stays up
    pub image: Duration,
    /// How long a video stays up
    pub video: Duration,
}

impl AdvanceDelays {
    /// Delay for a media kind
    #[inline]
    #[must_use]
    pub fn for_kind(&self, kind: MediaKind) -> Duration {
        match kind {
            MediaKind::Image => self.image,
            MediaKind::Video => self.video,
        }
    }
}

impl Default for AdvanceDelays {
    fn default() -> Self {
        Self {
            image: Duration::from_secs(6),
            video: Duration::from_secs(10),
        }
    }
}

/// Playback machine owning its auto-advance timer
#[derive(Debug)]
pub struct PlaybackMachine {
    state: PlaybackState,
    delays: AdvanceDelays,
    timers: Box<dyn TimerFactory>,
    pending: Option<Box<dyn PendingTimer>>,
    generation: u64,
}

impl PlaybackMachine {
    /// Create closed machine
    #[must_use]
    pub fn new(timers: Box<dyn TimerFactory>, delays: AdvanceDelays) -> Self {
        Self {
            state: PlaybackState::Closed,
            delays,
            timers,
            pending: None,
            generation: 0,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Whether a timer is armed
    #[inline]
    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        self.pending.is_some()
    }

    /// Story currently shown, looked up in `visible`
    #[must_use]
    pub fn current<'a>(&self, visible: &'a [StoryItem]) -> Option<&'a StoryItem> {
        self.state.index().and_then(|i| visible.get(i))
    }

    /// Open a story
    ///
    /// Closes immediately if it is not visible (it may have just expired).
    pub fn open(&mut self, visible: &[StoryItem], id: &StoryId) -> PlaybackEvent {
        match visible.iter().position(|s| &s.id == id) {
            Some(index) => self.enter(index, &visible[index]),
            None => {
                tracing::debug!("Story {} not visible, closing", id);
                self.close_with(CloseReason::NotVisible)
            }
        }
    }

    /// Handle a fired timer
    pub fn on_timer(&mut self, visible: &[StoryItem], ticket: AdvanceTicket) -> PlaybackEvent {
        let PlaybackState::Playing { index, .. } = self.state else {
            return PlaybackEvent::Unchanged;
        };
        if ticket.generation != self.generation {
            tracing::trace!(
                "Ignoring stale advance ticket {} (current {})",
                ticket.generation,
                self.generation
            );
            return PlaybackEvent::Unchanged;
        }

        // Fired, nothing left to cancel.
        self.pending = None;

        let next = index + 1;
        match visible.get(next) {
            Some(story) => self.enter(next, story),
            None => self.close_with(CloseReason::Finished),
        }
    }

    /// Close on request
    pub fn close(&mut self) -> PlaybackEvent {
        if self.state.is_playing() {
            self.close_with(CloseReason::Manual)
        } else {
            PlaybackEvent::Unchanged
        }
    }

    /// Re-check the session after the visible collection changed
    ///
    /// - Current story still visible: the index follows it, the timer keeps
    ///   running.
    /// - Index past the end: close.
    /// - Otherwise the story at the index replaced the current one; it is
    ///   entered like any other, with a fresh timer for its media kind.
    pub fn revalidate(&mut self, visible: &[StoryItem]) -> PlaybackEvent {
        let PlaybackState::Playing { index, story_id } = &self.state else {
            return PlaybackEvent::Unchanged;
        };
        let index = *index;

        if let Some(pos) = visible.iter().position(|s| &s.id == story_id) {
            if pos != index {
                tracing::debug!("Re-anchoring playback {} -> {}", index, pos);
                let story_id = story_id.clone();
                self.state = PlaybackState::Playing {
                    index: pos,
                    story_id,
                };
            }
            return PlaybackEvent::Unchanged;
        }

        match visible.get(index) {
            None => self.close_with(CloseReason::OutOfRange),
            Some(story) => self.enter(index, story),
        }
    }

    fn enter(&mut self, index: usize, story: &StoryItem) -> PlaybackEvent {
        self.cancel_pending();

        let delay = self.delays.for_kind(story.media_kind);
        self.pending = Some(self.timers.arm(
            delay,
            AdvanceTicket {
                generation: self.generation,
            },
        ));
        self.state = PlaybackState::Playing {
            index,
            story_id: story.id.clone(),
        };

        tracing::debug!("Playing story {} at {} for {:?}", story.id, index, delay);
        PlaybackEvent::Showing {
            index,
            story_id: story.id.clone(),
        }
    }

    fn close_with(&mut self, reason: CloseReason) -> PlaybackEvent {
        self.cancel_pending();
        self.state = PlaybackState::Closed;
        tracing::debug!("Playback closed: {:?}", reason);
        PlaybackEvent::Closed(reason)
    }

    /// Cancel the armed timer and invalidate any ticket it already queued
    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.cancel();
        }
        self.generation += 1;
    }
}

impl Drop for PlaybackMachine {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.cancel();
        }
    }
}

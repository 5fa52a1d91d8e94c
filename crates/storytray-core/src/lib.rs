//! Story Tray Core
//!
//! A locally cached, time-decaying collection of short-lived media items
//! ("stories"), merged with a remote source of truth, with per-viewer seen
//! tracking and timed full-screen playback.
//!
//! # Data Flow
//!
//! ```text
//! remote list ──fetch──▶ merge (union by id) ──▶ StoryCollection ──▶ persisted store
//!                                                      │
//!                                     expiry filter (retention window)
//!                                                      ▼
//!                                          visible stories, newest first
//!                                                      │
//!                        open ──▶ PlaybackMachine ──timer──▶ advance / close
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use storytray_core::prelude::*;
//!
//! # async fn example(collaborators: Collaborators) {
//! let viewer = Viewer::new("u-42").with_name("Ada");
//! let mut tray = StoryTray::load(TrayConfig::new(), viewer, collaborators).await;
//!
//! tray.reconcile().await;
//! for entry in tray.entries() {
//!     println!("{} seen={}", entry.label, entry.seen);
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod clock;
pub mod collection;
pub mod config;
pub mod driver;
pub mod entry;
pub mod error;
pub mod filter;
pub mod model;
pub mod playback;
pub mod publish;
pub mod reconcile;
pub mod seen;
pub mod service;
pub mod store;
pub mod timer;
pub mod tray;

// Re-exports for convenience
pub use clock::{Clock, SystemClock};
pub use collection::StoryCollection;
pub use config::TrayConfig;
pub use driver::{spawn_reconciled_tray, spawn_tray, TrayHandle, TraySnapshot};
pub use entry::TrayEntry;
pub use error::{ConfigError, DriverError, PublishError, RemoteError, StoreError, UploadError};
pub use model::{
    MediaFile, MediaKind, NewStory, Provenance, PublishRequest, StoryId, StoryItem, StoryRecord,
    Viewer,
};
pub use playback::{CloseReason, PlaybackEvent, PlaybackState};
pub use seen::SeenSet;
pub use service::{MediaUploader, StoryService};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use timer::{AdvanceTicket, TimerFactory, TokioTimers};
pub use tray::{Collaborators, StoryTray};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding a story tray
    pub use crate::{
        spawn_tray, Collaborators, MediaFile, MediaKind, PlaybackEvent, PlaybackState,
        PublishError, PublishRequest, StoryId, StoryItem, StoryTray, SystemClock, TokioTimers,
        TrayConfig, TrayEntry, TrayHandle, Viewer,
    };
}

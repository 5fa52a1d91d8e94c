//! Publish flow
//!
//! 1. Upload the media. Failure aborts; nothing is recorded.
//! 2. Register with the remote service. Failure degrades to a local story
//!    with a synthesized id and the client's clock.
//! 3. The caller inserts the story at the front and persists.
//!
//! Steps 1 and 2 run in [`Publisher::prepare`], which does not touch the
//! collection. [`PreparedStory::into_item`] builds the item for step 3.

use crate::collection::StoryCollection;
use crate::error::PublishError;
use crate::model::{NewStory, Provenance, PublishRequest, StoryItem, StoryRecord, Viewer, DEFAULT_VIEWER_NAME};
use crate::service::{MediaUploader, StoryService};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Runs the network half of a publish
#[derive(Clone)]
pub struct Publisher {
    uploader: Arc<dyn MediaUploader>,
    service: Arc<dyn StoryService>,
    category: String,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl Publisher {
    /// Create publisher uploading into `category`
    #[must_use]
    pub fn new(
        uploader: Arc<dyn MediaUploader>,
        service: Arc<dyn StoryService>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            uploader,
            service,
            category: category.into(),
        }
    }

    /// Upload and register
    ///
    /// # Errors
    /// - `PublishError::Upload` if the media could not be uploaded
    pub async fn prepare(&self, request: PublishRequest) -> Result<PreparedStory, PublishError> {
        let media_url = self
            .uploader
            .upload(&request.file, &self.category)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upload story {}: {}", request.file.file_name, e);
                PublishError::Upload(e)
            })?;
        tracing::debug!("Uploaded {} to {}", request.file.file_name, media_url);

        let uploaded = NewStory {
            media_url,
            media_kind: request.kind,
        };

        let registration = match self.service.create(&uploaded).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Story registration failed, keeping it local: {}", e);
                None
            }
        };

        Ok(PreparedStory {
            uploaded,
            registration,
        })
    }
}

/// An uploaded story waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStory {
    /// What was uploaded and registered
    pub uploaded: NewStory,
    /// Echo from the remote service, if registration succeeded
    pub registration: Option<StoryRecord>,
}

impl PreparedStory {
    /// Build the story item
    ///
    /// A usable echo yields a `Confirmed` item. Otherwise the item is `Local`,
    /// stamped with `now`, and gets an id not present in `collection`.
    #[must_use]
    pub fn into_item(
        self,
        viewer: &Viewer,
        collection: &StoryCollection,
        now: DateTime<Utc>,
    ) -> StoryItem {
        if let Some(item) = self
            .registration
            .and_then(|record| record.into_created(viewer, &self.uploaded, now))
        {
            return item;
        }

        StoryItem {
            id: collection.fresh_local_id(),
            owner_id: viewer.id.clone(),
            owner_display_name: viewer
                .display_name
                .clone()
                .unwrap_or_else(|| DEFAULT_VIEWER_NAME.to_string()),
            owner_avatar_url: viewer.avatar_url.clone(),
            media_url: self.uploaded.media_url,
            media_kind: self.uploaded.media_kind,
            created_at: now,
            provenance: Provenance::Local,
        }
    }
}

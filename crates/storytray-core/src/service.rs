//! External collaborators
//!
//! The tray only talks to the outside world through these traits. HTTP
//! implementations live in `storytray-http`.

use crate::error::{RemoteError, UploadError};
use crate::model::{MediaFile, NewStory, StoryRecord};
use async_trait::async_trait;

/// Remote source of truth for stories
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryService: Send + Sync {
    /// List stories visible to the authenticated viewer
    async fn list(&self) -> Result<Vec<StoryRecord>, RemoteError>;

    /// Register an uploaded story; the service echoes the created record
    async fn create(&self, story: &NewStory) -> Result<StoryRecord, RemoteError>;
}

/// Turns a local file into a durable URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload `file` under a logical destination category
    async fn upload(&self, file: &MediaFile, category: &str) -> Result<String, UploadError>;
}

//! Core types for the story tray
//!
//! Defines:
//! - Story identifiers and provenance
//! - The story item itself
//! - Partial remote records and how they resolve into items
//! - The viewer profile and publish inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use ulid::Ulid;

/// Prefix carried by every locally synthesized story id
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Fallback owner name for listed records without one
pub const DEFAULT_OWNER_NAME: &str = "User";

/// Fallback owner name for the viewer's own stories
pub const DEFAULT_VIEWER_NAME: &str = "You";

/// Unique story identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    /// Wrap a server-assigned id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh local id
    #[inline]
    #[must_use]
    pub fn local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Ulid::new()))
    }

    /// Whether this id was synthesized on this device
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of media payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image, shown for the image delay
    #[default]
    Image,
    /// Video clip, shown for the video delay
    Video,
}

impl MediaKind {
    /// Classify by MIME content type; anything not `video/*` is an image
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.trim().to_ascii_lowercase().starts_with("video") {
            Self::Video
        } else {
            Self::Image
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a story's identity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Synthesized on this device after registration failed
    Local,
    /// Issued or echoed by the remote content service
    Confirmed,
}

/// A short-lived media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryItem {
    /// Server id, or a `local-` id when registration failed
    pub id: StoryId,
    /// Id of the contributing user
    pub owner_id: String,
    /// Name shown in the strip
    pub owner_display_name: String,
    /// Owner avatar, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_avatar_url: Option<String>,
    /// Durable URL of the uploaded media
    pub media_url: String,
    /// Decides the auto-advance delay
    pub media_kind: MediaKind,
    /// Creation instant; visibility is measured from here
    pub created_at: DateTime<Utc>,
    /// Whether the server knows about this story
    #[serde(default = "default_provenance")]
    pub provenance: Provenance,
}

// Records written before provenance was tracked came from the server.
fn default_provenance() -> Provenance {
    Provenance::Confirmed
}

impl StoryItem {
    /// Whether the item was synthesized locally
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.provenance == Provenance::Local
    }

    /// Whether the given viewer contributed this item
    #[inline]
    #[must_use]
    pub fn is_owned_by(&self, viewer: &Viewer) -> bool {
        self.owner_id == viewer.id
    }
}

/// The logged-in viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// User id, matched against `StoryItem::owner_id`
    pub id: String,
    /// Name put on the viewer's own stories
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar used on own stories and as the strip fallback
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Viewer {
    /// Create viewer with id only
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            avatar_url: None,
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With avatar URL
    #[inline]
    #[must_use]
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// A story record as reported by the remote service
///
/// Every field is optional because the service is not trusted to send a
/// complete record. Resolution fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryRecord {
    /// Server id; records without one are unusable
    pub id: Option<String>,
    /// Contributing user
    pub owner_id: Option<String>,
    /// Owner name
    pub owner_display_name: Option<String>,
    /// Owner avatar
    pub owner_avatar_url: Option<String>,
    /// Media URL; listed records without one are unusable
    pub media_url: Option<String>,
    /// Declared media kind
    pub media_kind: Option<MediaKind>,
    /// Creation instant, if it could be read
    pub created_at: Option<DateTime<Utc>>,
}

impl StoryRecord {
    /// Resolve a listed record
    ///
    /// Records without an id or media URL cannot be shown and yield `None`.
    #[must_use]
    pub fn into_listed(self, now: DateTime<Utc>) -> Option<StoryItem> {
        let id = non_empty(self.id)?;
        let media_url = non_empty(self.media_url)?;

        Some(StoryItem {
            id: StoryId::new(id),
            owner_id: self.owner_id.unwrap_or_default(),
            owner_display_name: non_empty(self.owner_display_name)
                .unwrap_or_else(|| DEFAULT_OWNER_NAME.to_string()),
            owner_avatar_url: non_empty(self.owner_avatar_url),
            media_url,
            media_kind: self.media_kind.unwrap_or_default(),
            created_at: self.created_at.unwrap_or(now),
            provenance: Provenance::Confirmed,
        })
    }

    /// Resolve the echo of a create call
    ///
    /// Missing fields fall back to the viewer and to what was uploaded. A
    /// record without an id yields `None`; the caller treats that like a failed
    /// registration.
    #[must_use]
    pub fn into_created(
        self,
        viewer: &Viewer,
        uploaded: &NewStory,
        now: DateTime<Utc>,
    ) -> Option<StoryItem> {
        let id = non_empty(self.id)?;

        // The service may only upgrade an upload to video, never downgrade it.
        let media_kind = match self.media_kind {
            Some(MediaKind::Video) => MediaKind::Video,
            _ => uploaded.media_kind,
        };

        Some(StoryItem {
            id: StoryId::new(id),
            owner_id: non_empty(self.owner_id).unwrap_or_else(|| viewer.id.clone()),
            owner_display_name: non_empty(self.owner_display_name)
                .or_else(|| viewer.display_name.clone())
                .unwrap_or_else(|| DEFAULT_VIEWER_NAME.to_string()),
            owner_avatar_url: non_empty(self.owner_avatar_url).or_else(|| viewer.avatar_url.clone()),
            media_url: non_empty(self.media_url).unwrap_or_else(|| uploaded.media_url.clone()),
            media_kind,
            created_at: self.created_at.unwrap_or(now),
            provenance: Provenance::Confirmed,
        })
    }
}

impl From<&StoryItem> for StoryRecord {
    fn from(item: &StoryItem) -> Self {
        Self {
            id: Some(item.id.as_str().to_string()),
            owner_id: Some(item.owner_id.clone()),
            owner_display_name: Some(item.owner_display_name.clone()),
            owner_avatar_url: item.owner_avatar_url.clone(),
            media_url: Some(item.media_url.clone()),
            media_kind: Some(item.media_kind),
            created_at: Some(item.created_at),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Payload registered with the remote service after upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    /// URL returned by the uploader
    pub media_url: String,
    /// Declared kind, sent as `mediaType`
    #[serde(rename = "mediaType")]
    pub media_kind: MediaKind,
}

/// A local file picked for publishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Location on disk
    pub path: PathBuf,
    /// Name sent with the upload
    pub file_name: String,
    /// MIME type, when known
    pub content_type: Option<String>,
}

impl MediaFile {
    /// Create from path; the file name is taken from the last component
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self {
            path,
            file_name,
            content_type: None,
        }
    }

    /// With MIME content type
    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Media kind implied by the content type, if one is known
    #[must_use]
    pub fn inferred_kind(&self) -> Option<MediaKind> {
        self.content_type.as_deref().map(MediaKind::from_content_type)
    }
}

/// A publish request: a file plus its declared kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// File to upload
    pub file: MediaFile,
    /// Kind the story is published as
    pub kind: MediaKind,
}

impl PublishRequest {
    /// Create publish request
    #[inline]
    #[must_use]
    pub fn new(file: MediaFile, kind: MediaKind) -> Self {
        Self { file, kind }
    }

    /// Declare the kind from the file's content type, defaulting to image
    #[must_use]
    pub fn from_file(file: MediaFile) -> Self {
        let kind = file.inferred_kind().unwrap_or_default();
        Self { file, kind }
    }
}

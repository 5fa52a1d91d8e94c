//! Wire format of the status-stories API
//!
//! The service is loose about types: ids arrive as strings or numbers, and
//! timestamps as RFC 3339 strings or epoch milliseconds. Everything is
//! decoded leniently into [`StoryRecord`]; resolution in the core decides
//! what is usable.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use storytray_core::{MediaKind, StoryRecord};

/// Identifier as sent by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    /// Document id or other string key
    Text(String),
    /// Numeric key
    Number(serde_json::Number),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Timestamp as sent by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireTime {
    /// RFC 3339
    Text(String),
    /// Milliseconds since the Unix epoch
    Millis(i64),
}

impl WireTime {
    /// Parse; unreadable values yield `None`
    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| tracing::debug!("Unreadable createdAt '{}': {}", s, e))
                .ok(),
            Self::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        }
    }
}

/// One story record on the wire
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStory {
    /// `_id`, preferred over `id`
    #[serde(rename = "_id")]
    pub document_id: Option<WireId>,
    /// Plain `id`
    pub id: Option<WireId>,
    /// Owner id
    pub user_id: Option<WireId>,
    /// Owner name
    pub user_name: Option<String>,
    /// Owner avatar
    pub user_avatar: Option<String>,
    /// Media URL
    pub media_url: Option<String>,
    /// `"video"` or anything else for an image
    pub media_type: Option<String>,
    /// Creation time in either encoding
    pub created_at: Option<WireTime>,
}

impl From<WireStory> for StoryRecord {
    fn from(wire: WireStory) -> Self {
        let media_kind = wire.media_type.as_deref().map(|t| {
            if t.eq_ignore_ascii_case("video") {
                MediaKind::Video
            } else {
                MediaKind::Image
            }
        });

        Self {
            id: wire.document_id.or(wire.id).map(WireId::into_string),
            owner_id: wire.user_id.map(WireId::into_string),
            owner_display_name: wire.user_name,
            owner_avatar_url: wire.user_avatar,
            media_url: wire.media_url,
            media_kind,
            created_at: wire.created_at.as_ref().and_then(WireTime::to_utc),
        }
    }
}

/// Body of `GET /api/status-stories`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResponse {
    /// Listed records, decoded one at a time by [`ListResponse::into_records`]
    #[serde(default)]
    pub stories: Vec<serde_json::Value>,
}

impl ListResponse {
    /// Decode each listed record; a record that does not decode is skipped
    #[must_use]
    pub fn into_records(self) -> Vec<StoryRecord> {
        self.stories
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<WireStory>(value) {
                Ok(story) => Some(StoryRecord::from(story)),
                Err(e) => {
                    tracing::warn!("Skipping undecodable story record: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Body of `POST /api/status-stories`: wrapped or bare
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreateResponse {
    /// `{ "story": { ... } }`
    Wrapped {
        /// Created record
        story: WireStory,
    },
    /// The record itself
    Bare(WireStory),
}

impl CreateResponse {
    /// The created record, whichever shape it came in
    #[must_use]
    pub fn into_story(self) -> WireStory {
        match self {
            Self::Wrapped { story } | Self::Bare(story) => story,
        }
    }
}

/// Body returned by the upload service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    /// Durable media URL
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(json: &str) -> StoryRecord {
        serde_json::from_str::<WireStory>(json).unwrap().into()
    }

    #[test]
    fn document_id_preferred_over_id() {
        let r = record(r#"{"_id": "abc", "id": 7, "mediaUrl": "https://m/1"}"#);
        assert_eq!(r.id.as_deref(), Some("abc"));
    }

    #[test]
    fn numeric_ids_become_strings() {
        let r = record(r#"{"id": 42, "userId": 9}"#);
        assert_eq!(r.id.as_deref(), Some("42"));
        assert_eq!(r.owner_id.as_deref(), Some("9"));
    }

    #[test]
    fn media_type_mapping() {
        assert_eq!(
            record(r#"{"mediaType": "video"}"#).media_kind,
            Some(MediaKind::Video)
        );
        assert_eq!(
            record(r#"{"mediaType": "gif"}"#).media_kind,
            Some(MediaKind::Image)
        );
        assert_eq!(record("{}").media_kind, None);
    }

    #[test]
    fn created_at_accepts_both_encodings() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let text = record(r#"{"createdAt": "2026-03-01T13:00:00+01:00"}"#);
        assert_eq!(text.created_at, Some(expected));

        let millis = record(&format!(
            r#"{{"createdAt": {}}}"#,
            expected.timestamp_millis()
        ));
        assert_eq!(millis.created_at, Some(expected));

        assert_eq!(record(r#"{"createdAt": "yesterday"}"#).created_at, None);
        assert_eq!(record(r#"{"createdAt": null}"#).created_at, None);
    }

    #[test]
    fn list_without_stories_is_empty() {
        let list: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.into_records().is_empty());
    }

    #[test]
    fn malformed_record_skipped_rest_kept() {
        let list: ListResponse = serde_json::from_str(
            r#"{"stories": [
                {"_id": "good", "userId": "u1", "mediaUrl": "https://m/1"},
                {"_id": "pop", "userId": {"_id": "u1"}},
                {"_id": "also-good", "mediaType": "video"}
            ]}"#,
        )
        .unwrap();

        let ids: Vec<_> = list
            .into_records()
            .into_iter()
            .map(|r| r.id.unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["good", "also-good"]);
    }

    #[test]
    fn create_response_shapes() {
        let wrapped: CreateResponse =
            serde_json::from_str(r#"{"story": {"_id": "s1"}}"#).unwrap();
        let bare: CreateResponse = serde_json::from_str(r#"{"_id": "s1"}"#).unwrap();

        let a: StoryRecord = wrapped.into_story().into();
        let b: StoryRecord = bare.into_story().into();
        assert_eq!(a.id.as_deref(), Some("s1"));
        assert_eq!(a, b);
    }

    #[test]
    fn listed_record_without_media_is_dropped() {
        let now = Utc::now();
        let r = record(r#"{"_id": "s1", "userName": "Bo"}"#);
        assert!(r.into_listed(now).is_none());
    }
}

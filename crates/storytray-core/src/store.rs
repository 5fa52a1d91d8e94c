//! Local persisted store
//!
//! Two records, each a JSON document overwritten as a whole on every change:
//! - [`STORIES_RECORD`]: the full collection, expired stories included
//! - [`SEEN_RECORD`]: the seen ids
//!
//! Loading is forgiving. A missing, unreadable or corrupt record loads as
//! empty so the tray can always start.

use crate::collection::StoryCollection;
use crate::error::StoreError;
use crate::model::{StoryId, StoryItem};
use crate::seen::SeenSet;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Record key for the story collection
pub const STORIES_RECORD: &str = "stories_v1";

/// Record key for the seen set
pub const SEEN_RECORD: &str = "stories_seen_v1";

/// Whole-value key/value persistence
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read a record; `Ok(None)` if it was never written
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a record
    async fn write(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw record contents
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.records.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON file per record inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create store rooted at `dir`; the directory is created on first write
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io_error(&self.dir, e))?;

        // Atomic replace
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| StoreError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io_error(&path, e))
    }
}

/// Load the collection, treating any failure as empty
pub async fn load_collection(store: &dyn KeyValueStore) -> StoryCollection {
    match read_json::<Vec<StoryItem>>(store, STORIES_RECORD).await {
        Ok(items) => StoryCollection::from_items(items.unwrap_or_default()),
        Err(e) => {
            tracing::warn!("Discarding unreadable story cache: {}", e);
            StoryCollection::new()
        }
    }
}

/// Load the seen set, treating any failure as empty
pub async fn load_seen(store: &dyn KeyValueStore) -> SeenSet {
    match read_json::<Vec<StoryId>>(store, SEEN_RECORD).await {
        Ok(ids) => SeenSet::from_ids(ids.unwrap_or_default()),
        Err(e) => {
            tracing::warn!("Discarding unreadable seen set: {}", e);
            SeenSet::new()
        }
    }
}

/// Overwrite the collection record
pub async fn save_collection(
    store: &dyn KeyValueStore,
    collection: &StoryCollection,
) -> Result<(), StoreError> {
    write_json(store, STORIES_RECORD, &collection.to_vec()).await
}

/// Overwrite the seen record
pub async fn save_seen(store: &dyn KeyValueStore, seen: &SeenSet) -> Result<(), StoreError> {
    write_json(store, SEEN_RECORD, &seen.to_vec()).await
}

async fn read_json<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.read(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::codec_error(key, e))
}

async fn write_json<T: serde::Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::codec_error(key, e))?;
    store.write(key, raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaKind, Provenance};
    use chrono::{TimeZone, Utc};

    fn item(id: &str) -> StoryItem {
        StoryItem {
            id: StoryId::new(id),
            owner_id: "u".into(),
            owner_display_name: "U".into(),
            owner_avatar_url: Some("https://a/u.png".into()),
            media_url: format!("https://cdn/{id}"),
            media_kind: MediaKind::Video,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            provenance: Provenance::Local,
        }
    }

    #[tokio::test]
    async fn memory_store_persists_collection() {
        let store = MemoryStore::new();
        let collection = StoryCollection::from_items(vec![item("a"), item("b")]);
        save_collection(&store, &collection).await.unwrap();

        let loaded = load_collection(&store).await;
        assert_eq!(loaded, collection);
    }

    #[tokio::test]
    async fn missing_records_load_empty() {
        let store = MemoryStore::new();
        assert!(load_collection(&store).await.is_empty());
        assert!(load_seen(&store).await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_loads_empty() {
        let store = MemoryStore::new();
        store
            .write(STORIES_RECORD, "{not json".to_string())
            .await
            .unwrap();
        assert!(load_collection(&store).await.is_empty());
    }

    #[tokio::test]
    async fn file_store_round_trips_seen() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("tray"));

        let seen = SeenSet::from_ids(vec!["a".into(), "b".into()]);
        save_seen(&store, &seen).await.unwrap();

        let reopened = JsonFileStore::new(dir.path().join("tray"));
        assert_eq!(load_seen(&reopened).await, seen);
        assert!(dir.path().join("tray/stories_seen_v1.json").exists());
        assert!(!dir.path().join("tray/stories_seen_v1.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_store_overwrites_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.write("k", "first".into()).await.unwrap();
        store.write("k", "second".into()).await.unwrap();
        assert_eq!(store.read("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.read("absent").await.unwrap(), None);
    }
}

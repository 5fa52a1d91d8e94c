//! Remote reconciliation
//!
//! Split in two so the fetch can run without holding the tray:
//! 1. [`fetch_remote`] suspends on the network and resolves records
//! 2. [`crate::StoryCollection::merge_remote`] applies the result as a union
//!
//! Failures are soft. A failed fetch yields `None` and the caller keeps
//! whatever it already had.

use crate::model::StoryItem;
use crate::service::StoryService;
use chrono::{DateTime, Utc};

/// Fetch and resolve the remote story list
///
/// Returns `None` when the service is unreachable or answers with an error.
/// Records that cannot be shown (no id or media URL) are skipped.
pub async fn fetch_remote(service: &dyn StoryService, now: DateTime<Utc>) -> Option<Vec<StoryItem>> {
    let records = match service.list().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Story list unavailable, keeping local stories: {}", e);
            return None;
        }
    };

    let total = records.len();
    let items: Vec<StoryItem> = records
        .into_iter()
        .filter_map(|record| record.into_listed(now))
        .collect();

    if items.len() < total {
        tracing::warn!("Skipped {} incomplete story records", total - items.len());
    }
    tracing::debug!("Fetched {} remote stories", items.len());
    Some(items)
}

//! Tray strip view model

use crate::model::{StoryItem, Viewer};
use crate::seen::SeenSet;
use serde::Serialize;

/// Label shown under the viewer's own stories
pub const OWN_STORY_LABEL: &str = "Your story";

/// One bubble in the story strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayEntry {
    /// The story behind the bubble
    pub story: StoryItem,
    /// Whether the viewer has opened it
    pub seen: bool,
    /// Whether the viewer contributed it
    pub is_mine: bool,
    /// "Your story" or the owner's display name
    pub label: String,
    /// Owner avatar, else the viewer's
    pub avatar_url: Option<String>,
    /// Placeholder when there is no avatar
    pub initial: Option<char>,
}

impl TrayEntry {
    /// Build the entry for `story` as seen by `viewer`
    #[must_use]
    pub fn new(story: StoryItem, viewer: &Viewer, seen: &SeenSet) -> Self {
        let is_mine = story.is_owned_by(viewer);
        let label = if is_mine {
            OWN_STORY_LABEL.to_string()
        } else {
            story.owner_display_name.clone()
        };
        let avatar_url = story
            .owner_avatar_url
            .clone()
            .or_else(|| viewer.avatar_url.clone());
        let initial = story.owner_display_name.chars().next();

        Self {
            seen: seen.contains(&story.id),
            is_mine,
            label,
            avatar_url,
            initial,
            story,
        }
    }
}

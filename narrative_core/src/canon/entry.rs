//! Canon entries - curated, long-lived facts about the setting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Tag;

/// A curated encyclopedia entry.
///
/// Entities in a world state can point at an entry through `canonRef`; the
/// entry itself is never merged into the world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    /// Importance score (0.0 - 1.0) for prioritization.
    #[serde(default = "default_importance")]
    pub importance: f32,
}

fn default_importance() -> f32 {
    0.5
}

impl CanonEntry {
    /// Create a new entry with the given content.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            tags: BTreeSet::new(),
            importance: default_importance(),
        }
    }

    /// Add a tag to this entry.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Add multiple tags to this entry.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Set the importance score.
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    /// Check if this entry has a specific tag.
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}

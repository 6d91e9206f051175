//! Tag definitions - the keys canon entries are indexed by.

use serde::{Deserialize, Serialize};

/// Tags link canon entries to things that can show up in a world state.
///
/// Names are normalized (trimmed, lowercased) so a tag built from a
/// generator-written location name matches one written by a curator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Tag {
    /// A named character, creature, or object.
    Entity(String),

    /// A place.
    Location(String),

    /// A quest by label.
    Quest(String),

    /// A faction or organization.
    Faction(String),

    /// A concept or theme (e.g., "Magic", "Betrayal").
    Concept(String),

    /// Custom tag for extension.
    Custom(String),
}

fn normalize(name: impl Into<String>) -> String {
    name.into().trim().to_lowercase()
}

impl Tag {
    /// Create a new entity tag.
    pub fn entity(name: impl Into<String>) -> Self {
        Tag::Entity(normalize(name))
    }

    /// Create a new location tag.
    pub fn location(name: impl Into<String>) -> Self {
        Tag::Location(normalize(name))
    }

    /// Create a new quest tag.
    pub fn quest(label: impl Into<String>) -> Self {
        Tag::Quest(normalize(label))
    }

    /// Create a new faction tag.
    pub fn faction(name: impl Into<String>) -> Self {
        Tag::Faction(normalize(name))
    }

    /// Create a new concept tag.
    pub fn concept(name: impl Into<String>) -> Self {
        Tag::Concept(normalize(name))
    }

    /// Create a custom tag.
    pub fn custom(name: impl Into<String>) -> Self {
        Tag::Custom(normalize(name))
    }

    /// Get the category/type of this tag.
    pub fn category(&self) -> &'static str {
        match self {
            Tag::Entity(_) => "entity",
            Tag::Location(_) => "location",
            Tag::Quest(_) => "quest",
            Tag::Faction(_) => "faction",
            Tag::Concept(_) => "concept",
            Tag::Custom(_) => "custom",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Entity(s)
            | Tag::Location(s)
            | Tag::Quest(s)
            | Tag::Faction(s)
            | Tag::Concept(s)
            | Tag::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category(), self.name())
    }
}

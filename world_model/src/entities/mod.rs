//! Entity definitions for the world snapshot.

mod attributes;
mod player;

pub use attributes::*;
pub use player::*;

use serde::{Deserialize, Serialize};

use crate::world_state::Location;

/// Placeholder for scalar fields the generator has not described yet.
pub const UNKNOWN: &str = "Unknown";

/// A non-player character, creature, or object the story tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Generator-supplied identifier, unique within a snapshot.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default = "unknown")]
    pub activity: String,
    #[serde(default = "unknown")]
    pub condition: String,
    #[serde(default = "unknown")]
    pub relation_to_player: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Optional key into the long-term canon store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canon_ref: Option<String>,
}

impl Entity {
    /// Create an entity with every descriptive field set to `Unknown`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: Location::default(),
            activity: unknown(),
            condition: unknown(),
            relation_to_player: unknown(),
            attributes: Attributes::new(),
            canon_ref: None,
        }
    }

    /// Set the entity location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Set the entity condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Set the canon reference.
    pub fn with_canon_ref(mut self, canon_ref: impl Into<String>) -> Self {
        self.canon_ref = Some(canon_ref.into());
        self
    }
}

pub(crate) fn unknown() -> String {
    UNKNOWN.to_string()
}

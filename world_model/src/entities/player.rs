//! The player character.

use serde::{Deserialize, Serialize};

use super::{unknown, Attributes};
use crate::world_state::Location;

/// The player character as the story currently knows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub name: String,
    pub location: Location,
    pub condition: String,
    pub activity: String,
    /// What the player appears to be trying to do next.
    pub intent: String,
    /// Treated as a set: no duplicates, insertion order kept.
    pub inventory: Vec<String>,
    /// Treated as a set: no duplicates, insertion order kept.
    pub capabilities: Vec<String>,
    pub attributes: Attributes,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            location: Location::default(),
            condition: unknown(),
            activity: unknown(),
            intent: unknown(),
            inventory: Vec::new(),
            capabilities: Vec::new(),
            attributes: Attributes::new(),
        }
    }
}

impl Player {
    /// Create a player with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

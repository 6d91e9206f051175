//! World state - the snapshot of narrative facts attached to a conversation turn.

use serde::{Deserialize, Serialize};

use crate::entities::{unknown, Entity, Player};
use crate::patch::{apply_state_patch, StatePatch};
use crate::progress::{Quest, QuestStatus, StoryThread, ThreadStatus};

/// A place, as loosely as the narrative describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    /// Broader area the place sits in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Location {
    /// Create a location with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: None,
            detail: None,
        }
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(unknown())
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{} ({})", self.name, region),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Where and when the current scene takes place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scene {
    pub location: Location,
    /// Narrative time, free text ("dusk on the third day").
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atmosphere: Option<String>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            location: Location::default(),
            time: unknown(),
            weather: None,
            atmosphere: None,
        }
    }
}

/// The complete state of the story world immediately after a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldState {
    pub scene: Scene,
    pub player: Player,
    /// Tracked entities, unique by id, in introduction order.
    pub entities: Vec<Entity>,
    pub quests: Vec<Quest>,
    pub threads: Vec<StoryThread>,
    /// Established truths.
    pub facts: Vec<String>,
    /// Things the story suspects but has not confirmed.
    pub hypotheses: Vec<String>,
    /// Truths hidden from the player.
    pub secrets: Vec<String>,
}

impl WorldState {
    /// Create the default world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get entity by ID.
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Get quest by ID.
    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    /// Get thread by ID.
    pub fn thread(&self, id: &str) -> Option<&StoryThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// Entities currently at the scene location.
    pub fn entities_in_scene(&self) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.location.name == self.scene.location.name)
            .collect()
    }

    /// Quests with status `ACTIVE`.
    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests
            .iter()
            .filter(|q| q.status == QuestStatus::Active)
    }

    /// Threads still waiting for a resolution.
    pub fn open_threads(&self) -> impl Iterator<Item = &StoryThread> {
        self.threads
            .iter()
            .filter(|t| t.status == ThreadStatus::Unresolved)
    }

    /// Return the state that results from applying `patch`.
    pub fn apply(&self, patch: &StatePatch) -> WorldState {
        apply_state_patch(self, patch)
    }
}

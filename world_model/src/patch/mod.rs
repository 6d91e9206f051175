//! State patches - structured diffs produced by the generator.
//!
//! A patch is not a partial [`WorldState`](crate::WorldState): set-like fields
//! carry explicit add/remove lists, entities carry an explicit `deleted` flag,
//! and quests/threads are upserted by id. Every field is optional and an
//! omitted field leaves the current value untouched.

mod merge;

pub use merge::*;

use serde::{Deserialize, Serialize};

use crate::entities::Attributes;
use crate::progress::{QuestStatus, QuestStep, ThreadStatus};

/// Add/remove lists for a set-like field. Removal is applied first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SetDiff {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl SetDiff {
    /// A diff that only adds.
    pub fn adding<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            add: items.into_iter().map(Into::into).collect(),
            remove: Vec::new(),
        }
    }

    /// A diff that only removes.
    pub fn removing<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            add: Vec::new(),
            remove: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Sub-field overrides for a [`Location`](crate::Location).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LocationPatch {
    /// Patch that only renames the location.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScenePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atmosphere: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<SetDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<SetDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

/// Partial entity keyed by id.
///
/// When `deleted` is set every other field is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityPatch {
    pub id: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_to_player: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canon_ref: Option<String>,
}

impl EntityPatch {
    /// Create an empty patch for the given entity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Create a hard-delete patch.
    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            deleted: true,
            ..Self::new(id)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_location(mut self, location: LocationPatch) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_relation_to_player(mut self, relation: impl Into<String>) -> Self {
        self.relation_to_player = Some(relation.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Upsert entry for a quest. New quests need `label` and `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuestPatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestStatus>,
    /// Replaces the whole step list when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<QuestStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl QuestPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_status(mut self, status: QuestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_steps(mut self, steps: Vec<QuestStep>) -> Self {
        self.steps = Some(steps);
        self
    }
}

/// Upsert entry for a thread. New threads need `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThreadPatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ThreadStatus>,
}

impl ThreadPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: ThreadStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A structured diff from one [`WorldState`](crate::WorldState) to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<ScenePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerPatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntityPatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quests: Vec<QuestPatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub threads: Vec<ThreadPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<SetDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypotheses: Option<SetDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<SetDiff>,
}

impl StatePatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether applying this patch can change anything.
    pub fn is_empty(&self) -> bool {
        self.scene.is_none()
            && self.player.is_none()
            && self.entities.is_empty()
            && self.quests.is_empty()
            && self.threads.is_empty()
            && self.facts.as_ref().map_or(true, SetDiff::is_empty)
            && self.hypotheses.as_ref().map_or(true, SetDiff::is_empty)
            && self.secrets.as_ref().map_or(true, SetDiff::is_empty)
    }

    pub fn with_scene(mut self, scene: ScenePatch) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn with_player(mut self, player: PlayerPatch) -> Self {
        self.player = Some(player);
        self
    }

    pub fn with_entity(mut self, entity: EntityPatch) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_quest(mut self, quest: QuestPatch) -> Self {
        self.quests.push(quest);
        self
    }

    pub fn with_thread(mut self, thread: ThreadPatch) -> Self {
        self.threads.push(thread);
        self
    }

    pub fn with_facts(mut self, facts: SetDiff) -> Self {
        self.facts = Some(facts);
        self
    }

    pub fn with_hypotheses(mut self, hypotheses: SetDiff) -> Self {
        self.hypotheses = Some(hypotheses);
        self
    }

    pub fn with_secrets(mut self, secrets: SetDiff) -> Self {
        self.secrets = Some(secrets);
        self
    }
}

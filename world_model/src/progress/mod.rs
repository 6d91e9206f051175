//! Story progress: quests and open narrative threads.

use serde::{Deserialize, Serialize};

use crate::entities::Attributes;

/// Lifecycle of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    Active,
    Completed,
    Failed,
    Paused,
}

/// Lifecycle of a narrative thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadStatus {
    #[default]
    Unresolved,
    Resolved,
    Abandoned,
}

/// A single step of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStep {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl QuestStep {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            completed: false,
        }
    }

    pub fn done(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            completed: true,
        }
    }
}

/// A quest the player has picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub label: String,
    pub status: QuestStatus,
    #[serde(default)]
    pub steps: Vec<QuestStep>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Quest {
    /// Create an active quest with no steps.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status: QuestStatus::Active,
            steps: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Add a step.
    pub fn with_step(mut self, step: QuestStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// An open question or dangling plot point the story should eventually address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryThread {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub status: ThreadStatus,
}

impl StoryThread {
    /// Create an unresolved thread.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: ThreadStatus::Unresolved,
        }
    }
}

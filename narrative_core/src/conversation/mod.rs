//! Conversation module - the branching tree of turns.
//!
//! The tree is made of:
//! - **Nodes**: one turn each, with optional world-state snapshot
//! - **Child lists**: append-only alternatives per parent, in creation order
//! - **Active children**: the branch selected per parent for playback
//!
//! History is never deleted. Regenerations and rewrites add siblings; only the
//! selection cursors move.

mod content;
mod navigation;
mod node;
mod tree;
mod walk;

pub use content::*;
pub use navigation::*;
pub use node::*;
pub use tree::*;
pub use walk::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for conversation nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a node ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a node came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The root carrying the system prompt.
    Initiate,
    Reply,
    /// Alternate assistant take under the same parent.
    Regenerate,
    /// Edited copy of an existing turn under the same parent.
    Rewrite,
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

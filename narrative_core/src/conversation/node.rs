//! Conversation nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use world_model::WorldState;

use super::{ContentPart, NodeId, Relation, Role};

/// One turn in the conversation.
///
/// Nodes are never edited after creation; an edit is a new sibling with
/// [`Relation::Rewrite`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub relation: Relation,
    pub role: Role,
    pub parts: Vec<ContentPart>,
    /// Absent only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    pub created_at: DateTime<Utc>,
    /// State of the world immediately after this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_state: Option<WorldState>,
}

impl Node {
    pub(crate) fn new(
        relation: Relation,
        role: Role,
        parts: Vec<ContentPart>,
        parent_id: Option<NodeId>,
        world_state: Option<WorldState>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            relation,
            role,
            parts,
            parent_id,
            created_at: Utc::now(),
            world_state,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Concatenated text of the canonical text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

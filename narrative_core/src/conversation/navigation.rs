//! Moving between alternative takes of a turn.

use serde::{Deserialize, Serialize};

use super::{ConversationTree, NodeId};
use crate::error::TreeError;

/// Direction of sibling navigation. Both directions wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Next,
    Prev,
}

/// Where a node sits among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingPosition {
    pub index: usize,
    pub count: usize,
}

impl ConversationTree {
    /// Parent of `node_id` and the node's index in the parent's child list.
    fn locate_among_siblings(&self, node_id: NodeId) -> Result<(NodeId, usize), TreeError> {
        let parent_id = self
            .node(node_id)
            .ok_or(TreeError::NodeNotFound(node_id))?
            .parent_id
            .ok_or(TreeError::RootHasNoParent(node_id))?;

        let index = self
            .children_of(parent_id)
            .iter()
            .position(|id| *id == node_id)
            .ok_or(TreeError::NotAChild {
                parent: parent_id,
                child: node_id,
            })?;

        Ok((parent_id, index))
    }

    /// Index of `node_id` among its parent's children.
    pub fn sibling_position(&self, node_id: NodeId) -> Result<SiblingPosition, TreeError> {
        let (parent_id, index) = self.locate_among_siblings(node_id)?;
        Ok(SiblingPosition {
            index,
            count: self.children_of(parent_id).len(),
        })
    }

    /// The sibling next to `node_id` in `direction`, wrapping at either end.
    pub fn neighbour(&self, node_id: NodeId, direction: Direction) -> Result<NodeId, TreeError> {
        let (parent_id, index) = self.locate_among_siblings(node_id)?;
        let siblings = self.children_of(parent_id);
        let count = siblings.len();
        let target = match direction {
            Direction::Next => (index + 1) % count,
            Direction::Prev => (index + count - 1) % count,
        };
        Ok(siblings[target])
    }

    /// Select the neighbouring sibling and move the head along its active branch.
    pub fn navigate_sibling(
        &self,
        node_id: NodeId,
        direction: Direction,
    ) -> Result<Self, TreeError> {
        let target = self.neighbour(node_id, direction)?;
        self.set_active(target, false)
    }
}

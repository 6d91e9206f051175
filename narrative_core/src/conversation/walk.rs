//! Reading the tree back as ordered sequences of turns.

use world_model::WorldState;

use super::{ConversationTree, Node, NodeId};
use crate::error::TreeError;

/// Iterator over a node and its ancestors, nearest first.
///
/// Bounded by the tree size, so a corrupt parent cycle cannot loop forever.
pub struct Ancestors<'a> {
    tree: &'a ConversationTree,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.tree.node(self.cursor?)?;
        self.remaining -= 1;
        self.cursor = node.parent_id;
        Some(node)
    }
}

impl ConversationTree {
    /// Walk parent pointers from `from` (inclusive) up to the root.
    pub fn ancestors(&self, from: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            cursor: Some(from),
            remaining: self.len(),
        }
    }

    /// Nodes from the head backwards, returned in chronological order.
    ///
    /// At most `limit` nodes are collected. With `stop_at_root` the root
    /// (system prompt) is left out.
    pub fn path_nodes_from_head(&self, limit: usize, stop_at_root: bool) -> Vec<&Node> {
        let mut path: Vec<&Node> = self
            .ancestors(self.head_id())
            .take_while(|node| !(stop_at_root && node.is_root()))
            .take(limit)
            .collect();
        path.reverse();
        path
    }

    /// Nodes from the root forward along active children, in order.
    ///
    /// The root is included. `limit` bounds the walk.
    pub fn active_path_nodes(&self, limit: usize) -> Vec<&Node> {
        let mut path = Vec::new();
        let mut cursor = Some(self.root_id());

        while let Some(id) = cursor {
            if path.len() >= limit {
                break;
            }
            let Some(node) = self.node(id) else { break };
            path.push(node);
            cursor = self.active_child_of(id);
        }

        path
    }

    /// Follow active children from the root to the first node without one.
    pub fn recalculate_head_id(&self) -> NodeId {
        let mut head = self.root_id();
        // A well-formed tree never needs more steps than it has nodes.
        for _ in 0..self.len() {
            match self.active_child_of(head) {
                Some(next) if self.contains(next) => head = next,
                _ => break,
            }
        }
        head
    }

    /// World state as of `from`: the nearest snapshot on the ancestor path.
    ///
    /// Falls back to the default state when no ancestor carries one.
    pub fn resolve_world_state(&self, from: NodeId) -> Result<WorldState, TreeError> {
        if !self.contains(from) {
            return Err(TreeError::NodeNotFound(from));
        }
        Ok(self
            .ancestors(from)
            .find_map(|node| node.world_state.clone())
            .unwrap_or_default())
    }

    /// World state as of the head.
    pub fn current_world_state(&self) -> WorldState {
        self.ancestors(self.head_id())
            .find_map(|node| node.world_state.clone())
            .unwrap_or_default()
    }
}

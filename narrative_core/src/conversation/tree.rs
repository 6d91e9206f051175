//! The conversation tree - structure, growth, and branch selection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use world_model::WorldState;

use super::{ContentPart, Node, NodeId, Relation, Role};
use crate::error::TreeError;

/// A branching conversation.
///
/// The tree keeps three views of the same structure: parent pointers on the
/// nodes, a child list per parent, and an active child per parent. All three
/// are only ever updated together, inside [`ConversationTree::add_child`] and
/// [`ConversationTree::set_active`].
///
/// Every operation takes `&self` and returns a new snapshot; the receiver is
/// left untouched, including when the operation fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTree")]
pub struct ConversationTree {
    root_id: NodeId,
    head_id: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    /// Parent -> children in creation order.
    children: BTreeMap<NodeId, Vec<NodeId>>,
    /// Parent -> child selected for playback.
    active_child: BTreeMap<NodeId, NodeId>,
}

/// Wire form of a tree, before its indices are checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTree {
    root_id: NodeId,
    head_id: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    #[serde(default)]
    children: BTreeMap<NodeId, Vec<NodeId>>,
    #[serde(default)]
    active_child: BTreeMap<NodeId, NodeId>,
}

impl TryFrom<RawTree> for ConversationTree {
    type Error = TreeError;

    fn try_from(raw: RawTree) -> Result<Self, TreeError> {
        let tree = Self {
            root_id: raw.root_id,
            head_id: raw.head_id,
            nodes: raw.nodes,
            children: raw.children,
            active_child: raw.active_child,
        };
        tree.validate()?;
        Ok(tree)
    }
}

impl ConversationTree {
    /// Create a tree whose single root node carries the system prompt.
    pub fn new(system_prompt: impl Into<String>, initial_state: Option<WorldState>) -> Self {
        let root = Node::new(
            Relation::Initiate,
            Role::System,
            vec![ContentPart::text(system_prompt)],
            None,
            initial_state,
        );
        let root_id = root.id;

        Self {
            root_id,
            head_id: root_id,
            nodes: BTreeMap::from([(root_id, root)]),
            children: BTreeMap::new(),
            active_child: BTreeMap::new(),
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// The node currently being viewed or extended.
    pub fn head_id(&self) -> NodeId {
        self.head_id
    }

    pub fn root(&self) -> &Node {
        &self.nodes[&self.root_id]
    }

    pub fn head(&self) -> &Node {
        &self.nodes[&self.head_id]
    }

    /// Get node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Child ids of a node in creation order.
    pub fn children_of(&self, parent_id: NodeId) -> &[NodeId] {
        self.children
            .get(&parent_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The branch selected under a node, if any.
    pub fn active_child_of(&self, parent_id: NodeId) -> Option<NodeId> {
        self.active_child.get(&parent_id).copied()
    }

    /// The system prompt text held by the root.
    pub fn system_prompt(&self) -> String {
        self.root().text()
    }

    /// Ordered alternatives under a parent, in creation order.
    pub fn alternatives(&self, parent_id: NodeId) -> Vec<&Node> {
        self.children_of(parent_id)
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    fn require(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    fn require_parent(&self, id: NodeId) -> Result<NodeId, TreeError> {
        self.require(id)?
            .parent_id
            .ok_or(TreeError::RootHasNoParent(id))
    }

    /// The only place nodes enter the tree.
    ///
    /// Callers must have checked that `parent_id` exists.
    fn insert_node(
        &mut self,
        parent_id: NodeId,
        relation: Relation,
        role: Role,
        parts: Vec<ContentPart>,
        state: Option<WorldState>,
    ) -> NodeId {
        let node = Node::new(relation, role, parts, Some(parent_id), state);
        let id = node.id;
        self.nodes.insert(id, node);

        let siblings = self.children.entry(parent_id).or_default();
        if !siblings.contains(&id) {
            siblings.push(id);
        }
        self.active_child.insert(parent_id, id);
        self.head_id = id;

        debug!(node = %id, parent = %parent_id, ?relation, ?role, "added node");
        id
    }

    /// Create a node under `parent_id`, select it, and move the head to it.
    ///
    /// The new node's id is the returned tree's [`head_id`](Self::head_id).
    pub fn add_child(
        &self,
        parent_id: NodeId,
        relation: Relation,
        role: Role,
        parts: Vec<ContentPart>,
        state: Option<WorldState>,
    ) -> Result<Self, TreeError> {
        self.require(parent_id)?;
        let mut next = self.clone();
        next.insert_node(parent_id, relation, role, parts, state);
        Ok(next)
    }

    /// Append a user turn at the head.
    pub fn append_user(&self, text: impl Into<String>) -> Result<Self, TreeError> {
        self.add_child(
            self.head_id,
            Relation::Reply,
            Role::User,
            vec![ContentPart::text(text)],
            None,
        )
    }

    /// Append an assistant reply under `parent_id`.
    pub fn reply_assistant(
        &self,
        parent_id: NodeId,
        parts: Vec<ContentPart>,
        state: Option<WorldState>,
    ) -> Result<Self, TreeError> {
        self.add_child(parent_id, Relation::Reply, Role::Assistant, parts, state)
    }

    /// Add an alternate assistant take next to `target_id`.
    ///
    /// The original and its descendants stay in the tree.
    pub fn regenerate_assistant(
        &self,
        target_id: NodeId,
        parts: Vec<ContentPart>,
        state: Option<WorldState>,
    ) -> Result<Self, TreeError> {
        let parent_id = self.require_parent(target_id)?;
        self.add_child(parent_id, Relation::Regenerate, Role::Assistant, parts, state)
    }

    /// Add an edited copy of `target_id` next to it, keeping its role.
    ///
    /// The copy carries no world state; readers recover it from ancestors.
    pub fn rewrite_node(
        &self,
        target_id: NodeId,
        parts: Vec<ContentPart>,
    ) -> Result<Self, TreeError> {
        let parent_id = self.require_parent(target_id)?;
        let role = self.nodes[&target_id].role;
        self.add_child(parent_id, Relation::Rewrite, role, parts, None)
    }

    /// Select `target_id` as its parent's active child.
    ///
    /// With `move_head` the head follows the selection; otherwise the head is
    /// recomputed from the root along active children, so the head path and
    /// active path agree afterwards.
    pub fn set_active(&self, target_id: NodeId, move_head: bool) -> Result<Self, TreeError> {
        let parent_id = self.require_parent(target_id)?;
        if !self.children_of(parent_id).contains(&target_id) {
            return Err(TreeError::NotAChild {
                parent: parent_id,
                child: target_id,
            });
        }

        let mut next = self.clone();
        next.active_child.insert(parent_id, target_id);
        next.head_id = if move_head {
            target_id
        } else {
            next.recalculate_head_id()
        };

        debug!(node = %target_id, parent = %parent_id, head = %next.head_id, "selected branch");
        Ok(next)
    }

    /// Point the head at `node_id` without changing any selection.
    ///
    /// Used to rewind context for a provisional request. Afterwards the head
    /// path may differ from the active path until the next growing operation
    /// or [`set_active`](Self::set_active).
    pub fn set_head(&self, node_id: NodeId) -> Result<Self, TreeError> {
        self.require(node_id)?;
        let mut next = self.clone();
        next.head_id = node_id;
        Ok(next)
    }

    /// Check every index invariant. Runs on every deserialized tree.
    pub fn validate(&self) -> Result<(), TreeError> {
        let corrupt = |reason: String| Err(TreeError::Corrupt(reason));

        let roots: Vec<_> = self.nodes.values().filter(|n| n.is_root()).collect();
        if roots.len() != 1 || roots[0].id != self.root_id {
            return corrupt(format!("expected exactly one root {}", self.root_id));
        }
        if !self.contains(self.head_id) {
            return corrupt(format!("head {} is not a node", self.head_id));
        }

        for (key, node) in &self.nodes {
            if *key != node.id {
                return corrupt(format!("node stored under {} has id {}", key, node.id));
            }
            if let Some(parent_id) = node.parent_id {
                if !self.contains(parent_id) {
                    return corrupt(format!("node {} has missing parent {}", node.id, parent_id));
                }
                if !self.children_of(parent_id).contains(&node.id) {
                    return corrupt(format!(
                        "node {} is missing from its parent's children",
                        node.id
                    ));
                }
            }
        }

        for (parent_id, children) in &self.children {
            for child_id in children {
                let parent_matches = self
                    .nodes
                    .get(child_id)
                    .is_some_and(|child| child.parent_id == Some(*parent_id));
                if !parent_matches {
                    return corrupt(format!(
                        "edge {} -> {} has no matching node",
                        parent_id, child_id
                    ));
                }
            }
        }

        for (parent_id, child_id) in &self.active_child {
            if !self.children_of(*parent_id).contains(child_id) {
                return corrupt(format!(
                    "active child {} is not a child of {}",
                    child_id, parent_id
                ));
            }
        }

        // Parent chains must reach the root.
        for node in self.nodes.values() {
            if self.ancestors(node.id).last().map(|n| n.id) != Some(self.root_id) {
                return corrupt(format!("node {} does not descend from the root", node.id));
            }
        }

        Ok(())
    }
}

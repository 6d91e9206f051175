//! Context Assembler - turns a tree snapshot into a generation request.
//!
//! Assembly works as follows:
//! 1. **History**: walk back from the head, render each turn as role-tagged text
//! 2. **Inline state**: optionally append the world state to the latest user turn
//! 3. **Canon**: entries referenced by entities first, then by tag relevance
//! 4. **Chronicle**: the most recent entries
//! 5. **Bundle**: system prompt, turns, canon, chronicle, and current world state

mod relevance;

pub use relevance::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;
use world_model::WorldState;

use crate::canon::{CanonEntry, CanonStore, Chronicle, ChronicleEntry, Tag};
use crate::config::EngineConfig;
use crate::conversation::{ContentPart, ConversationTree, Node, NodeId, Role};

/// Weight of the scene location and region tags.
const LOCATION_WEIGHT: f32 = 1.0;
/// Weight of entities present in the scene.
const ENTITY_WEIGHT: f32 = 0.8;
/// Weight of active quest labels.
const QUEST_WEIGHT: f32 = 0.6;

/// One turn of history as the generator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTurn {
    pub node_id: NodeId,
    pub role: Role,
    pub content: String,
}

/// Reference material sent alongside the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBundle {
    pub canon: Vec<CanonEntry>,
    pub chronicle: Vec<ChronicleEntry>,
    pub world_state: WorldState,
}

/// Everything the generation collaborator receives for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub system_prompt: String,
    /// Chronological turns, system prompt excluded.
    pub turns: Vec<RenderedTurn>,
    pub context: ContextBundle,
}

impl GenerationRequest {
    /// The most recent user turn, if any.
    pub fn latest_user_turn(&self) -> Option<&RenderedTurn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }
}

/// Builds generation requests from a tree snapshot and reference material.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    config: EngineConfig,
}

impl ContextAssembler {
    /// Create a new context assembler with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Create a context assembler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn render_node(&self, node: &Node) -> RenderedTurn {
        let content = node
            .parts
            .iter()
            .filter(|part| self.config.render_thoughts || part.is_canonical())
            .map(ContentPart::render)
            .collect::<Vec<_>>()
            .join("\n");

        RenderedTurn {
            node_id: node.id,
            role: node.role,
            content,
        }
    }

    /// Render the selected branch from the root, system prompt excluded.
    ///
    /// This is the canonical playback of the story, independent of where the
    /// head currently sits.
    pub fn render_playback(&self, tree: &ConversationTree) -> Vec<RenderedTurn> {
        tree.active_path_nodes(self.config.active_path_limit)
            .into_iter()
            .filter(|node| !node.is_root())
            .map(|node| self.render_node(node))
            .collect()
    }

    /// Render the head path as role-tagged turns, system prompt excluded.
    ///
    /// When `state` is given and inlining is enabled, the most recent user
    /// turn is suffixed with the state as JSON.
    pub fn render_history(
        &self,
        tree: &ConversationTree,
        state: Option<&WorldState>,
    ) -> Vec<RenderedTurn> {
        let mut turns: Vec<RenderedTurn> = tree
            .path_nodes_from_head(self.config.history_limit, true)
            .into_iter()
            .map(|node| self.render_node(node))
            .collect();

        let Some(state) = state.filter(|_| self.config.inline_world_state) else {
            return turns;
        };
        let Some(latest_user) = turns.iter_mut().rev().find(|t| t.role == Role::User) else {
            return turns;
        };

        match serde_json::to_string_pretty(state) {
            Ok(json) => {
                latest_user.content.push_str("\n\n[Current world state]\n");
                latest_user.content.push_str(&json);
            }
            Err(err) => warn!(error = %err, "could not inline world state"),
        }

        turns
    }

    /// Tags describing what is on stage right now, with their weights.
    fn trigger_tags(&self, state: &WorldState) -> Vec<(Tag, f32)> {
        let mut tags = vec![(Tag::location(state.scene.location.name.as_str()), LOCATION_WEIGHT)];
        if let Some(region) = &state.scene.location.region {
            tags.push((Tag::location(region.as_str()), LOCATION_WEIGHT));
        }

        for entity in state.entities_in_scene() {
            tags.push((Tag::entity(entity.name.as_str()), ENTITY_WEIGHT));
        }

        for quest in state.active_quests() {
            tags.push((Tag::quest(quest.label.as_str()), QUEST_WEIGHT));
        }

        tags
    }

    /// Score canon entries by the tags they share with the world state.
    ///
    /// Entries are scored by the sum of matched tag weights multiplied by importance.
    pub fn score_canon(&self, canon: &CanonStore, state: &WorldState) -> RelevanceScores {
        let mut scores = RelevanceScores::new();
        for (tag, weight) in self.trigger_tags(state) {
            for entry in canon.entries_by_tag(&tag) {
                scores.add(entry.id.as_str(), weight * entry.importance);
            }
        }
        scores
    }

    /// Pick the canon entries for a request.
    ///
    /// Entries referenced by an entity's `canonRef` come first, in entity
    /// order; the rest is filled by relevance up to `max_canon_entries`.
    pub fn select_canon<'a>(
        &self,
        canon: &'a CanonStore,
        state: &WorldState,
    ) -> Vec<&'a CanonEntry> {
        let limit = self.config.max_canon_entries;
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        let referenced = state
            .entities
            .iter()
            .filter_map(|e| e.canon_ref.as_deref())
            .filter_map(|id| canon.get(id));

        let scores = self.score_canon(canon, state);
        let relevant = scores
            .ranked(0.0)
            .into_iter()
            .filter_map(|(id, _)| canon.get(id));

        for entry in referenced.chain(relevant) {
            if selected.len() >= limit {
                break;
            }
            if seen.insert(entry.id.as_str()) {
                selected.push(entry);
            }
        }

        selected
    }

    /// Assemble a complete generation request from the head of `tree`.
    pub fn assemble(
        &self,
        tree: &ConversationTree,
        canon: &CanonStore,
        chronicle: &Chronicle,
        state: &WorldState,
    ) -> GenerationRequest {
        GenerationRequest {
            system_prompt: tree.system_prompt(),
            turns: self.render_history(tree, Some(state)),
            context: ContextBundle {
                canon: self.select_canon(canon, state).into_iter().cloned().collect(),
                chronicle: chronicle.tail(self.config.chronicle_tail).to_vec(),
                world_state: state.clone(),
            },
        }
    }
}

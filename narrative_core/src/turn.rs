//! The turn pipeline.
//!
//! A turn runs as follows:
//! 1. **Grow**: append the user turn (or pick the node being regenerated)
//! 2. **Recover**: resolve the world state from the ancestors of the new turn
//! 3. **Assemble**: render history and reference material into a request
//! 4. **Generate**: call the provider
//! 5. **Merge**: fold the returned patch into the recovered state
//! 6. **Commit**: attach the reply and its state to the tree
//!
//! Every step works on snapshots, so a failure anywhere leaves the caller's
//! session exactly as it was.

use tracing::{info, warn};
use world_model::WorldState;

use crate::config::EngineConfig;
use crate::context_assembler::ContextAssembler;
use crate::conversation::{ContentPart, ConversationTree, NodeId, Role};
use crate::error::{Result, TreeError};
use crate::provider::{GenerationOutput, GenerationProvider};
use crate::session::Session;

/// What happened to the patch returned with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Merged and attached to the reply.
    Applied,
    /// The provider returned no patch; the reply carries no state.
    Absent,
    /// The patch did not have the state patch shape and was dropped.
    Rejected(String),
}

/// Result of a committed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The new snapshot, with the head at the reply.
    pub tree: ConversationTree,
    pub reply_id: NodeId,
    /// World state as of the reply.
    pub world_state: WorldState,
    pub patch: PatchOutcome,
}

impl TurnOutcome {
    /// Replace the session's tree with the committed one.
    pub fn commit_to(self, session: &mut Session) -> NodeId {
        session.tree = self.tree;
        self.reply_id
    }
}

/// Merged state, the snapshot to attach (if any), and the patch outcome.
struct Merged {
    state: WorldState,
    attach: Option<WorldState>,
    outcome: PatchOutcome,
}

/// Drives turns against a [`GenerationProvider`].
#[derive(Debug, Clone, Default)]
pub struct TurnEngine {
    assembler: ContextAssembler,
}

impl TurnEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            assembler: ContextAssembler::new(config),
        }
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    fn generate<P>(
        &self,
        session: &Session,
        request_tree: &ConversationTree,
        state: &WorldState,
        provider: &P,
    ) -> Result<GenerationOutput>
    where
        P: GenerationProvider + ?Sized,
    {
        let request = self
            .assembler
            .assemble(request_tree, &session.canon, &session.chronicle, state);

        provider.generate(&request).map_err(|err| {
            warn!(head = %request_tree.head_id(), error = %err, "generation failed");
            err.into()
        })
    }

    fn merge(base: &WorldState, output: &GenerationOutput) -> Merged {
        match output.state_patch() {
            Ok(Some(patch)) => {
                let state = base.apply(&patch);
                Merged {
                    attach: Some(state.clone()),
                    state,
                    outcome: PatchOutcome::Applied,
                }
            }
            Ok(None) => Merged {
                state: base.clone(),
                attach: None,
                outcome: PatchOutcome::Absent,
            },
            Err(err) => {
                warn!(error = %err, "dropping malformed state patch");
                Merged {
                    state: base.clone(),
                    attach: None,
                    outcome: PatchOutcome::Rejected(err.to_string()),
                }
            }
        }
    }

    /// Reply to `tree`'s head, which must be the turn being answered.
    fn reply_to_head<P>(
        &self,
        session: &Session,
        tree: ConversationTree,
        provider: &P,
    ) -> Result<TurnOutcome>
    where
        P: GenerationProvider + ?Sized,
    {
        let parent_id = tree.head_id();
        let base = tree.current_world_state();
        let output = self.generate(session, &tree, &base, provider)?;
        let merged = Self::merge(&base, &output);

        let tree = tree.reply_assistant(parent_id, output.parts, merged.attach)?;
        let reply_id = tree.head_id();
        info!(reply = %reply_id, parent = %parent_id, patch = ?merged.outcome, "committed reply");

        Ok(TurnOutcome {
            tree,
            reply_id,
            world_state: merged.state,
            patch: merged.outcome,
        })
    }

    /// Append a user turn at the head and generate the reply to it.
    pub fn play_turn<P>(&self, session: &Session, provider: &P, text: &str) -> Result<TurnOutcome>
    where
        P: GenerationProvider + ?Sized,
    {
        let tree = session.tree.append_user(text)?;
        info!(user = %tree.head_id(), "appended user turn");
        self.reply_to_head(session, tree, provider)
    }

    /// Replace a user turn with edited text and generate a fresh reply.
    ///
    /// The original turn and everything below it stay in the tree. Only user
    /// turns can be edited; anything else fails before the provider is called.
    pub fn edit_user_turn<P>(
        &self,
        session: &Session,
        provider: &P,
        target_id: NodeId,
        text: &str,
    ) -> Result<TurnOutcome>
    where
        P: GenerationProvider + ?Sized,
    {
        let target = session
            .tree
            .node(target_id)
            .ok_or(TreeError::NodeNotFound(target_id))?;
        if target.role != Role::User {
            return Err(TreeError::WrongRole {
                node: target_id,
                expected: Role::User,
            }
            .into());
        }

        let tree = session
            .tree
            .rewrite_node(target_id, vec![ContentPart::text(text)])?;
        info!(original = %target_id, rewrite = %tree.head_id(), "rewrote user turn");
        self.reply_to_head(session, tree, provider)
    }

    /// Generate an alternate take of the assistant turn `target_id`.
    ///
    /// The request is built as if the head sat on the target's parent; the
    /// committed tree has the new take as active child and head.
    pub fn regenerate<P>(
        &self,
        session: &Session,
        provider: &P,
        target_id: NodeId,
    ) -> Result<TurnOutcome>
    where
        P: GenerationProvider + ?Sized,
    {
        let parent_id = session
            .tree
            .node(target_id)
            .ok_or(TreeError::NodeNotFound(target_id))?
            .parent_id
            .ok_or(TreeError::RootHasNoParent(target_id))?;

        let provisional = session.tree.set_head(parent_id)?;
        let base = provisional.current_world_state();
        let output = self.generate(session, &provisional, &base, provider)?;
        let merged = Self::merge(&base, &output);

        let tree = session
            .tree
            .regenerate_assistant(target_id, output.parts, merged.attach)?;
        let reply_id = tree.head_id();
        info!(
            reply = %reply_id,
            original = %target_id,
            patch = ?merged.outcome,
            "committed regeneration"
        );

        Ok(TurnOutcome {
            tree,
            reply_id,
            world_state: merged.state,
            patch: merged.outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_assembler::GenerationRequest;
    use crate::conversation::Relation;
    use crate::error::{ProviderError, SessionError};
    use serde_json::json;
    use std::cell::RefCell;

    /// Replays canned outputs and records the requests it saw.
    struct Scripted {
        outputs: RefCell<Vec<std::result::Result<GenerationOutput, ProviderError>>>,
        seen: RefCell<Vec<GenerationRequest>>,
    }

    impl Scripted {
        fn new(outputs: Vec<std::result::Result<GenerationOutput, ProviderError>>) -> Self {
            Self {
                outputs: RefCell::new(outputs.into_iter().rev().collect()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl GenerationProvider for Scripted {
        fn generate(
            &self,
            request: &GenerationRequest,
        ) -> std::result::Result<GenerationOutput, ProviderError> {
            self.seen.borrow_mut().push(request.clone());
            self.outputs
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::new("script exhausted")))
        }
    }

    fn goblin_output() -> GenerationOutput {
        GenerationOutput::text("A goblin leaps out!").with_raw_patch(json!({
            "entities": [{"id": "e1", "name": "Goblin", "condition": "Hostile"}]
        }))
    }

    #[test]
    fn test_play_turn_commits_reply_with_state() {
        let session = Session::new("narrate", None);
        let provider = Scripted::new(vec![Ok(goblin_output())]);

        let outcome = TurnEngine::default()
            .play_turn(&session, &provider, "I open the door")
            .unwrap();

        assert_eq!(outcome.patch, PatchOutcome::Applied);
        assert_eq!(outcome.tree.len(), 3);
        let reply = outcome.tree.node(outcome.reply_id).unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.text(), "A goblin leaps out!");
        assert_eq!(
            reply.world_state.as_ref().unwrap().entity("e1").unwrap().condition,
            "Hostile"
        );
        assert_eq!(outcome.world_state.entities.len(), 1);

        let seen = provider.seen.borrow();
        assert_eq!(seen[0].turns.len(), 1);
        assert!(seen[0].turns[0].content.starts_with("I open the door"));
        assert_eq!(seen[0].system_prompt, "narrate");
    }

    #[test]
    fn test_provider_failure_leaves_session_untouched() {
        let session = Session::new("narrate", None);
        let provider = Scripted::new(vec![Err(ProviderError::new("timeout"))]);

        let result = TurnEngine::default().play_turn(&session, &provider, "hello");

        assert!(matches!(result, Err(SessionError::Provider(_))));
        assert_eq!(session.tree.len(), 1);
    }

    #[test]
    fn test_missing_patch_carries_no_state() {
        let session = Session::new("narrate", Some(WorldState::new()));
        let provider = Scripted::new(vec![Ok(GenerationOutput::text("Nothing happens."))]);

        let outcome = TurnEngine::default().play_turn(&session, &provider, "wait").unwrap();

        assert_eq!(outcome.patch, PatchOutcome::Absent);
        assert!(outcome.tree.node(outcome.reply_id).unwrap().world_state.is_none());
        assert_eq!(outcome.world_state, WorldState::new());
    }

    #[test]
    fn test_malformed_patch_is_dropped() {
        let session = Session::new("narrate", None);
        let output = GenerationOutput::text("Odd.").with_raw_patch(json!({"facts": 7}));
        let provider = Scripted::new(vec![Ok(output)]);

        let outcome = TurnEngine::default().play_turn(&session, &provider, "look").unwrap();

        assert!(matches!(outcome.patch, PatchOutcome::Rejected(_)));
        assert_eq!(outcome.tree.head().text(), "Odd.");
    }

    #[test]
    fn test_regenerate_uses_parent_context() {
        let mut session = Session::new("narrate", None);
        let engine = TurnEngine::default();
        let provider = Scripted::new(vec![
            Ok(goblin_output()),
            Ok(GenerationOutput::text("Only silence.")),
        ]);

        let first = engine.play_turn(&session, &provider, "I open the door").unwrap();
        let first_id = first.commit_to(&mut session);
        let user_id = session.tree.node(first_id).unwrap().parent_id.unwrap();

        let second = engine.regenerate(&session, &provider, first_id).unwrap();

        // The second request saw the same history as the first.
        let seen = provider.seen.borrow();
        assert_eq!(seen[1].turns.len(), 1);
        assert_eq!(seen[1].turns[0].node_id, user_id);
        assert!(seen[1].context.world_state.entities.is_empty());

        let tree = &second.tree;
        let reply = tree.node(second.reply_id).unwrap();
        assert_eq!(reply.relation, Relation::Regenerate);
        assert_eq!(tree.alternatives(user_id).len(), 2);
        assert_eq!(tree.head_id(), second.reply_id);
        assert!(tree.node(first_id).is_some());
        // The new take has no patch, so the state falls back past the user turn.
        assert!(tree.current_world_state().entities.is_empty());
    }

    #[test]
    fn test_regenerate_root_fails() {
        let session = Session::new("narrate", None);
        let provider = Scripted::new(vec![]);
        let root = session.tree.root_id();

        let result = TurnEngine::default().regenerate(&session, &provider, root);
        assert!(matches!(result, Err(SessionError::Tree(TreeError::RootHasNoParent(_)))));
        assert!(provider.seen.borrow().is_empty());
    }

    #[test]
    fn test_edit_user_turn_branches() {
        let mut session = Session::new("narrate", None);
        let engine = TurnEngine::default();
        let provider = Scripted::new(vec![
            Ok(goblin_output()),
            Ok(GenerationOutput::text("The merchant smiles.")),
        ]);

        let first_reply = engine
            .play_turn(&session, &provider, "I attack")
            .unwrap()
            .commit_to(&mut session);
        let original_user = session.tree.node(first_reply).unwrap().parent_id.unwrap();

        let edited = engine
            .edit_user_turn(&session, &provider, original_user, "I negotiate")
            .unwrap();

        let tree = &edited.tree;
        let new_user = tree.node(edited.reply_id).unwrap().parent_id.unwrap();
        assert_ne!(new_user, original_user);
        assert_eq!(tree.node(new_user).unwrap().relation, Relation::Rewrite);
        assert_eq!(tree.node(new_user).unwrap().text(), "I negotiate");
        assert_eq!(tree.children_of(tree.root_id()).len(), 2);
        assert!(tree.node(first_reply).is_some());
        assert!(tree.current_world_state().entities.is_empty());
    }

    #[test]
    fn test_edit_rejects_assistant_turn() {
        let mut session = Session::new("narrate", None);
        let engine = TurnEngine::default();
        let provider = Scripted::new(vec![Ok(GenerationOutput::text("Hello, traveller."))]);

        let reply = engine
            .play_turn(&session, &provider, "hello")
            .unwrap()
            .commit_to(&mut session);
        let before = session.clone();

        let result = engine.edit_user_turn(&session, &provider, reply, "my edited words");

        assert!(matches!(
            result,
            Err(SessionError::Tree(TreeError::WrongRole {
                expected: Role::User,
                ..
            }))
        ));
        assert_eq!(provider.seen.borrow().len(), 1);
        assert_eq!(session, before);
    }

    #[test]
    fn test_edit_rejects_root() {
        let session = Session::new("narrate", None);
        let provider = Scripted::new(vec![]);
        let root = session.tree.root_id();

        let result = TurnEngine::default().edit_user_turn(&session, &provider, root, "x");
        assert!(matches!(result, Err(SessionError::Tree(TreeError::WrongRole { .. }))));
        assert!(provider.seen.borrow().is_empty());
    }

    #[test]
    fn test_closure_provider_drives_turn() {
        let session = Session::new("narrate", None);
        let provider = |_: &GenerationRequest| Ok::<_, ProviderError>(GenerationOutput::text("ok"));

        let outcome = TurnEngine::new(EngineConfig::default())
            .play_turn(&session, &provider, "hi")
            .unwrap();
        assert_eq!(outcome.tree.head().text(), "ok");
    }
}

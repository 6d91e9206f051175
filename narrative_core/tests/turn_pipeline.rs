use std::cell::RefCell;
use std::collections::VecDeque;

use narrative_core::world_model::{
    EntityPatch, Location, LocationPatch, ScenePatch, SetDiff, StatePatch, WorldState,
};
use narrative_core::{
    CanonEntry, Direction, GenerationOutput, GenerationProvider, GenerationRequest, PatchOutcome,
    ProviderError, Session, SessionError, Tag, TurnEngine,
};

/// Hands out queued outputs and keeps every request it was given.
#[derive(Default)]
struct Script {
    queue: RefCell<VecDeque<Result<GenerationOutput, ProviderError>>>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl Script {
    fn then(self, output: GenerationOutput) -> Self {
        self.queue.borrow_mut().push_back(Ok(output));
        self
    }

    fn then_fail(self, message: &str) -> Self {
        self.queue.borrow_mut().push_back(Err(ProviderError::new(message)));
        self
    }

    fn request(&self, index: usize) -> GenerationRequest {
        self.requests.borrow()[index].clone()
    }
}

impl GenerationProvider for Script {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, ProviderError> {
        self.requests.borrow_mut().push(request.clone());
        self.queue
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::new("script exhausted")))
    }
}

fn with_patch(text: &str, patch: StatePatch) -> GenerationOutput {
    GenerationOutput::text(text).with_raw_patch(serde_json::to_value(patch).unwrap())
}

fn village_session() -> Session {
    let mut opening = WorldState::new();
    opening.scene.location = Location::new("Village");

    let mut session = Session::new("You narrate a grim fairy tale.", Some(opening));
    session.canon.add_entry(
        CanonEntry::new("forest", "The Black Forest", "No one returns after dark.")
            .with_tag(Tag::location("Forest")),
    );
    session.canon.add_entry(
        CanonEntry::new("goblins", "Goblins", "They fear fire.").with_tag(Tag::entity("Goblin")),
    );
    session
}

fn to_forest() -> StatePatch {
    StatePatch::new()
        .with_scene(ScenePatch {
            location: Some(LocationPatch::named("Forest")),
            ..Default::default()
        })
        .with_facts(SetDiff::adding(["left the village"]))
}

fn goblin_appears() -> StatePatch {
    StatePatch::new().with_entity(
        EntityPatch::new("e1")
            .with_name("Goblin")
            .with_location(LocationPatch::named("Forest")),
    )
}

#[test]
fn test_story_branches_and_recovers_state() {
    let mut session = village_session();
    let engine = TurnEngine::default();
    let script = Script::default()
        .then(with_patch("Trees close in behind you.", to_forest()))
        .then(with_patch("Something giggles in the brush.", goblin_appears()))
        .then(GenerationOutput::text("Only wind."));

    let first = engine.play_turn(&session, &script, "I walk into the forest").unwrap();
    assert_eq!(first.patch, PatchOutcome::Applied);
    first.commit_to(&mut session);

    let second = engine.play_turn(&session, &script, "I listen").unwrap();
    let goblin_take = second.commit_to(&mut session);

    // The second request was assembled from the state left by the first turn.
    let request = script.request(1);
    assert_eq!(request.context.world_state.scene.location.name, "Forest");
    assert!(request.context.canon.iter().any(|entry| entry.id == "forest"));
    assert!(!request.context.canon.iter().any(|entry| entry.id == "goblins"));
    assert_eq!(request.turns.len(), 3);

    let state = session.tree.current_world_state();
    assert!(state.entity("e1").is_some());
    assert_eq!(state.facts, vec!["left the village".to_string()]);

    // An alternate take without a patch falls back to the first turn's state.
    let third = engine.regenerate(&session, &script, goblin_take).unwrap();
    assert_eq!(third.patch, PatchOutcome::Absent);
    third.commit_to(&mut session);

    let state = session.tree.current_world_state();
    assert!(state.entity("e1").is_none());
    assert_eq!(state.scene.location.name, "Forest");
    assert_eq!(script.request(2).turns.len(), 3);

    // Stepping back to the original take brings the goblin back.
    let head = session.tree.head_id();
    session.tree = session.tree.navigate_sibling(head, Direction::Prev).unwrap();
    assert_eq!(session.tree.head_id(), goblin_take);
    assert!(session.tree.current_world_state().entity("e1").is_some());
}

#[test]
fn test_provider_failure_is_all_or_nothing() {
    let session = village_session();
    let engine = TurnEngine::default();
    let script = Script::default().then_fail("rate limited");
    let before = session.clone();

    let result = engine.play_turn(&session, &script, "I knock");

    assert!(matches!(result, Err(SessionError::Provider(_))));
    assert_eq!(session, before);
}

#[test]
fn test_session_survives_save_and_load() {
    let mut session = village_session();
    let engine = TurnEngine::default();
    let script = Script::default()
        .then(with_patch("Trees close in behind you.", to_forest()))
        .then(GenerationOutput::text("Mist rises."));

    let reply = engine
        .play_turn(&session, &script, "I walk into the forest")
        .unwrap()
        .commit_to(&mut session);
    engine
        .regenerate(&session, &script, reply)
        .unwrap()
        .commit_to(&mut session);
    session.chronicle.record("The forest", "The hero left the village.", Some(reply));

    let loaded = Session::from_json(&session.to_json().unwrap()).unwrap();

    assert_eq!(loaded, session);
    let user = loaded.tree.node(reply).unwrap().parent_id.unwrap();
    assert_eq!(loaded.tree.children_of(user).len(), 2);
    assert_eq!(loaded.chronicle.len(), 1);
    assert_eq!(
        loaded.tree.current_world_state(),
        session.tree.current_world_state()
    );
}

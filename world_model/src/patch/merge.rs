//! The patch-merge engine.
//!
//! Merge rules per field:
//! 1. **scene / player scalars**: overwrite when present
//! 2. **locations**: merged one level deeper, sub-field by sub-field
//! 3. **set-like lists**: remove first, then append what is not already there
//! 4. **attributes**: upsert by key
//! 5. **entities**: hard delete, field merge, or create when a name is given
//! 6. **quests / threads**: upsert by id, create only when minimally valid
//!
//! Entries that cannot be applied are skipped; the merge itself never fails.

use tracing::debug;

use super::{
    EntityPatch, LocationPatch, PlayerPatch, QuestPatch, ScenePatch, SetDiff, StatePatch,
    ThreadPatch,
};
use crate::entities::{Entity, Player};
use crate::progress::{Quest, StoryThread, ThreadStatus};
use crate::world_state::{Location, Scene, WorldState};

/// Fold `patch` into `current`, returning the next snapshot.
///
/// `current` is not modified.
pub fn apply_state_patch(current: &WorldState, patch: &StatePatch) -> WorldState {
    let mut next = current.clone();

    if let Some(scene) = &patch.scene {
        merge_scene(&mut next.scene, scene);
    }
    if let Some(player) = &patch.player {
        merge_player(&mut next.player, player);
    }
    for entry in &patch.entities {
        merge_entity(&mut next.entities, entry);
    }
    for entry in &patch.quests {
        merge_quest(&mut next.quests, entry);
    }
    for entry in &patch.threads {
        merge_thread(&mut next.threads, entry);
    }
    if let Some(diff) = &patch.facts {
        apply_set_diff(&mut next.facts, diff);
    }
    if let Some(diff) = &patch.hypotheses {
        apply_set_diff(&mut next.hypotheses, diff);
    }
    if let Some(diff) = &patch.secrets {
        apply_set_diff(&mut next.secrets, diff);
    }

    next
}

/// Apply a set diff in place: removals first, then de-duplicated additions.
pub fn apply_set_diff(items: &mut Vec<String>, diff: &SetDiff) {
    if !diff.remove.is_empty() {
        items.retain(|item| !diff.remove.contains(item));
    }
    for item in &diff.add {
        if !items.contains(item) {
            items.push(item.clone());
        }
    }
}

fn overwrite(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

/// A creation field only counts when it has visible text.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn merge_location(location: &mut Location, patch: &LocationPatch) {
    overwrite(&mut location.name, &patch.name);
    if patch.region.is_some() {
        location.region.clone_from(&patch.region);
    }
    if patch.detail.is_some() {
        location.detail.clone_from(&patch.detail);
    }
}

fn merge_scene(scene: &mut Scene, patch: &ScenePatch) {
    if let Some(location) = &patch.location {
        merge_location(&mut scene.location, location);
    }
    overwrite(&mut scene.time, &patch.time);
    if patch.weather.is_some() {
        scene.weather.clone_from(&patch.weather);
    }
    if patch.atmosphere.is_some() {
        scene.atmosphere.clone_from(&patch.atmosphere);
    }
}

fn merge_player(player: &mut Player, patch: &PlayerPatch) {
    overwrite(&mut player.name, &patch.name);
    if let Some(location) = &patch.location {
        merge_location(&mut player.location, location);
    }
    overwrite(&mut player.condition, &patch.condition);
    overwrite(&mut player.activity, &patch.activity);
    overwrite(&mut player.intent, &patch.intent);
    if let Some(diff) = &patch.inventory {
        apply_set_diff(&mut player.inventory, diff);
    }
    if let Some(diff) = &patch.capabilities {
        apply_set_diff(&mut player.capabilities, diff);
    }
    if let Some(attributes) = &patch.attributes {
        player.attributes.merge(attributes);
    }
}

fn merge_entity_fields(entity: &mut Entity, patch: &EntityPatch) {
    overwrite(&mut entity.name, &patch.name);
    if let Some(location) = &patch.location {
        merge_location(&mut entity.location, location);
    }
    overwrite(&mut entity.activity, &patch.activity);
    overwrite(&mut entity.condition, &patch.condition);
    overwrite(&mut entity.relation_to_player, &patch.relation_to_player);
    if let Some(attributes) = &patch.attributes {
        entity.attributes.merge(attributes);
    }
    if patch.canon_ref.is_some() {
        entity.canon_ref.clone_from(&patch.canon_ref);
    }
}

fn merge_entity(entities: &mut Vec<Entity>, patch: &EntityPatch) {
    if patch.deleted {
        entities.retain(|e| e.id != patch.id);
        return;
    }

    if let Some(existing) = entities.iter_mut().find(|e| e.id == patch.id) {
        merge_entity_fields(existing, patch);
        return;
    }

    let Some(name) = non_blank(&patch.name) else {
        debug!(kind = "entity", id = %patch.id, "skipping creation without a name");
        return;
    };

    let mut entity = Entity::new(patch.id.clone(), name);
    merge_entity_fields(&mut entity, patch);
    entities.push(entity);
}

fn merge_quest(quests: &mut Vec<Quest>, patch: &QuestPatch) {
    if let Some(existing) = quests.iter_mut().find(|q| q.id == patch.id) {
        overwrite(&mut existing.label, &patch.label);
        if let Some(status) = patch.status {
            existing.status = status;
        }
        if let Some(steps) = &patch.steps {
            existing.steps.clone_from(steps);
        }
        if let Some(attributes) = &patch.attributes {
            existing.attributes.merge(attributes);
        }
        return;
    }

    let (Some(label), Some(status)) = (non_blank(&patch.label), patch.status) else {
        debug!(kind = "quest", id = %patch.id, "skipping creation without label and status");
        return;
    };

    let mut quest = Quest::new(patch.id.clone(), label);
    quest.status = status;
    if let Some(steps) = &patch.steps {
        quest.steps.clone_from(steps);
    }
    if let Some(attributes) = &patch.attributes {
        quest.attributes.merge(attributes);
    }
    quests.push(quest);
}

fn merge_thread(threads: &mut Vec<StoryThread>, patch: &ThreadPatch) {
    if let Some(existing) = threads.iter_mut().find(|t| t.id == patch.id) {
        overwrite(&mut existing.description, &patch.description);
        if let Some(status) = patch.status {
            existing.status = status;
        }
        return;
    }

    let Some(description) = non_blank(&patch.description) else {
        debug!(kind = "thread", id = %patch.id, "skipping creation without a description");
        return;
    };

    let mut thread = StoryThread::new(patch.id.clone(), description);
    thread.status = patch.status.unwrap_or(ThreadStatus::Unresolved);
    threads.push(thread);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Attributes;
    use crate::progress::{QuestStatus, QuestStep};

    fn goblin_patch() -> EntityPatch {
        EntityPatch::new("e1")
            .with_name("Goblin")
            .with_condition("Hostile")
            .with_activity("Growling")
            .with_relation_to_player("Hostile")
    }

    #[test]
    fn test_entity_creation_defaults_location() {
        let state = WorldState::new();
        let patch = StatePatch::new().with_entity(goblin_patch());

        let next = apply_state_patch(&state, &patch);

        assert_eq!(next.entities.len(), 1);
        let goblin = next.entity("e1").unwrap();
        assert_eq!(goblin.name, "Goblin");
        assert_eq!(goblin.condition, "Hostile");
        assert_eq!(goblin.activity, "Growling");
        assert_eq!(goblin.relation_to_player, "Hostile");
        assert_eq!(goblin.location, Location::new("Unknown"));
    }

    #[test]
    fn test_entity_delete_wins_over_fields() {
        let state = apply_state_patch(
            &WorldState::new(),
            &StatePatch::new().with_entity(goblin_patch()),
        );

        let mut delete = EntityPatch::delete("e1");
        delete.condition = Some("anything".to_string());
        let next = apply_state_patch(&state, &StatePatch::new().with_entity(delete));

        assert!(next.entity("e1").is_none());
        assert!(next.entities.is_empty());
    }

    #[test]
    fn test_entity_without_name_is_skipped() {
        let patch = StatePatch::new()
            .with_entity(EntityPatch::new("ghost").with_condition("Ethereal"))
            .with_facts(SetDiff::adding(["A chill fills the room"]));

        let next = apply_state_patch(&WorldState::new(), &patch);

        assert!(next.entities.is_empty());
        assert_eq!(next.facts.len(), 1);
    }

    #[test]
    fn test_blank_names_do_not_create() {
        let patch = StatePatch::new()
            .with_entity(EntityPatch::new("e9").with_name(""))
            .with_entity(EntityPatch::new("e10").with_name("   "))
            .with_quest(
                QuestPatch::new("q9")
                    .with_label(" ")
                    .with_status(QuestStatus::Active),
            )
            .with_thread(ThreadPatch::new("t9").with_description(""));

        let next = apply_state_patch(&WorldState::new(), &patch);

        assert!(next.entities.is_empty());
        assert!(next.quests.is_empty());
        assert!(next.threads.is_empty());
    }

    #[test]
    fn test_blank_name_still_updates_existing() {
        let mut state = WorldState::new();
        state.entities.push(Entity::new("e1", "Goblin"));

        let patch = StatePatch::new().with_entity(EntityPatch::new("e1").with_name(""));
        let next = apply_state_patch(&state, &patch);

        assert_eq!(next.entities.len(), 1);
    }

    #[test]
    fn test_entity_update_merges_location_and_attributes() {
        let mut state = WorldState::new();
        let mut goblin = Entity::new("e1", "Goblin")
            .with_location(Location::new("Cave").with_region("North Hills"));
        goblin.attributes.set("weapon", "club");
        goblin.attributes.set("mood", "sour");
        state.entities.push(goblin);

        let patch = StatePatch::new().with_entity(
            EntityPatch::new("e1")
                .with_location(LocationPatch {
                    detail: Some("By the fire".to_string()),
                    ..Default::default()
                })
                .with_attributes([("mood", "furious"), ("loot", "3 coins")].into_iter().collect()),
        );
        let next = apply_state_patch(&state, &patch);

        let goblin = next.entity("e1").unwrap();
        assert_eq!(goblin.name, "Goblin");
        assert_eq!(goblin.location.name, "Cave");
        assert_eq!(goblin.location.region.as_deref(), Some("North Hills"));
        assert_eq!(goblin.location.detail.as_deref(), Some("By the fire"));
        let expected: Attributes = [("weapon", "club"), ("mood", "furious"), ("loot", "3 coins")]
            .into_iter()
            .collect();
        assert_eq!(goblin.attributes, expected);
    }

    #[test]
    fn test_scene_location_merges_one_level() {
        let mut state = WorldState::new();
        state.scene.location = Location::new("Temple").with_region("Old City");
        state.scene.weather = Some("Rain".to_string());

        let patch = StatePatch::new().with_scene(ScenePatch {
            location: Some(LocationPatch::named("Crypt")),
            time: Some("Midnight".to_string()),
            ..Default::default()
        });
        let next = apply_state_patch(&state, &patch);

        assert_eq!(next.scene.location.name, "Crypt");
        assert_eq!(next.scene.location.region.as_deref(), Some("Old City"));
        assert_eq!(next.scene.time, "Midnight");
        assert_eq!(next.scene.weather.as_deref(), Some("Rain"));
    }

    #[test]
    fn test_inventory_remove_then_add() {
        let mut state = WorldState::new();
        state.player.inventory = vec!["torch".into(), "rope".into()];

        let patch = StatePatch::new().with_player(PlayerPatch {
            inventory: Some(SetDiff {
                add: vec!["rope".into(), "key".into(), "key".into(), "torch".into()],
                remove: vec!["torch".into()],
            }),
            ..Default::default()
        });
        let next = apply_state_patch(&state, &patch);

        assert_eq!(next.player.inventory, vec!["rope", "key", "torch"]);
    }

    #[test]
    fn test_player_scalars_and_capabilities() {
        let mut state = WorldState::new();
        state.player.capabilities = vec!["swim".into()];

        let patch = StatePatch::new().with_player(PlayerPatch {
            condition: Some("Wounded".to_string()),
            intent: Some("Escape".to_string()),
            capabilities: Some(SetDiff::adding(["climb"])),
            ..Default::default()
        });
        let next = apply_state_patch(&state, &patch);

        assert_eq!(next.player.condition, "Wounded");
        assert_eq!(next.player.intent, "Escape");
        assert_eq!(next.player.activity, state.player.activity);
        assert_eq!(next.player.capabilities, vec!["swim", "climb"]);
    }

    #[test]
    fn test_fact_addition_is_idempotent() {
        let mut state = WorldState::new();
        state.facts.push("The bridge is out".to_string());

        let patch = StatePatch::new().with_facts(SetDiff::adding(["The bridge is out"]));
        let once = apply_state_patch(&state, &patch);
        let twice = apply_state_patch(&once, &patch);

        assert_eq!(once.facts, vec!["The bridge is out"]);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_hypotheses_and_secrets() {
        let mut state = WorldState::new();
        state.hypotheses = vec!["The butler did it".into()];

        let patch = StatePatch::new()
            .with_hypotheses(SetDiff::removing(["The butler did it"]))
            .with_secrets(SetDiff::adding(["The cook did it"]));
        let next = apply_state_patch(&state, &patch);

        assert!(next.hypotheses.is_empty());
        assert_eq!(next.secrets, vec!["The cook did it"]);
    }

    #[test]
    fn test_quest_upsert_replaces_steps() {
        let patch = StatePatch::new().with_quest(
            QuestPatch::new("q1")
                .with_label("Find the Sword")
                .with_status(QuestStatus::Active)
                .with_steps(vec![QuestStep::new("Enter cave")]),
        );
        let state = apply_state_patch(&WorldState::new(), &patch);

        assert_eq!(state.quests.len(), 1);
        let quest = state.quest("q1").unwrap();
        assert_eq!(quest.label, "Find the Sword");
        assert_eq!(quest.status, QuestStatus::Active);
        assert_eq!(quest.steps, vec![QuestStep::new("Enter cave")]);

        let follow_up = StatePatch::new().with_quest(
            QuestPatch::new("q1").with_steps(vec![
                QuestStep::done("Cross the river"),
                QuestStep::new("Open the chest"),
            ]),
        );
        let next = apply_state_patch(&state, &follow_up);

        let quest = next.quest("q1").unwrap();
        assert_eq!(quest.label, "Find the Sword");
        assert_eq!(
            quest.steps,
            vec![
                QuestStep::done("Cross the river"),
                QuestStep::new("Open the chest")
            ]
        );
    }

    #[test]
    fn test_new_quest_requires_label_and_status() {
        let patch = StatePatch::new()
            .with_quest(QuestPatch::new("q1").with_label("No status"))
            .with_quest(QuestPatch::new("q2").with_status(QuestStatus::Active));
        let next = apply_state_patch(&WorldState::new(), &patch);

        assert!(next.quests.is_empty());
    }

    #[test]
    fn test_thread_upsert() {
        let patch = StatePatch::new()
            .with_thread(ThreadPatch::new("t1").with_description("Who sent the letter?"))
            .with_thread(ThreadPatch::new("t2").with_status(ThreadStatus::Resolved));
        let state = apply_state_patch(&WorldState::new(), &patch);

        assert_eq!(state.threads.len(), 1);
        assert_eq!(state.thread("t1").unwrap().status, ThreadStatus::Unresolved);

        let resolve = StatePatch::new()
            .with_thread(ThreadPatch::new("t1").with_status(ThreadStatus::Resolved));
        let next = apply_state_patch(&state, &resolve);

        let thread = next.thread("t1").unwrap();
        assert_eq!(thread.status, ThreadStatus::Resolved);
        assert_eq!(thread.description, "Who sent the letter?");
    }

    #[test]
    fn test_same_field_last_applied_wins() {
        let base = apply_state_patch(
            &WorldState::new(),
            &StatePatch::new().with_entity(goblin_patch()),
        );
        let calm = StatePatch::new().with_entity(EntityPatch::new("e1").with_condition("Calm"));
        let enraged =
            StatePatch::new().with_entity(EntityPatch::new("e1").with_condition("Enraged"));

        let a = apply_state_patch(&apply_state_patch(&base, &calm), &enraged);
        let b = apply_state_patch(&apply_state_patch(&base, &enraged), &calm);

        assert_eq!(a.entity("e1").unwrap().condition, "Enraged");
        assert_eq!(b.entity("e1").unwrap().condition, "Calm");
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let mut state = WorldState::new();
        state.facts.push("Known".to_string());
        assert_eq!(apply_state_patch(&state, &StatePatch::new()), state);
    }

    #[test]
    fn test_input_state_untouched() {
        let state = WorldState::new();
        let before = state.clone();
        let _ = state.apply(&StatePatch::new().with_entity(goblin_patch()));
        assert_eq!(state, before);
    }
}

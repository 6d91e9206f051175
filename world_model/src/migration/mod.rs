//! Upgrades for persisted world-state snapshots.
//!
//! Each step rewrites the raw JSON of a snapshot from version `n` to `n + 1`.
//! The chain runs once at load time, so the rest of the crate only ever sees
//! the current field names.

use serde_json::{Map, Value};
use tracing::info;

/// Version written by this crate.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 3;

/// Errors raised while upgrading a persisted snapshot.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("snapshot is not a JSON object")]
    NotAnObject,
}

type Upgrade = fn(&mut Map<String, Value>);

/// Upgrade steps indexed by the version they upgrade from.
const UPGRADES: &[(u32, Upgrade)] = &[(1, rename_status_to_condition), (2, rename_title_to_label)];

/// Upgrade a raw snapshot to the current version without deserializing it.
///
/// Versions below 1 are treated as 1.
pub fn upgrade_world_state_value(
    mut value: Value,
    from_version: u32,
) -> Result<Value, MigrationError> {
    if from_version > CURRENT_SNAPSHOT_VERSION {
        return Err(MigrationError::UnsupportedVersion {
            found: from_version,
            supported: CURRENT_SNAPSHOT_VERSION,
        });
    }

    let object = value.as_object_mut().ok_or(MigrationError::NotAnObject)?;
    let start = from_version.max(1);
    for &(version, upgrade) in UPGRADES.iter().filter(|(v, _)| *v >= start) {
        upgrade(object);
        info!(from = version, to = version + 1, "upgraded world state snapshot");
    }

    Ok(value)
}

fn rename_key(object: &mut Map<String, Value>, old: &str, new: &str) {
    if let Some(value) = object.remove(old) {
        // A snapshot that already carries the new name keeps it.
        object.entry(new.to_string()).or_insert(value);
    }
}

fn objects_in<'a>(
    root: &'a mut Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a mut Map<String, Value>> {
    root.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

/// v1 -> v2: `status` on entities and the player became `condition`.
fn rename_status_to_condition(root: &mut Map<String, Value>) {
    if let Some(player) = root.get_mut("player").and_then(Value::as_object_mut) {
        rename_key(player, "status", "condition");
    }
    for entity in objects_in(root, "entities") {
        rename_key(entity, "status", "condition");
    }
}

/// v2 -> v3: quest `title` became `label`.
fn rename_title_to_label(root: &mut Map<String, Value>) {
    for quest in objects_in(root, "quests") {
        rename_key(quest, "title", "label");
    }
}

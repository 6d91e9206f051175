//! Sessions - what a caller holds between turns, and its persisted form.
//!
//! The persisted form is plain JSON with a `version` field. Loading runs the
//! world-state upgrade chain over every attached snapshot before the tree is
//! deserialized; deserializing the tree checks its index invariants.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use world_model::{migration::upgrade_world_state_value, MigrationError, CURRENT_SNAPSHOT_VERSION};

use crate::canon::{CanonStore, Chronicle};
use crate::conversation::ConversationTree;
use crate::error::Result;

/// One interactive-fiction session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub tree: ConversationTree,
    #[serde(default)]
    pub canon: CanonStore,
    #[serde(default)]
    pub chronicle: Chronicle,
}

impl Session {
    /// Start a session from a system prompt and optional opening state.
    pub fn new(
        system_prompt: impl Into<String>,
        initial_state: Option<world_model::WorldState>,
    ) -> Self {
        Self {
            tree: ConversationTree::new(system_prompt, initial_state),
            canon: CanonStore::new(),
            chronicle: Chronicle::new(),
        }
    }

    /// Serialize to the versioned wire format.
    pub fn to_json(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(object) = &mut value {
            object.insert("version".to_string(), Value::from(CURRENT_SNAPSHOT_VERSION));
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Load a session, upgrading snapshots written by older versions.
    ///
    /// A file without a `version` field is treated as version 1.
    pub fn from_json(source: &str) -> Result<Self> {
        let mut raw: Value = serde_json::from_str(source)?;
        let version = raw
            .get("version")
            .and_then(Value::as_u64)
            .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX));

        if version > CURRENT_SNAPSHOT_VERSION {
            return Err(MigrationError::UnsupportedVersion {
                found: version,
                supported: CURRENT_SNAPSHOT_VERSION,
            }
            .into());
        }

        if version < CURRENT_SNAPSHOT_VERSION {
            let nodes = raw
                .pointer_mut("/tree/nodes")
                .and_then(Value::as_object_mut)
                .into_iter()
                .flat_map(|nodes| nodes.values_mut())
                .filter_map(Value::as_object_mut);

            let mut upgraded = 0usize;
            for node in nodes {
                let Some(state) = node.get_mut("worldState") else { continue };
                if state.is_null() {
                    continue;
                }
                *state = upgrade_world_state_value(state.take(), version)?;
                upgraded += 1;
            }
            info!(
                from = version,
                to = CURRENT_SNAPSHOT_VERSION,
                snapshots = upgraded,
                "upgraded session"
            );
        }

        Ok(serde_json::from_value(raw)?)
    }
}

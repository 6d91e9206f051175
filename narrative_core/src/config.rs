//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Tunables for history rendering and context assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of turns walked back from the head when rendering history.
    pub history_limit: usize,

    /// Guard against malformed cycles when walking active-child links.
    pub active_path_limit: usize,

    /// Whether `thought` parts are shown to the generator.
    pub render_thoughts: bool,

    /// Inline the current world state into the most recent user turn.
    pub inline_world_state: bool,

    /// Maximum number of canon entries in a context bundle.
    pub max_canon_entries: usize,

    /// Number of most recent chronicle entries in a context bundle.
    pub chronicle_tail: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 40,
            active_path_limit: 10_000,
            render_thoughts: false,
            inline_world_state: true,
            max_canon_entries: 12,
            chronicle_tail: 5,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

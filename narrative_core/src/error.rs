//! Error types for the narrative core.
//!
//! Structural errors are caller contract violations and abort only the
//! operation that raised them. Patch entries that cannot be applied are not
//! errors at all; see [`world_model::apply_state_patch`].

use std::path::PathBuf;

use crate::conversation::{NodeId, Role};

/// A tree operation referenced something that is not there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The id is not a node of this tree
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    /// The operation needs a parent and the node is the root
    #[error("node {0} is the root and has no parent")]
    RootHasNoParent(NodeId),

    /// The node is not listed among the stated parent's children
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// The node exists but was authored by a different role
    #[error("node {node} is not a {expected} turn")]
    WrongRole { node: NodeId, expected: Role },

    /// A deserialized tree breaks an index invariant
    #[error("corrupt tree: {0}")]
    Corrupt(String),
}

/// The raw patch object did not match the state patch shape.
#[derive(Debug, thiserror::Error)]
#[error("malformed state patch: {0}")]
pub struct PatchError(#[from] pub serde_json::Error);

/// The generation collaborator failed to produce a turn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("generation failed: {message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Engine configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors surfaced by the turn pipeline and session loading.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Migration(#[from] world_model::MigrationError),

    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

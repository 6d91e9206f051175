//! # World Model
//!
//! The "World Bible" crate - holds the snapshot of narrative facts attached to
//! conversation turns, the structured diff type produced by the generator, and
//! the merge engine that folds one into the other.
//! This crate contains no conversation or AI logic.

pub mod entities;
pub mod migration;
pub mod patch;
pub mod progress;
pub mod world_state;

pub use entities::*;
pub use migration::{upgrade_world_state_value, MigrationError, CURRENT_SNAPSHOT_VERSION};
pub use patch::*;
pub use progress::*;
pub use world_state::*;

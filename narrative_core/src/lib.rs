//! # Narrative Core (The Cortex)
//!
//! The session engine of the interactive-fiction system. This crate keeps
//! the branching conversation, recovers world state along any branch, and
//! drives turns against a text-generation provider.
//!
//! ## Core Components
//!
//! - **conversation**: Append-only tree of turns with per-parent branch selection
//! - **canon**: Tagged setting reference and the running chronicle
//! - **context_assembler**: Renders a branch and its reference material into a request
//! - **turn**: The grow, recover, generate, merge, commit pipeline
//! - **session**: Versioned JSON persistence of a whole session
//!
//! ## Design Philosophy
//!
//! - **Snapshots**: Every tree operation returns a new tree and leaves its input untouched
//! - **Never forget**: Regenerations and rewrites add siblings instead of replacing turns
//! - **Lenient state**: World-state patches degrade entry by entry rather than failing a turn

pub mod canon;
pub mod config;
pub mod context_assembler;
pub mod conversation;
pub mod error;
pub mod provider;
pub mod session;
pub mod turn;

pub use canon::*;
pub use config::EngineConfig;
pub use context_assembler::*;
pub use conversation::*;
pub use error::{ConfigError, PatchError, ProviderError, SessionError, TreeError};
pub use provider::{GenerationOutput, GenerationProvider};
pub use session::Session;
pub use turn::{PatchOutcome, TurnEngine, TurnOutcome};

pub use world_model;

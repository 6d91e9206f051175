//! Canon module - long-term reference material for context assembly.
//!
//! - **Canon**: curated setting entries indexed by tags
//! - **Chronicle**: append-only log of what has happened so far
//!
//! Neither is ever merged into a world state; both are only read when a
//! generation request is assembled.

mod chronicle;
mod entry;
mod store;
mod tag;

pub use chronicle::*;
pub use entry::*;
pub use store::*;
pub use tag::*;

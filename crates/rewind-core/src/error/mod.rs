//! Error types for the rewind engine
//!
//! Every fallible operation returns [`RewindResult`]. Variants carry a
//! human-readable message plus optional context so that per-file failures can
//! be logged with enough detail and then skipped by the orchestrator.

mod constructors;
mod conversions;
mod types;

pub use types::{ResultExt, RewindError, RewindResult};

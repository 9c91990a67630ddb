//! Shared identifiers, simulation time and domain events for the FAD model.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod event;
pub mod timestamp;

// Re-export timestamp types
pub use timestamp::{SimTime, DAYS_PER_YEAR, DEFAULT_STEPS_PER_DAY};

// Re-export event types
pub use event::*;

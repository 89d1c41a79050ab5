//! Shared utilities for moodbbs
//!
//! This crate provides:
//! - ID types (QuestId, CompletionId, SnoozeId, EventId, TraitId)
//! - Clock helpers (mockable `now()`, formatting)
//! - Calendar helpers used by quest eligibility
//! - Default paths for config, data, and log directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;

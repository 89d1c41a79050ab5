//! Domain types for moodbbs
//!
//! This crate defines the data model shared by the core, the store and
//! the host binary:
//! - Quests, renewal policies, templates
//! - Completion and snooze records
//! - Mood events, traits, modifiers, tiers and snapshots

#[macro_use]
mod labels;
mod mood;
mod quest;

pub use labels::ParseLabelError;
pub use mood::*;
pub use quest::*;

//! Quest lifecycle and mood engine for moodbbs
//!
//! This crate holds all of moodbbs' domain logic:
//! - Quest lifecycle (active, snoozed, completed, pending renewal, hidden)
//! - Renewal cooldowns and seasonal windows
//! - Day-based eligibility constraints
//! - Mood aggregation from timed events and personality traits
//!
//! Nothing here reads the clock. Every time-sensitive call takes `now`.

mod eligibility;
mod engine;
mod error;
mod events;
mod ledger;
mod library;
mod lifecycle;
mod mood;
mod renewal;
mod snooze;
mod trait_registry;

pub use eligibility::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use ledger::*;
pub use library::*;
pub use lifecycle::*;
pub use mood::*;
pub use renewal::*;
pub use snooze::*;
pub use trait_registry::*;

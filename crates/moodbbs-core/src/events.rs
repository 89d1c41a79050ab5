//! Core events emitted by the engine

use moodbbs_util::QuestId;

/// State changes produced by a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A pending quest came back after its cooldown
    QuestRenewed { quest_id: QuestId, renewal_count: u32 },

    /// A snoozed quest's snooze elapsed
    QuestReturned { quest_id: QuestId },
}

//! Store trait definitions

use moodbbs_api::{
    MoodEvent, MoodSnapshot, PersonalityTrait, Quest, QuestCompletion, QuestSnooze,
};

use crate::StoreResult;

/// Main store trait
pub trait Store: Send + Sync {
    // Quests

    /// Load every quest regardless of status
    fn load_quests(&self) -> StoreResult<Vec<Quest>>;

    /// Insert or replace a quest by id
    fn save_quest(&self, quest: &Quest) -> StoreResult<()>;

    /// Insert or replace several quests in one transaction
    fn save_quests(&self, quests: &[Quest]) -> StoreResult<()>;

    // Completions (append-only)

    fn load_completions(&self) -> StoreResult<Vec<QuestCompletion>>;

    fn save_completion(&self, completion: &QuestCompletion) -> StoreResult<()>;

    // Snoozes (append-only)

    fn load_snoozes(&self) -> StoreResult<Vec<QuestSnooze>>;

    fn save_snooze(&self, snooze: &QuestSnooze) -> StoreResult<()>;

    /// Persist a snoozed quest and its new record in one transaction
    fn record_snooze(&self, quest: &Quest, snooze: &QuestSnooze) -> StoreResult<()>;

    // Mood

    fn load_mood_events(&self) -> StoreResult<Vec<MoodEvent>>;

    /// Insert or replace a mood event by id
    fn save_mood_event(&self, event: &MoodEvent) -> StoreResult<()>;

    fn load_traits(&self) -> StoreResult<Vec<PersonalityTrait>>;

    /// Insert or replace a trait by id
    fn save_trait(&self, personality_trait: &PersonalityTrait) -> StoreResult<()>;

    // Stats

    fn get_total_xp(&self) -> StoreResult<u64>;

    fn set_total_xp(&self, total_xp: u64) -> StoreResult<()>;

    /// Persist everything a completion touched in one transaction
    fn record_completion(
        &self,
        quest: &Quest,
        completion: &QuestCompletion,
        events: &[MoodEvent],
        total_xp: u64,
    ) -> StoreResult<()>;

    // Mood history

    /// Append a snapshot and return its assigned id
    fn append_mood_snapshot(&self, snapshot: &MoodSnapshot) -> StoreResult<i64>;

    /// Most recent snapshots first
    fn recent_mood_snapshots(&self, limit: usize) -> StoreResult<Vec<MoodSnapshot>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

//! Mood score aggregation

use chrono::{DateTime, Local};
use moodbbs_api::{MoodEvent, MoodState, MoodThresholds, MoodTier, PersonalityTrait};

/// Sums event and trait modifiers into a score and maps it to a tier.
///
/// The aggregator is pure. Expiry is a caller concern: filter with
/// [`MoodAggregator::is_expired`] before calling [`MoodAggregator::calculate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoodAggregator {
    thresholds: MoodThresholds,
}

impl MoodAggregator {
    pub fn new(thresholds: MoodThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MoodThresholds {
        &self.thresholds
    }

    /// Sum of active event modifiers plus active trait modifiers, saturating
    /// at the bounds of `i32`
    pub fn calculate(&self, events: &[MoodEvent], traits: &[PersonalityTrait]) -> i32 {
        let from_events = events.iter().filter(|e| e.is_active).map(|e| i64::from(e.modifier));
        let from_traits = traits.iter().filter(|t| t.is_active).map(|t| i64::from(t.modifier));
        let total: i64 = from_events.chain(from_traits).sum();
        total.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// An event without an expiry never expires
    pub fn is_expired(event: &MoodEvent, now: DateTime<Local>) -> bool {
        event.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn mood_tier(&self, score: i32) -> MoodTier {
        self.thresholds.tier(score)
    }

    /// Build a state from already-filtered events and traits
    pub fn mood_state(
        &self,
        events: Vec<MoodEvent>,
        traits: Vec<PersonalityTrait>,
        now: DateTime<Local>,
    ) -> MoodState {
        let score = self.calculate(&events, &traits);
        let tier = self.mood_tier(score);

        MoodState {
            score,
            tier,
            face: tier.face().to_string(),
            active_events: events,
            active_traits: traits,
            calculated_at: now,
        }
    }
}

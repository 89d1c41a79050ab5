//! In-memory owner of mood events and traits

use chrono::{DateTime, Local};
use moodbbs_api::{MoodEvent, MoodState, PersonalityTrait};
use moodbbs_util::{EventId, checked_add_hours, next_id_after};
use tracing::{debug, info};

use crate::{ModifierLibrary, MoodAggregator, MoodError, TraitRegistry};

/// Mood events, traits and the modifier library, plus the aggregator that
/// turns them into a [`MoodState`].
#[derive(Debug, Clone)]
pub struct MoodLedger {
    events: Vec<MoodEvent>,
    traits: TraitRegistry,
    library: ModifierLibrary,
    aggregator: MoodAggregator,
    next_event_id: i64,
}

impl Default for MoodLedger {
    fn default() -> Self {
        Self::new(MoodAggregator::default())
    }
}

impl MoodLedger {
    pub fn new(aggregator: MoodAggregator) -> Self {
        Self::restore(aggregator, Vec::new(), Vec::new())
    }

    /// Rebuild from persisted events and traits
    pub fn restore(
        aggregator: MoodAggregator,
        mut events: Vec<MoodEvent>,
        traits: Vec<PersonalityTrait>,
    ) -> Self {
        events.sort_by_key(|e| e.id);
        let next_event_id = next_id_after(events.iter().map(|e| e.id.get()));

        Self {
            events,
            traits: TraitRegistry::restore(traits),
            library: ModifierLibrary::new(),
            aggregator,
            next_event_id,
        }
    }

    pub fn aggregator(&self) -> &MoodAggregator {
        &self.aggregator
    }

    pub fn traits(&self) -> &TraitRegistry {
        &self.traits
    }

    pub fn traits_mut(&mut self) -> &mut TraitRegistry {
        &mut self.traits
    }

    pub fn library(&self) -> &ModifierLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ModifierLibrary {
        &mut self.library
    }

    /// Every event ever logged, including inactive and expired ones
    pub fn events(&self) -> &[MoodEvent] {
        &self.events
    }

    /// Record an event. Without `duration_hours` it lasts until deactivated.
    pub fn log_event(
        &mut self,
        event_type: &str,
        modifier: i32,
        description: Option<String>,
        duration_hours: Option<u32>,
        now: DateTime<Local>,
    ) -> Result<MoodEvent, MoodError> {
        let expires_at = match duration_hours {
            Some(hours) => Some(
                checked_add_hours(now, hours).ok_or(MoodError::DurationOutOfRange { hours })?,
            ),
            None => None,
        };

        let event = MoodEvent {
            id: EventId::new(self.next_event_id),
            event_type: event_type.to_string(),
            modifier,
            description,
            created_at: now,
            expires_at,
            is_active: true,
        };
        self.next_event_id += 1;
        self.events.push(event.clone());

        info!(
            event_id = %event.id,
            event_type,
            modifier,
            expires_at = ?event.expires_at,
            "Mood event logged"
        );
        Ok(event)
    }

    /// Record an event using a library entry's default value and duration
    pub fn log_from_library(&mut self, event_type: &str, now: DateTime<Local>) -> Result<MoodEvent, MoodError> {
        let modifier = self
            .library
            .get(event_type)
            .cloned()
            .ok_or_else(|| MoodError::UnknownModifier(event_type.to_string()))?;

        self.log_event(
            &modifier.event_type,
            modifier.default_value,
            Some(modifier.name),
            modifier.duration_hours,
            now,
        )
    }

    pub fn deactivate_event(&mut self, id: EventId) -> Result<MoodEvent, MoodError> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(MoodError::EventNotFound(id))?;

        event.is_active = false;
        debug!(event_id = %id, "Mood event deactivated");
        Ok(event.clone())
    }

    /// Active events that have not expired at `now`
    pub fn active_events(&self, now: DateTime<Local>) -> Vec<MoodEvent> {
        self.events
            .iter()
            .filter(|e| e.is_active && !MoodAggregator::is_expired(e, now))
            .cloned()
            .collect()
    }

    pub fn current_mood(&self, now: DateTime<Local>) -> MoodState {
        self.aggregator
            .mood_state(self.active_events(now), self.traits.active(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use moodbbs_api::MoodTier;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn log_event_sets_expiry() {
        let mut ledger = MoodLedger::default();
        let timed = ledger.log_event("coffee", 2, None, Some(3), now()).unwrap();
        let permanent = ledger.log_event("new_job", 6, Some("Started".into()), None, now()).unwrap();

        assert_eq!(timed.id, EventId::new(1));
        assert_eq!(permanent.id, EventId::new(2));
        assert_eq!(timed.expires_at, Some(now() + Duration::hours(3)));
        assert!(permanent.expires_at.is_none());
    }

    #[test]
    fn out_of_range_duration_is_rejected() {
        let mut ledger = MoodLedger::default();
        let err = ledger
            .log_event("eternal_glow", 3, None, Some(u32::MAX), now())
            .unwrap_err();
        assert_eq!(err, MoodError::DurationOutOfRange { hours: u32::MAX });
        assert!(ledger.events().is_empty());

        let next = ledger.log_event("coffee", 2, None, Some(1), now()).unwrap();
        assert_eq!(next.id, EventId::new(1));
    }

    #[test]
    fn expired_events_drop_out_of_mood() {
        let mut ledger = MoodLedger::default();
        ledger.log_event("coffee", 2, None, Some(3), now()).unwrap();
        ledger.log_event("new_job", 6, None, None, now()).unwrap();

        assert_eq!(ledger.current_mood(now()).score, 8);

        let later = now() + Duration::hours(4);
        let mood = ledger.current_mood(later);
        assert_eq!(mood.score, 6);
        assert_eq!(mood.active_events.len(), 1);
        assert_eq!(ledger.events().len(), 2);
    }

    #[test]
    fn log_from_library_uses_defaults() {
        let mut ledger = MoodLedger::default();
        let event = ledger.log_from_library("saw_beauty", now()).unwrap();
        assert_eq!(event.modifier, 4);
        assert_eq!(event.expires_at, Some(now() + Duration::hours(12)));
        assert_eq!(event.description.as_deref(), Some("Saw something beautiful"));

        assert_eq!(
            ledger.log_from_library("unicorn", now()).unwrap_err(),
            MoodError::UnknownModifier("unicorn".into())
        );
    }

    #[test]
    fn deactivation() {
        let mut ledger = MoodLedger::default();
        let event = ledger.log_event("rain", -4, None, None, now()).unwrap();

        let deactivated = ledger.deactivate_event(event.id).unwrap();
        assert!(!deactivated.is_active);
        assert_eq!(ledger.current_mood(now()).score, 0);

        assert_eq!(
            ledger.deactivate_event(EventId::new(99)).unwrap_err(),
            MoodError::EventNotFound(EventId::new(99))
        );
    }

    #[test]
    fn traits_contribute_to_mood() {
        let mut ledger = MoodLedger::default();
        ledger.traits_mut().add_stock("sanguine").unwrap();
        ledger.log_event("social_interaction", 8, None, Some(24), now()).unwrap();

        let mood = ledger.current_mood(now());
        assert_eq!(mood.score, 18);
        assert_eq!(mood.tier, MoodTier::VeryHappy);
        assert_eq!(mood.active_traits.len(), 1);
    }

    #[test]
    fn restore_continues_event_ids() {
        let mut ledger = MoodLedger::default();
        ledger.log_event("a", 1, None, None, now()).unwrap();
        ledger.log_event("b", 1, None, None, now()).unwrap();

        let mut restored = MoodLedger::restore(
            MoodAggregator::default(),
            ledger.events().to_vec(),
            Vec::new(),
        );
        let next = restored.log_event("c", 1, None, None, now()).unwrap();
        assert_eq!(next.id, EventId::new(3));
    }
}

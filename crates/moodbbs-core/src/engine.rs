//! Engine wiring the quest lifecycle and mood ledger to the store

use chrono::{DateTime, Datelike, Local};
use moodbbs_api::{
    CompletionDetails, MoodEvent, MoodModifier, MoodSnapshot, MoodState, NewQuest,
    PersonalityTrait, Quest, QuestCompletion, QuestSnooze, QuestStats, SnoozeRequest,
};
use moodbbs_config::Settings;
use moodbbs_store::Store;
use moodbbs_util::{EventId, QuestId, weekday_name};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    CompletionResult, CoreEvent, EngineResult, LifecycleState, MoodAggregator, MoodLedger,
    QuestError, QuestLifecycle,
};

/// Aggregate numbers for the status screen
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub total_xp: u64,
    pub quests_completed: usize,
    pub active_quests: usize,
    pub mood: MoodState,
}

/// The moodbbs engine.
///
/// Every mutating operation runs against a staged copy of the in-memory
/// state and writes the touched rows. The copy replaces the live state only
/// once the store write succeeds, so a failed operation changes nothing.
pub struct Engine {
    settings: Settings,
    store: Arc<dyn Store>,
    quests: QuestLifecycle,
    mood: MoodLedger,
    load_events: Vec<CoreEvent>,
}

/// State an operation mutates before it is committed
struct Staged<'a> {
    settings: &'a Settings,
    store: &'a dyn Store,
    quests: QuestLifecycle,
    mood: MoodLedger,
}

impl Engine {
    /// Restore all state from the store, apply configured modifiers and
    /// trait seeds, then run a tick.
    pub fn load(settings: Settings, store: Arc<dyn Store>, now: DateTime<Local>) -> EngineResult<Self> {
        let state = LifecycleState {
            quests: store.load_quests()?,
            completions: store.load_completions()?,
            snoozes: store.load_snoozes()?,
            total_xp: store.get_total_xp()?,
        };
        let quests = QuestLifecycle::restore(settings.engine.max_active_quests, state);

        let mut mood = MoodLedger::restore(
            MoodAggregator::new(settings.thresholds),
            store.load_mood_events()?,
            store.load_traits()?,
        );

        for modifier in &settings.modifiers {
            if let Err(e) = mood.library_mut().add_custom(
                modifier.event_type.clone(),
                modifier.name.clone(),
                modifier.default_value,
                modifier.duration_hours,
            ) {
                warn!(event_type = %modifier.event_type, error = %e, "Skipping configured modifier");
            }
        }

        // Seeds only create missing traits, so a removed trait stays removed
        for seed in &settings.traits {
            if mood.traits().contains(&seed.name) {
                continue;
            }
            let added = match seed.modifier {
                Some(modifier) => mood.traits_mut().add(
                    &seed.name,
                    seed.description.as_deref().unwrap_or_default(),
                    modifier,
                ),
                None => mood.traits_mut().add_stock(&seed.name)?,
            };
            store.save_trait(&added)?;
        }

        info!(
            quests = quests.quests().count(),
            completions = quests.completions().len(),
            mood_events = mood.events().len(),
            traits = mood.traits().all().len(),
            total_xp = quests.total_xp(),
            "Engine loaded"
        );

        let mut engine = Self {
            settings,
            store,
            quests,
            mood,
            load_events: Vec::new(),
        };
        engine.load_events = engine.tick(now)?;
        Ok(engine)
    }

    /// Events produced by the tick that ran during [`Engine::load`]
    pub fn take_load_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.load_events)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_store_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    /// Run `op` on a copy of the quest and mood state. The copy is kept only
    /// if `op` returns `Ok`.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Staged<'_>) -> EngineResult<T>) -> EngineResult<T> {
        let mut staged = Staged {
            settings: &self.settings,
            store: self.store.as_ref(),
            quests: self.quests.clone(),
            mood: self.mood.clone(),
        };
        let value = op(&mut staged)?;

        self.quests = staged.quests;
        self.mood = staged.mood;
        Ok(value)
    }

    // Quests

    pub fn create_quest(&mut self, new: NewQuest, now: DateTime<Local>) -> EngineResult<Quest> {
        self.transact(|staged| {
            let quest = staged.quests.create(new, now)?;
            staged.store.save_quest(&quest)?;
            Ok(quest)
        })
    }

    pub fn create_from_template(&mut self, template_id: &str, now: DateTime<Local>) -> EngineResult<Quest> {
        self.transact(|staged| {
            let template = staged
                .settings
                .get_template(template_id)
                .ok_or_else(|| QuestError::UnknownTemplate(template_id.to_string()))?;

            let quest = staged.quests.create_from_template(template, now)?;
            staged.store.save_quest(&quest)?;
            Ok(quest)
        })
    }

    /// Complete a quest and log its buffs as timed mood events
    pub fn complete_quest(
        &mut self,
        id: QuestId,
        details: CompletionDetails,
        now: DateTime<Local>,
    ) -> EngineResult<CompletionResult> {
        self.transact(|staged| {
            let result = staged.quests.complete(id, details, now)?;

            let description = format!("Quest completion: {}", result.quest.title);
            let hours = staged.settings.engine.completion_buff_hours;
            let events = result
                .buffs
                .iter()
                .map(|buff| {
                    staged.mood.log_event(
                        &buff.event_type,
                        buff.modifier,
                        Some(description.clone()),
                        Some(hours),
                        now,
                    )
                })
                .collect::<Result<Vec<MoodEvent>, _>>()?;

            staged
                .store
                .record_completion(&result.quest, &result.completion, &events, result.total_xp)?;
            debug!(quest_id = %id, events = events.len(), "Completion persisted");

            Ok(result)
        })
    }

    /// Snooze a quest. Missing mood score and weekday are filled from `now`.
    pub fn snooze_quest(
        &mut self,
        id: QuestId,
        mut request: SnoozeRequest,
        now: DateTime<Local>,
    ) -> EngineResult<QuestSnooze> {
        if request.context.mood_score.is_none() {
            request.context.mood_score = Some(self.mood.current_mood(now).score);
        }
        if request.context.day_of_week.is_none() {
            request.context.day_of_week = Some(weekday_name(now.weekday()).to_string());
        }

        self.transact(|staged| {
            let (quest, record) = staged.quests.snooze(id, request, now)?;
            staged.store.record_snooze(&quest, &record)?;
            Ok(record)
        })
    }

    pub fn hide_quest(&mut self, id: QuestId) -> EngineResult<Quest> {
        self.transact(|staged| {
            let quest = staged.quests.hide(id)?;
            staged.store.save_quest(&quest)?;
            Ok(quest)
        })
    }

    pub fn get_quest(&self, id: QuestId) -> EngineResult<&Quest> {
        Ok(self.quests.get(id)?)
    }

    /// Every quest in id order, whatever its status
    pub fn all_quests(&self) -> Vec<&Quest> {
        self.quests.quests().collect()
    }

    /// Ticks, then lists active quests up to the configured limit
    pub fn active_quests(
        &mut self,
        filter_by_eligibility: bool,
        now: DateTime<Local>,
    ) -> EngineResult<Vec<Quest>> {
        self.tick(now)?;
        Ok(self.quests.get_active(
            self.settings.engine.active_list_limit,
            filter_by_eligibility,
            now,
        ))
    }

    /// Completions in the last `days` days, or the configured window
    pub fn quest_history(&self, days: Option<u32>, now: DateTime<Local>) -> Vec<QuestCompletion> {
        let days = days.unwrap_or(self.settings.engine.history_days);
        self.quests.completion_history(days, now)
    }

    pub fn quest_stats(&self) -> QuestStats {
        self.quests.stats()
    }

    pub fn latest_snooze(&self, id: QuestId) -> Option<&QuestSnooze> {
        self.quests.latest_snooze(id)
    }

    // Mood

    pub fn log_mood_event(
        &mut self,
        event_type: &str,
        modifier: i32,
        description: Option<String>,
        duration_hours: Option<u32>,
        now: DateTime<Local>,
    ) -> EngineResult<MoodEvent> {
        self.transact(|staged| {
            let event = staged
                .mood
                .log_event(event_type, modifier, description, duration_hours, now)?;
            staged.store.save_mood_event(&event)?;
            Ok(event)
        })
    }

    pub fn log_from_library(&mut self, event_type: &str, now: DateTime<Local>) -> EngineResult<MoodEvent> {
        self.transact(|staged| {
            let event = staged.mood.log_from_library(event_type, now)?;
            staged.store.save_mood_event(&event)?;
            Ok(event)
        })
    }

    pub fn deactivate_mood_event(&mut self, id: EventId) -> EngineResult<MoodEvent> {
        self.transact(|staged| {
            let event = staged.mood.deactivate_event(id)?;
            staged.store.save_mood_event(&event)?;
            Ok(event)
        })
    }

    pub fn current_mood(&self, now: DateTime<Local>) -> MoodState {
        self.mood.current_mood(now)
    }

    pub fn modifiers(&self) -> Vec<&MoodModifier> {
        self.mood.library().all().collect()
    }

    pub fn add_trait(&mut self, name: &str, description: &str, modifier: i32) -> EngineResult<PersonalityTrait> {
        self.transact(|staged| {
            let added = staged.mood.traits_mut().add(name, description, modifier);
            staged.store.save_trait(&added)?;
            Ok(added)
        })
    }

    pub fn add_stock_trait(&mut self, name: &str) -> EngineResult<PersonalityTrait> {
        self.transact(|staged| {
            let added = staged.mood.traits_mut().add_stock(name)?;
            staged.store.save_trait(&added)?;
            Ok(added)
        })
    }

    /// Deactivate a trait. Returns false if it never existed.
    pub fn remove_trait(&mut self, name: &str) -> EngineResult<bool> {
        self.transact(|staged| {
            if !staged.mood.traits_mut().remove(name) {
                return Ok(false);
            }
            if let Some(removed) = staged.mood.traits().get(name) {
                staged.store.save_trait(removed)?;
            }
            Ok(true)
        })
    }

    pub fn active_traits(&self) -> Vec<PersonalityTrait> {
        self.mood.traits().active()
    }

    pub fn all_traits(&self) -> &[PersonalityTrait] {
        self.mood.traits().all()
    }

    /// Persist the current mood as a history row
    pub fn save_mood_snapshot(&self, now: DateTime<Local>) -> EngineResult<MoodSnapshot> {
        let mut snapshot = MoodSnapshot::from_state(&self.current_mood(now));
        snapshot.id = self.store.append_mood_snapshot(&snapshot)?;

        info!(snapshot_id = snapshot.id, score = snapshot.score, tier = %snapshot.tier, "Mood snapshot saved");
        Ok(snapshot)
    }

    pub fn recent_snapshots(&self, limit: usize) -> EngineResult<Vec<MoodSnapshot>> {
        Ok(self.store.recent_mood_snapshots(limit)?)
    }

    pub fn user_stats(&self, now: DateTime<Local>) -> UserStats {
        UserStats {
            total_xp: self.quests.total_xp(),
            quests_completed: self.quests.completions().len(),
            active_quests: self.quests.active_count(),
            mood: self.current_mood(now),
        }
    }

    // Time

    /// Run renewals, then snooze returns, persisting every changed quest in
    /// one write.
    ///
    /// Safe to call repeatedly; a second call at the same `now` is a no-op.
    pub fn tick(&mut self, now: DateTime<Local>) -> EngineResult<Vec<CoreEvent>> {
        self.transact(|staged| {
            let mut events = Vec::new();
            let mut changed = Vec::new();

            for quest_id in staged.quests.process_pending_renewals(now) {
                let quest = staged.quests.get(quest_id)?;
                events.push(CoreEvent::QuestRenewed {
                    quest_id,
                    renewal_count: quest.renewal_count,
                });
                changed.push(quest.clone());
            }

            for quest_id in staged.quests.process_snooze_returns(now) {
                changed.push(staged.quests.get(quest_id)?.clone());
                events.push(CoreEvent::QuestReturned { quest_id });
            }

            if !changed.is_empty() {
                staged.store.save_quests(&changed)?;
                debug!(changes = events.len(), "Tick applied");
            }
            Ok(events)
        })
    }
}

//! Quest lifecycle state machine
//!
//! `QuestLifecycle` is the single entry point for quest state changes:
//! creation under a capacity limit, completion with XP and mood buffs,
//! hiding, snoozing, and the renewal and snooze-return sweeps.
//!
//! Every operation validates before it mutates, so a failed call leaves
//! the lifecycle untouched.

use chrono::{DateTime, Local};
use moodbbs_api::{
    CompletionDetails, MoodBuff, NewQuest, Quest, QuestCategory, QuestCompletion, QuestSnooze,
    QuestStats, QuestStatus, QuestTemplate, SnoozeRequest,
};
use moodbbs_util::{CompletionId, QuestId, checked_sub_days, next_id_after};
use std::collections::BTreeMap;
use tracing::info;

use crate::{QuestError, RenewalScheduler, SnoozeTracker, is_eligible_today};

/// Buff every completion emits first
pub const QUEST_COMPLETED_BUFF: (&str, i32) = ("quest_completed", 5);

/// Buff emitted for the quest's category, after [`QUEST_COMPLETED_BUFF`]
pub fn category_buff(category: QuestCategory) -> MoodBuff {
    match category {
        QuestCategory::Constitutional => MoodBuff::new("constitutional_activity", 6),
        QuestCategory::Social => MoodBuff::new("social_activity", 8),
        QuestCategory::Creative => MoodBuff::new("creative_activity", 5),
        QuestCategory::Experiential => MoodBuff::new("experiential_activity", 7),
    }
}

/// Persisted entities a lifecycle is rebuilt from
#[derive(Debug, Clone, Default)]
pub struct LifecycleState {
    pub quests: Vec<Quest>,
    pub completions: Vec<QuestCompletion>,
    pub snoozes: Vec<QuestSnooze>,
    pub total_xp: u64,
}

/// Outcome of a successful completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    /// The quest after its post-completion transition
    pub quest: Quest,
    pub completion: QuestCompletion,
    pub xp_awarded: u32,
    pub buffs: Vec<MoodBuff>,
    pub total_xp: u64,
}

#[derive(Debug, Clone)]
pub struct QuestLifecycle {
    quests: BTreeMap<QuestId, Quest>,
    completions: Vec<QuestCompletion>,
    snoozes: SnoozeTracker,
    max_active_quests: usize,
    next_quest_id: i64,
    next_completion_id: i64,
    total_xp: u64,
}

impl QuestLifecycle {
    pub fn new(max_active_quests: usize) -> Self {
        Self::restore(max_active_quests, LifecycleState::default())
    }

    pub fn restore(max_active_quests: usize, state: LifecycleState) -> Self {
        let next_quest_id = next_id_after(state.quests.iter().map(|q| q.id.get()));
        let mut completions = state.completions;
        completions.sort_by_key(|c| c.id);
        let next_completion_id = next_id_after(completions.iter().map(|c| c.id.get()));

        Self {
            quests: state.quests.into_iter().map(|q| (q.id, q)).collect(),
            completions,
            snoozes: SnoozeTracker::restore(state.snoozes),
            max_active_quests,
            next_quest_id,
            next_completion_id,
            total_xp: state.total_xp,
        }
    }

    pub fn max_active_quests(&self) -> usize {
        self.max_active_quests
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    /// Raw count of quests in `active` status, regardless of eligibility
    pub fn active_count(&self) -> usize {
        count_active(&self.quests)
    }

    pub fn create(&mut self, new: NewQuest, now: DateTime<Local>) -> Result<Quest, QuestError> {
        if self.active_count() >= self.max_active_quests {
            return Err(QuestError::CapacityExceeded {
                max: self.max_active_quests,
            });
        }

        let quest = Quest::from_new(QuestId::new(self.next_quest_id), new, now);
        self.next_quest_id += 1;
        self.quests.insert(quest.id, quest.clone());

        info!(
            quest_id = %quest.id,
            title = %quest.title,
            category = %quest.category,
            template_id = ?quest.template_id,
            "Quest created"
        );
        Ok(quest)
    }

    pub fn create_from_template(
        &mut self,
        template: &QuestTemplate,
        now: DateTime<Local>,
    ) -> Result<Quest, QuestError> {
        self.create(template.instantiate(), now)
    }

    /// Complete a quest: award XP, build buffs, record the completion, then
    /// hand the quest to the renewal scheduler.
    pub fn complete(
        &mut self,
        id: QuestId,
        details: CompletionDetails,
        now: DateTime<Local>,
    ) -> Result<CompletionResult, QuestError> {
        let quest = self.quests.get_mut(&id).ok_or(QuestError::NotFound(id))?;

        match quest.status {
            QuestStatus::Active | QuestStatus::Snoozed => {}
            QuestStatus::Completed | QuestStatus::PendingRenewal => {
                return Err(QuestError::AlreadyCompleted(id));
            }
            QuestStatus::Hidden => {
                return Err(QuestError::InvalidTransition {
                    id,
                    status: quest.status,
                    action: "complete",
                });
            }
        }
        let transition = RenewalScheduler::completion_transition(quest, now)?;

        quest.completed_at = Some(now);

        let xp_awarded = quest.xp_reward;
        self.total_xp += u64::from(xp_awarded);

        let mut buffs = vec![
            MoodBuff::new(QUEST_COMPLETED_BUFF.0, QUEST_COMPLETED_BUFF.1),
            category_buff(quest.category),
        ];
        buffs.extend(details.extra_modifiers);

        let completion = QuestCompletion {
            id: CompletionId::new(self.next_completion_id),
            quest_id: id,
            completed_at: now,
            location_visited: details.location_visited,
            duration_minutes: details.duration_minutes,
            notes: details.notes,
            buffs: buffs.clone(),
            xp_awarded,
        };
        self.next_completion_id += 1;
        self.completions.push(completion.clone());

        RenewalScheduler::apply_transition(quest, transition);

        info!(
            quest_id = %id,
            xp_awarded,
            total_xp = self.total_xp,
            status = %quest.status,
            "Quest completed"
        );

        Ok(CompletionResult {
            quest: quest.clone(),
            completion,
            xp_awarded,
            buffs,
            total_xp: self.total_xp,
        })
    }

    /// Hide a quest permanently
    pub fn hide(&mut self, id: QuestId) -> Result<Quest, QuestError> {
        let quest = self.quests.get_mut(&id).ok_or(QuestError::NotFound(id))?;
        quest.status = QuestStatus::Hidden;
        quest.next_eligible_renewal = None;

        info!(quest_id = %id, "Quest hidden");
        Ok(quest.clone())
    }

    pub fn get(&self, id: QuestId) -> Result<&Quest, QuestError> {
        self.quests.get(&id).ok_or(QuestError::NotFound(id))
    }

    /// All quests in id order
    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    /// Active quests, oldest first, optionally filtered to those eligible today
    pub fn get_active(
        &self,
        limit: usize,
        filter_by_eligibility: bool,
        now: DateTime<Local>,
    ) -> Vec<Quest> {
        let mut active: Vec<&Quest> = self
            .quests
            .values()
            .filter(|q| q.is_active())
            .filter(|q| !filter_by_eligibility || is_eligible_today(q, now))
            .collect();

        active.sort_by_key(|q| (q.created_at, q.id));
        active.into_iter().take(limit).cloned().collect()
    }

    /// Completions in the trailing `days` window, most recent first
    ///
    /// A window reaching past the representable range covers everything.
    pub fn completion_history(&self, days: u32, now: DateTime<Local>) -> Vec<QuestCompletion> {
        let since = checked_sub_days(now, days);
        let mut history: Vec<QuestCompletion> = self
            .completions
            .iter()
            .filter(|c| since.is_none_or(|since| c.completed_at >= since))
            .cloned()
            .collect();

        history.sort_by(|a, b| (b.completed_at, b.id).cmp(&(a.completed_at, a.id)));
        history
    }

    pub fn completions(&self) -> &[QuestCompletion] {
        &self.completions
    }

    pub fn stats(&self) -> QuestStats {
        let mut by_category = BTreeMap::new();
        for completion in &self.completions {
            if let Some(quest) = self.quests.get(&completion.quest_id) {
                *by_category.entry(quest.category).or_insert(0) += 1;
            }
        }

        QuestStats {
            total_completed: self.completions.len(),
            by_category,
            total_xp: self.total_xp,
        }
    }

    pub fn snooze(
        &mut self,
        id: QuestId,
        request: SnoozeRequest,
        now: DateTime<Local>,
    ) -> Result<(Quest, QuestSnooze), QuestError> {
        let quest = self.quests.get_mut(&id).ok_or(QuestError::NotFound(id))?;
        let record = self.snoozes.snooze(quest, request, now)?;
        Ok((quest.clone(), record))
    }

    pub fn latest_snooze(&self, id: QuestId) -> Option<&QuestSnooze> {
        self.snoozes.latest_snooze(id)
    }

    pub fn snoozes(&self) -> &SnoozeTracker {
        &self.snoozes
    }

    pub fn process_pending_renewals(&mut self, now: DateTime<Local>) -> Vec<QuestId> {
        RenewalScheduler::process_pending_renewals(
            &mut self.quests,
            now,
            self.max_active_quests,
            count_active,
        )
    }

    pub fn process_snooze_returns(&mut self, now: DateTime<Local>) -> Vec<QuestId> {
        self.snoozes.process_snooze_returns(&mut self.quests, now)
    }
}

fn count_active(quests: &BTreeMap<QuestId, Quest>) -> usize {
    quests.values().filter(|q| q.is_active()).count()
}

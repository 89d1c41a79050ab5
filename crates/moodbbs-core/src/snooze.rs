//! Snooze records and snooze returns

use chrono::{DateTime, Local};
use moodbbs_api::{Quest, QuestSnooze, QuestStatus, SnoozeRequest};
use moodbbs_util::{QuestId, SnoozeId, checked_add_days, next_id_after};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::QuestError;

/// Snooze history for all quests. Records are never removed.
#[derive(Debug, Clone)]
pub struct SnoozeTracker {
    snoozes: Vec<QuestSnooze>,
    next_id: i64,
}

impl Default for SnoozeTracker {
    fn default() -> Self {
        Self::restore(Vec::new())
    }
}

impl SnoozeTracker {
    pub fn restore(mut snoozes: Vec<QuestSnooze>) -> Self {
        snoozes.sort_by_key(|s| s.id);
        let next_id = next_id_after(snoozes.iter().map(|s| s.id.get()));
        Self { snoozes, next_id }
    }

    /// Defer an active (or already snoozed) quest for `snooze_days`
    pub fn snooze(
        &mut self,
        quest: &mut Quest,
        request: SnoozeRequest,
        now: DateTime<Local>,
    ) -> Result<QuestSnooze, QuestError> {
        if !matches!(quest.status, QuestStatus::Active | QuestStatus::Snoozed) {
            return Err(QuestError::InvalidTransition {
                id: quest.id,
                status: quest.status,
                action: "snooze",
            });
        }

        let return_at = checked_add_days(now, request.snooze_days).ok_or(
            QuestError::DurationOutOfRange {
                days: request.snooze_days,
            },
        )?;

        let record = QuestSnooze {
            id: SnoozeId::new(self.next_id),
            quest_id: quest.id,
            snoozed_at: now,
            return_at,
            reason: request.reason_text,
            reason_category: request.reason_category,
            context: request.context,
        };
        self.next_id += 1;
        quest.status = QuestStatus::Snoozed;
        self.snoozes.push(record.clone());

        info!(
            quest_id = %quest.id,
            reason = %record.reason_category,
            return_at = %record.return_at,
            "Quest snoozed"
        );
        Ok(record)
    }

    /// The record governing a quest's return: latest `snoozed_at`, ties by id
    pub fn latest_snooze(&self, quest_id: QuestId) -> Option<&QuestSnooze> {
        self.snoozes
            .iter()
            .filter(|s| s.quest_id == quest_id)
            .max_by_key(|s| (s.snoozed_at, s.id))
    }

    pub fn history(&self, quest_id: QuestId) -> Vec<&QuestSnooze> {
        self.snoozes.iter().filter(|s| s.quest_id == quest_id).collect()
    }

    pub fn all(&self) -> &[QuestSnooze] {
        &self.snoozes
    }

    /// Return snoozed quests whose latest snooze has elapsed.
    ///
    /// Only quests whose status is still exactly `snoozed` are touched.
    pub fn process_snooze_returns(
        &self,
        quests: &mut BTreeMap<QuestId, Quest>,
        now: DateTime<Local>,
    ) -> Vec<QuestId> {
        let mut returned = Vec::new();

        for quest in quests.values_mut() {
            if quest.status != QuestStatus::Snoozed {
                continue;
            }

            let due = match self.latest_snooze(quest.id) {
                Some(record) => record.return_at <= now,
                None => {
                    warn!(quest_id = %quest.id, "Snoozed quest has no snooze record; returning it");
                    true
                }
            };

            if due {
                quest.status = QuestStatus::Active;
                info!(quest_id = %quest.id, "Quest returned from snooze");
                returned.push(quest.id);
            }
        }

        returned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use moodbbs_api::{Difficulty, NewQuest, QuestCategory, SnoozeReason};

    fn at(day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 10, day, 18, 0, 0).unwrap()
    }

    fn quest(id: i64) -> Quest {
        Quest::from_new(
            QuestId::new(id),
            NewQuest::new("Picnic", QuestCategory::Experiential, Difficulty::Medium, 20),
            at(1),
        )
    }

    #[test]
    fn snooze_then_return_after_window() {
        let mut tracker = SnoozeTracker::default();
        let mut q = quest(1);

        let record = tracker
            .snooze(&mut q, SnoozeRequest::new(SnoozeReason::Weather, 7).with_reason("Rain"), at(1))
            .unwrap();
        assert_eq!(q.status, QuestStatus::Snoozed);
        assert_eq!(record.return_at, at(1) + Duration::days(7));
        assert_eq!(record.reason.as_deref(), Some("Rain"));

        let mut quests = BTreeMap::from([(q.id, q)]);
        assert!(tracker.process_snooze_returns(&mut quests, at(5)).is_empty());

        let returned = tracker.process_snooze_returns(&mut quests, at(9));
        assert_eq!(returned, vec![QuestId::new(1)]);
        assert_eq!(quests[&QuestId::new(1)].status, QuestStatus::Active);

        assert!(tracker.process_snooze_returns(&mut quests, at(9)).is_empty());
    }

    #[test]
    fn resnooze_extends_and_keeps_history() {
        let mut tracker = SnoozeTracker::default();
        let mut q = quest(1);

        tracker.snooze(&mut q, SnoozeRequest::new(SnoozeReason::Time, 2), at(1)).unwrap();
        tracker.snooze(&mut q, SnoozeRequest::new(SnoozeReason::Mood, 10), at(2)).unwrap();

        assert_eq!(tracker.history(q.id).len(), 2);
        assert_eq!(
            tracker.latest_snooze(q.id).unwrap().return_at,
            at(2) + Duration::days(10)
        );

        let mut quests = BTreeMap::from([(q.id, q)]);
        assert!(tracker.process_snooze_returns(&mut quests, at(5)).is_empty());
    }

    #[test]
    fn out_of_range_snooze_is_rejected_without_change() {
        let mut tracker = SnoozeTracker::default();
        let mut q = quest(1);

        let err = tracker
            .snooze(&mut q, SnoozeRequest::new(SnoozeReason::Time, u32::MAX), at(1))
            .unwrap_err();
        assert_eq!(err, QuestError::DurationOutOfRange { days: u32::MAX });
        assert_eq!(q.status, QuestStatus::Active);
        assert!(tracker.all().is_empty());

        let record = tracker
            .snooze(&mut q, SnoozeRequest::new(SnoozeReason::Time, 1), at(1))
            .unwrap();
        assert_eq!(record.id, SnoozeId::new(1));
    }

    #[test]
    fn stale_record_does_not_revert_other_status() {
        let mut tracker = SnoozeTracker::default();
        let mut q = quest(1);
        tracker.snooze(&mut q, SnoozeRequest::new(SnoozeReason::Other, 1), at(1)).unwrap();
        q.status = QuestStatus::Hidden;

        let mut quests = BTreeMap::from([(q.id, q)]);
        assert!(tracker.process_snooze_returns(&mut quests, at(20)).is_empty());
        assert_eq!(quests[&QuestId::new(1)].status, QuestStatus::Hidden);
    }

    #[test]
    fn cannot_snooze_completed_quest() {
        let mut tracker = SnoozeTracker::default();
        let mut q = quest(1);
        q.status = QuestStatus::PendingRenewal;

        let err = tracker
            .snooze(&mut q, SnoozeRequest::new(SnoozeReason::Unspecified, 3), at(1))
            .unwrap_err();
        assert!(matches!(err, QuestError::InvalidTransition { action: "snooze", .. }));
        assert!(tracker.all().is_empty());
    }

    #[test]
    fn ties_on_snoozed_at_resolve_by_id() {
        let mut tracker = SnoozeTracker::default();
        let mut q = quest(1);
        tracker.snooze(&mut q, SnoozeRequest::new(SnoozeReason::Time, 1), at(1)).unwrap();
        tracker.snooze(&mut q, SnoozeRequest::new(SnoozeReason::Time, 4), at(1)).unwrap();

        assert_eq!(tracker.latest_snooze(q.id).unwrap().id, SnoozeId::new(2));
    }

    #[test]
    fn snoozed_without_record_returns() {
        let tracker = SnoozeTracker::default();
        let mut q = quest(1);
        q.status = QuestStatus::Snoozed;

        let mut quests = BTreeMap::from([(q.id, q)]);
        assert_eq!(tracker.process_snooze_returns(&mut quests, at(1)), vec![QuestId::new(1)]);
    }
}

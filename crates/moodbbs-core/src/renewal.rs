//! Renewal scheduling for completed quests

use chrono::{DateTime, Datelike, Local};
use moodbbs_api::{Quest, QuestStatus, RenewalType};
use moodbbs_util::{QuestId, checked_add_days};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::QuestError;

/// Decides what a completed quest becomes and when pending quests come back.
pub struct RenewalScheduler;

impl RenewalScheduler {
    /// Status a quest completed at `now` moves to, with its renewal date if
    /// it is pending. Nothing is changed.
    pub fn completion_transition(
        quest: &Quest,
        now: DateTime<Local>,
    ) -> Result<(QuestStatus, Option<DateTime<Local>>), QuestError> {
        match &quest.renewal_policy {
            None => Ok((QuestStatus::Completed, None)),
            Some(policy) if policy.renewal_type == RenewalType::Never => {
                Ok((QuestStatus::Hidden, None))
            }
            Some(policy) => {
                let next = checked_add_days(now, policy.cooldown_days).ok_or(
                    QuestError::DurationOutOfRange {
                        days: policy.cooldown_days,
                    },
                )?;
                Ok((QuestStatus::PendingRenewal, Some(next)))
            }
        }
    }

    /// Apply a result of [`RenewalScheduler::completion_transition`]
    pub fn apply_transition(quest: &mut Quest, (status, next): (QuestStatus, Option<DateTime<Local>>)) {
        quest.status = status;
        if next.is_some() {
            quest.next_eligible_renewal = next;
        }
    }

    /// Move a just-completed quest to its post-completion status
    pub fn on_completed(quest: &mut Quest, now: DateTime<Local>) -> Result<(), QuestError> {
        let transition = Self::completion_transition(quest, now)?;
        Self::apply_transition(quest, transition);
        Ok(())
    }

    /// Cooldown elapsed and the current month is in the policy's window
    pub fn is_due(quest: &Quest, now: DateTime<Local>) -> bool {
        if quest.status != QuestStatus::PendingRenewal {
            return false;
        }
        let Some(policy) = &quest.renewal_policy else {
            return false;
        };
        let Some(next) = quest.next_eligible_renewal else {
            return false;
        };
        next <= now && policy.allows_month(now.month())
    }

    /// Reactivate due quests in id order while capacity allows.
    ///
    /// `active_count` is re-evaluated before each renewal so that earlier
    /// renewals in the same sweep take up capacity. Returns the renewed ids.
    pub fn process_pending_renewals<F>(
        quests: &mut BTreeMap<QuestId, Quest>,
        now: DateTime<Local>,
        max_active: usize,
        active_count: F,
    ) -> Vec<QuestId>
    where
        F: Fn(&BTreeMap<QuestId, Quest>) -> usize,
    {
        let due: Vec<QuestId> = quests
            .values()
            .filter(|q| {
                if q.status == QuestStatus::PendingRenewal && q.next_eligible_renewal.is_none() {
                    warn!(quest_id = %q.id, "Pending quest has no renewal date; leaving it pending");
                }
                Self::is_due(q, now)
            })
            .map(|q| q.id)
            .collect();

        let mut renewed = Vec::new();
        for id in due {
            if active_count(quests) >= max_active {
                info!(quest_id = %id, max_active, "Renewal deferred: at capacity");
                continue;
            }
            let Some(quest) = quests.get_mut(&id) else {
                continue;
            };

            quest.status = QuestStatus::Active;
            quest.renewal_count += 1;
            quest.next_eligible_renewal = None;
            quest.completed_at = None;

            info!(quest_id = %id, renewal_count = quest.renewal_count, "Quest renewed");
            renewed.push(id);
        }

        renewed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use moodbbs_api::{Difficulty, NewQuest, QuestCategory, RenewalPolicy};

    fn at(month: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, month, day, 9, 0, 0).unwrap()
    }

    fn quest(id: i64, policy: Option<RenewalPolicy>) -> Quest {
        let mut new = NewQuest::new("Stretch", QuestCategory::Constitutional, Difficulty::Easy, 5);
        new.renewal_policy = policy;
        Quest::from_new(QuestId::new(id), new, at(1, 1))
    }

    fn count_active(quests: &BTreeMap<QuestId, Quest>) -> usize {
        quests.values().filter(|q| q.is_active()).count()
    }

    #[test]
    fn completion_without_policy_is_terminal() {
        let mut q = quest(1, None);
        RenewalScheduler::on_completed(&mut q, at(2, 1)).unwrap();
        assert_eq!(q.status, QuestStatus::Completed);
        assert!(q.next_eligible_renewal.is_none());
    }

    #[test]
    fn never_renewing_quest_is_hidden() {
        let mut q = quest(1, Some(RenewalPolicy::new(RenewalType::Never, 30)));
        RenewalScheduler::on_completed(&mut q, at(2, 1)).unwrap();
        assert_eq!(q.status, QuestStatus::Hidden);
        assert!(q.next_eligible_renewal.is_none());
    }

    #[test]
    fn weekly_cooldown() {
        let mut q = quest(1, Some(RenewalPolicy::new(RenewalType::Weekly, 7)));
        let completed_at = at(2, 1);
        RenewalScheduler::on_completed(&mut q, completed_at).unwrap();

        assert_eq!(q.status, QuestStatus::PendingRenewal);
        let next = q.next_eligible_renewal.unwrap();
        assert!((next - (completed_at + Duration::days(7))).num_seconds().abs() <= 5);
    }

    #[test]
    fn out_of_range_cooldown_leaves_quest_untouched() {
        let mut q = quest(1, Some(RenewalPolicy::new(RenewalType::Seasonal, u32::MAX)));

        let err = RenewalScheduler::on_completed(&mut q, at(2, 1)).unwrap_err();
        assert_eq!(err, QuestError::DurationOutOfRange { days: u32::MAX });
        assert_eq!(q.status, QuestStatus::Active);
        assert!(q.next_eligible_renewal.is_none());
    }

    #[test]
    fn renews_after_cooldown_and_is_idempotent() {
        let mut q = quest(1, Some(RenewalPolicy::new(RenewalType::Daily, 1)));
        q.completed_at = Some(at(2, 1));
        RenewalScheduler::on_completed(&mut q, at(2, 1)).unwrap();
        let mut quests = BTreeMap::from([(q.id, q)]);

        assert!(RenewalScheduler::process_pending_renewals(&mut quests, at(2, 1), 3, count_active).is_empty());

        let renewed = RenewalScheduler::process_pending_renewals(&mut quests, at(2, 2), 3, count_active);
        assert_eq!(renewed, vec![QuestId::new(1)]);

        let q = &quests[&QuestId::new(1)];
        assert_eq!(q.status, QuestStatus::Active);
        assert_eq!(q.renewal_count, 1);
        assert!(q.completed_at.is_none());
        assert!(q.next_eligible_renewal.is_none());

        assert!(RenewalScheduler::process_pending_renewals(&mut quests, at(2, 2), 3, count_active).is_empty());
        assert_eq!(quests[&QuestId::new(1)].renewal_count, 1);
    }

    #[test]
    fn never_renews_outside_active_months() {
        let policy = RenewalPolicy::new(RenewalType::Seasonal, 1).with_active_months([6, 7, 8]);
        let mut q = quest(1, Some(policy));
        RenewalScheduler::on_completed(&mut q, at(2, 1)).unwrap();
        let mut quests = BTreeMap::from([(q.id, q)]);

        for month in [3, 4, 5] {
            let renewed = RenewalScheduler::process_pending_renewals(&mut quests, at(month, 10), 3, count_active);
            assert!(renewed.is_empty());
        }
        assert_eq!(quests[&QuestId::new(1)].status, QuestStatus::PendingRenewal);

        let renewed = RenewalScheduler::process_pending_renewals(&mut quests, at(6, 1), 3, count_active);
        assert_eq!(renewed.len(), 1);
    }

    #[test]
    fn capacity_is_granted_in_id_order() {
        let mut quests = BTreeMap::new();
        for id in [3, 1, 2] {
            let mut q = quest(id, Some(RenewalPolicy::new(RenewalType::Daily, 1)));
            RenewalScheduler::on_completed(&mut q, at(2, 1)).unwrap();
            quests.insert(q.id, q);
        }
        let active = quest(10, None);
        quests.insert(active.id, active);

        let renewed = RenewalScheduler::process_pending_renewals(&mut quests, at(2, 5), 3, count_active);
        assert_eq!(renewed, vec![QuestId::new(1), QuestId::new(2)]);
        assert_eq!(quests[&QuestId::new(3)].status, QuestStatus::PendingRenewal);
    }

    #[test]
    fn pending_without_date_stays_pending() {
        let mut q = quest(1, Some(RenewalPolicy::new(RenewalType::Daily, 1)));
        q.status = QuestStatus::PendingRenewal;
        let mut quests = BTreeMap::from([(q.id, q)]);

        let renewed = RenewalScheduler::process_pending_renewals(&mut quests, at(12, 31), 3, count_active);
        assert!(renewed.is_empty());
    }
}

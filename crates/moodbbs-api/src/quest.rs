//! Quest types shared between the core, the store and the CLI

use chrono::{DateTime, Local};
use moodbbs_util::{CompletionId, QuestId, SnoozeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

labeled_enum! {
    /// Lifecycle status of a quest
    "quest status"
    pub enum QuestStatus {
        Active => "active",
        Snoozed => "snoozed",
        Completed => "completed",
        PendingRenewal => "pending_renewal",
        Hidden => "hidden",
    }
}

labeled_enum! {
    /// Quest category, which decides the category buff on completion
    "quest category"
    pub enum QuestCategory {
        Social => "social",
        Constitutional => "constitutional",
        Creative => "creative",
        Experiential => "experiential",
    }
}

labeled_enum! {
    "difficulty"
    pub enum Difficulty {
        Easy => "easy",
        Medium => "medium",
        Hard => "hard",
        Extreme => "extreme",
    }
}

labeled_enum! {
    /// Cadence at which a completed quest comes back
    "renewal type"
    pub enum RenewalType {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Seasonal => "seasonal",
        /// Completing the quest hides it for good
        Never => "never",
    }
}

labeled_enum! {
    "snooze reason"
    pub enum SnoozeReason {
        Weather => "weather",
        Time => "time",
        Mood => "mood",
        Other => "other",
        Unspecified => "unspecified",
    }
}

impl QuestStatus {
    /// Terminal statuses never change again without an explicit operation
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Hidden)
    }
}

impl RenewalType {
    /// Cooldown used when a quest is created without an explicit one
    pub fn default_cooldown_days(&self) -> u32 {
        match self {
            RenewalType::Daily => 1,
            RenewalType::Weekly => 7,
            RenewalType::Monthly => 30,
            RenewalType::Seasonal => 90,
            RenewalType::Never => 0,
        }
    }
}

/// When and how a completed quest renews
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalPolicy {
    pub renewal_type: RenewalType,
    #[serde(default)]
    pub cooldown_days: u32,
    /// Stored and round-tripped; capacity is governed by the global limit
    #[serde(default = "default_max_active_instances")]
    pub max_active_instances: u32,
    /// Months (1-12) in which the quest may renew; `None` means all year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_months: Option<BTreeSet<u32>>,
}

fn default_max_active_instances() -> u32 {
    1
}

impl RenewalPolicy {
    pub fn new(renewal_type: RenewalType, cooldown_days: u32) -> Self {
        Self {
            renewal_type,
            cooldown_days,
            max_active_instances: default_max_active_instances(),
            active_months: None,
        }
    }

    pub fn with_active_months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.active_months = Some(months.into_iter().collect());
        self
    }

    /// Whether the quest may renew during `month` (1-12)
    pub fn allows_month(&self, month: u32) -> bool {
        self.active_months
            .as_ref()
            .is_none_or(|months| months.contains(&month))
    }
}

/// Free-form scheduling constraint attached to a quest.
///
/// `kind` is usually `day_of_week` or `day_of_month`; unknown kinds and
/// unparseable notes never hide a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestConstraint {
    pub kind: String,
    pub note: String,
}

impl QuestConstraint {
    pub fn new(kind: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            note: note.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub template_id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: QuestCategory,
    pub difficulty: Difficulty,
    pub location: Option<String>,
    pub xp_reward: u32,
    pub status: QuestStatus,
    pub renewal_policy: Option<RenewalPolicy>,
    /// Set only while the quest is pending renewal
    pub next_eligible_renewal: Option<DateTime<Local>>,
    pub renewal_count: u32,
    pub created_at: DateTime<Local>,
    pub due_at: Option<DateTime<Local>>,
    pub constraint: Option<QuestConstraint>,
    pub completed_at: Option<DateTime<Local>>,
}

impl Quest {
    /// Build a fresh active quest from a creation request
    pub fn from_new(id: QuestId, new: NewQuest, now: DateTime<Local>) -> Self {
        Self {
            id,
            template_id: new.template_id,
            title: new.title,
            description: new.description,
            category: new.category,
            difficulty: new.difficulty,
            location: new.location,
            xp_reward: new.xp_reward,
            status: QuestStatus::Active,
            renewal_policy: new.renewal_policy,
            next_eligible_renewal: None,
            renewal_count: 0,
            created_at: now,
            due_at: new.due_at,
            constraint: new.constraint,
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }
}

/// Request to create a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: QuestCategory,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub location: Option<String>,
    pub xp_reward: u32,
    #[serde(default)]
    pub renewal_policy: Option<RenewalPolicy>,
    #[serde(default)]
    pub due_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub constraint: Option<QuestConstraint>,
    #[serde(default)]
    pub template_id: Option<String>,
}

impl NewQuest {
    pub fn new(
        title: impl Into<String>,
        category: QuestCategory,
        difficulty: Difficulty,
        xp_reward: u32,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category,
            difficulty,
            location: None,
            xp_reward,
            renewal_policy: None,
            due_at: None,
            constraint: None,
            template_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_renewal(mut self, policy: RenewalPolicy) -> Self {
        self.renewal_policy = Some(policy);
        self
    }

    pub fn with_due_at(mut self, due_at: DateTime<Local>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn with_constraint(mut self, kind: impl Into<String>, note: impl Into<String>) -> Self {
        self.constraint = Some(QuestConstraint::new(kind, note));
        self
    }
}

/// Reusable quest pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestTemplate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: QuestCategory,
    pub difficulty: Difficulty,
    pub base_xp: u32,
    pub renewal_policy: Option<RenewalPolicy>,
    pub tags: Vec<String>,
}

impl QuestTemplate {
    pub fn instantiate(&self) -> NewQuest {
        NewQuest {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            difficulty: self.difficulty,
            location: None,
            xp_reward: self.base_xp,
            renewal_policy: self.renewal_policy.clone(),
            due_at: None,
            constraint: None,
            template_id: Some(self.id.clone()),
        }
    }
}

/// A single `(event_type, modifier)` pair emitted by a completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodBuff {
    pub event_type: String,
    pub modifier: i32,
}

impl MoodBuff {
    pub fn new(event_type: impl Into<String>, modifier: i32) -> Self {
        Self {
            event_type: event_type.into(),
            modifier,
        }
    }
}

/// Caller-supplied details of a completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionDetails {
    pub location_visited: Option<String>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    /// Appended verbatim after the standard buffs
    pub extra_modifiers: Vec<MoodBuff>,
}

/// Immutable audit record of one completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestCompletion {
    pub id: CompletionId,
    pub quest_id: QuestId,
    pub completed_at: DateTime<Local>,
    pub location_visited: Option<String>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub buffs: Vec<MoodBuff>,
    pub xp_awarded: u32,
}

/// Situational data recorded alongside a snooze
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnoozeContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Request to defer a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnoozeRequest {
    pub reason_category: SnoozeReason,
    pub reason_text: Option<String>,
    pub snooze_days: u32,
    pub context: SnoozeContext,
}

impl SnoozeRequest {
    pub fn new(reason_category: SnoozeReason, snooze_days: u32) -> Self {
        Self {
            reason_category,
            reason_text: None,
            snooze_days,
            context: SnoozeContext::default(),
        }
    }

    pub fn with_reason(mut self, text: impl Into<String>) -> Self {
        self.reason_text = Some(text.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestSnooze {
    pub id: SnoozeId,
    pub quest_id: QuestId,
    pub snoozed_at: DateTime<Local>,
    pub return_at: DateTime<Local>,
    pub reason: Option<String>,
    pub reason_category: SnoozeReason,
    pub context: SnoozeContext,
}

/// Aggregate completion statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStats {
    pub total_completed: usize,
    pub by_category: BTreeMap<QuestCategory, usize>,
    pub total_xp: u64,
}

//! Day-based quest eligibility
//!
//! Constraints are free text typed by the user, so parsing is lenient and
//! anything that cannot be understood leaves the quest visible.

use chrono::{DateTime, Datelike, Local, Weekday};
use moodbbs_api::{Quest, QuestConstraint};
use moodbbs_util::{days_in_month, parse_weekday};
use std::collections::BTreeSet;

/// Which week of the month an nth-weekday rule targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekPosition {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl WeekPosition {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "first" => Some(Self::First),
            "second" => Some(Self::Second),
            "third" => Some(Self::Third),
            "fourth" => Some(Self::Fourth),
            "last" => Some(Self::Last),
            _ => None,
        }
    }

    fn contains(&self, day: u32, month_len: u32) -> bool {
        match self {
            Self::First => (1..=7).contains(&day),
            Self::Second => (8..=14).contains(&day),
            Self::Third => (15..=21).contains(&day),
            Self::Fourth => (22..=28).contains(&day),
            Self::Last => day + 7 > month_len,
        }
    }
}

/// Parsed form of a [`QuestConstraint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintRule {
    Unconstrained,
    DaysOfWeek(Vec<Weekday>),
    DaysOfMonth(BTreeSet<u32>),
    NthWeekday { position: WeekPosition, weekday: Weekday },
    /// Treated as always eligible
    Unrecognized,
}

impl ConstraintRule {
    pub fn parse(constraint: Option<&QuestConstraint>) -> Self {
        let Some(constraint) = constraint else {
            return Self::Unconstrained;
        };
        let note = constraint.note.trim().to_ascii_lowercase();
        if note.is_empty() {
            return Self::Unconstrained;
        }

        match constraint.kind.trim().to_ascii_lowercase().as_str() {
            "day_of_week" => parse_days_of_week(&note),
            "day_of_month" if note.contains('_') => parse_nth_weekday(&note),
            "day_of_month" => parse_days_of_month(&note),
            _ => Self::Unrecognized,
        }
    }

    pub fn matches(&self, now: DateTime<Local>) -> bool {
        match self {
            Self::Unconstrained | Self::Unrecognized => true,
            Self::DaysOfWeek(days) => days.contains(&now.weekday()),
            Self::DaysOfMonth(days) => days.contains(&now.day()),
            Self::NthWeekday { position, weekday } => {
                now.weekday() == *weekday
                    && position.contains(now.day(), days_in_month(now.year(), now.month()))
            }
        }
    }
}

fn parse_days_of_week(note: &str) -> ConstraintRule {
    let days: Vec<Weekday> = note
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter_map(parse_weekday)
        .collect();

    if days.is_empty() {
        ConstraintRule::Unrecognized
    } else {
        ConstraintRule::DaysOfWeek(days)
    }
}

fn parse_days_of_month(note: &str) -> ConstraintRule {
    let parsed: Option<BTreeSet<u32>> = note
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<u32>().ok().filter(|n| (1..=31).contains(n)))
        .collect();

    match parsed {
        Some(days) if !days.is_empty() => ConstraintRule::DaysOfMonth(days),
        _ => ConstraintRule::Unrecognized,
    }
}

fn parse_nth_weekday(note: &str) -> ConstraintRule {
    let Some((position, weekday)) = note.split_once('_') else {
        return ConstraintRule::Unrecognized;
    };

    match (WeekPosition::parse(position.trim()), parse_weekday(weekday)) {
        (Some(position), Some(weekday)) => ConstraintRule::NthWeekday { position, weekday },
        _ => ConstraintRule::Unrecognized,
    }
}

/// Whether a quest should be surfaced on the calendar day of `now`
pub fn is_eligible_today(quest: &Quest, now: DateTime<Local>) -> bool {
    ConstraintRule::parse(quest.constraint.as_ref()).matches(now)
}

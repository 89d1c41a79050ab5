//! Mood types: events, traits, modifiers, tiers and snapshots

use chrono::{DateTime, Local};
use moodbbs_util::{EventId, TraitId};
use serde::{Deserialize, Serialize};

use crate::MoodBuff;

labeled_enum! {
    /// Whether an entry ships with moodbbs or was added by the user
    "origin"
    pub enum Origin {
        Stock => "stock",
        Custom => "custom",
    }
}

labeled_enum! {
    /// Discrete mood band derived from a score
    "mood tier"
    pub enum MoodTier {
        VeryHappy => "very_happy",
        Happy => "happy",
        Neutral => "neutral",
        Unhappy => "unhappy",
        VeryUnhappy => "very_unhappy",
    }
}

impl MoodTier {
    pub fn face(&self) -> &'static str {
        match self {
            MoodTier::VeryHappy => ":D",
            MoodTier::Happy => ":)",
            MoodTier::Neutral => ":|",
            MoodTier::Unhappy => ":(",
            MoodTier::VeryUnhappy => "D:",
        }
    }
}

/// Lower bounds of each tier, inclusive.
///
/// A score at or above `very_happy` is very happy, at or above `happy` is
/// happy, and so on. Anything below `unhappy` is very unhappy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodThresholds {
    pub very_happy: i32,
    pub happy: i32,
    pub neutral: i32,
    pub unhappy: i32,
}

impl MoodThresholds {
    pub const PRODUCTION: MoodThresholds = MoodThresholds {
        very_happy: 16,
        happy: 6,
        neutral: -5,
        unhappy: -15,
    };

    /// Bands older snapshot rows were classified with. New snapshots use
    /// the configured thresholds.
    pub const LEGACY_SNAPSHOT: MoodThresholds = MoodThresholds {
        very_happy: 20,
        happy: 10,
        neutral: 0,
        unhappy: -10,
    };

    /// Thresholds must be strictly descending to form disjoint bands
    pub fn is_descending(&self) -> bool {
        self.very_happy > self.happy && self.happy > self.neutral && self.neutral > self.unhappy
    }

    pub fn tier(&self, score: i32) -> MoodTier {
        if score >= self.very_happy {
            MoodTier::VeryHappy
        } else if score >= self.happy {
            MoodTier::Happy
        } else if score >= self.neutral {
            MoodTier::Neutral
        } else if score >= self.unhappy {
            MoodTier::Unhappy
        } else {
            MoodTier::VeryUnhappy
        }
    }
}

impl Default for MoodThresholds {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

/// Time-bounded mood modifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEvent {
    pub id: EventId,
    pub event_type: String,
    pub modifier: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Local>,
    /// `None` means the event lasts until deactivated
    pub expires_at: Option<DateTime<Local>>,
    pub is_active: bool,
}

/// Persistent mood modifier tied to the user's personality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTrait {
    pub id: TraitId,
    pub name: String,
    pub description: String,
    pub modifier: i32,
    pub is_active: bool,
    pub category: Origin,
}

/// Library definition of a kind of mood event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodModifier {
    pub event_type: String,
    pub name: String,
    pub default_value: i32,
    pub duration_hours: Option<u32>,
    pub category: Origin,
}

/// Computed mood at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodState {
    pub score: i32,
    pub tier: MoodTier,
    pub face: String,
    pub active_events: Vec<MoodEvent>,
    pub active_traits: Vec<PersonalityTrait>,
    pub calculated_at: DateTime<Local>,
}

/// Persisted mood history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodSnapshot {
    pub id: i64,
    pub score: i32,
    pub tier: MoodTier,
    pub face: String,
    pub contributors: Vec<MoodBuff>,
    pub created_at: DateTime<Local>,
}

impl MoodSnapshot {
    /// Capture a mood state. The id is assigned by the store on append.
    pub fn from_state(state: &MoodState) -> Self {
        Self {
            id: 0,
            score: state.score,
            tier: state.tier,
            face: state.face.clone(),
            contributors: state
                .active_events
                .iter()
                .map(|e| MoodBuff::new(e.event_type.clone(), e.modifier))
                .collect(),
            created_at: state.calculated_at,
        }
    }
}

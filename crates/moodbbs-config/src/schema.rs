//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Quest and mood engine settings
    #[serde(default)]
    pub engine: RawEngineConfig,

    /// Where the database and logs live
    #[serde(default)]
    pub storage: RawStorageConfig,

    /// Mood tier thresholds
    #[serde(default)]
    pub mood: RawMoodConfig,

    /// Traits seeded into the registry on first start
    #[serde(default)]
    pub traits: Vec<RawTrait>,

    /// Custom mood modifiers added to the library
    #[serde(default)]
    pub modifiers: Vec<RawModifier>,

    /// Quest templates available to `create_from_template`
    #[serde(default)]
    pub templates: Vec<RawTemplate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEngineConfig {
    /// Maximum number of simultaneously active quests (default: 3)
    pub max_active_quests: Option<u32>,

    /// Lifetime of mood events emitted by a completion (default: 24)
    pub completion_buff_hours: Option<u32>,

    /// Snooze length when none is given (default: 7)
    pub default_snooze_days: Option<u32>,

    /// Completion history window (default: 7)
    pub history_days: Option<u32>,

    /// Maximum quests returned by an active listing (default: 10)
    pub active_list_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStorageConfig {
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

/// Lower bound of each tier; unset values keep the built-in defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMoodConfig {
    pub very_happy: Option<i32>,
    pub happy: Option<i32>,
    pub neutral: Option<i32>,
    pub unhappy: Option<i32>,
}

/// Trait seed. Without a `modifier` the name must refer to a stock trait.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTrait {
    pub name: String,
    pub description: Option<String>,
    pub modifier: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawModifier {
    pub event_type: String,
    /// Display name (default: the event type)
    pub name: Option<String>,
    pub value: i32,
    pub duration_hours: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// "social", "constitutional", "creative" or "experiential"
    pub category: String,
    /// "easy", "medium", "hard" or "extreme" (default: "easy")
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    pub base_xp: u32,
    pub renewal: Option<RawRenewal>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_difficulty() -> String {
    "easy".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRenewal {
    /// "daily", "weekly", "monthly", "seasonal" or "never"
    #[serde(rename = "type")]
    pub renewal_type: String,
    #[serde(default)]
    pub cooldown_days: u32,
    pub max_active_instances: Option<u32>,
    /// Months 1-12 during which the quest may renew
    pub active_months: Option<Vec<u32>>,
}

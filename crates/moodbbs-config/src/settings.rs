//! Validated settings structures

use crate::schema::{RawConfig, RawEngineConfig, RawModifier, RawMoodConfig, RawStorageConfig, RawTrait};
use crate::validation::parse_template;
use moodbbs_api::{MoodModifier, MoodThresholds, Origin, QuestTemplate};
use moodbbs_util::{DATABASE_FILENAME, default_data_dir, default_log_dir};
use std::path::PathBuf;

/// Validated settings ready for use by the engine
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub storage: StorageSettings,
    pub thresholds: MoodThresholds,
    pub traits: Vec<TraitSeed>,
    pub modifiers: Vec<MoodModifier>,
    pub templates: Vec<QuestTemplate>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            engine: EngineSettings::from_raw(&raw.engine),
            storage: StorageSettings::from_raw(raw.storage),
            thresholds: thresholds_from_raw(&raw.mood),
            traits: raw.traits.into_iter().map(TraitSeed::from_raw).collect(),
            modifiers: raw.modifiers.into_iter().map(modifier_from_raw).collect(),
            templates: raw
                .templates
                .iter()
                .filter_map(|t| parse_template(t).ok())
                .collect(),
        }
    }

    pub fn get_template(&self, id: &str) -> Option<&QuestTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub max_active_quests: usize,
    pub completion_buff_hours: u32,
    pub default_snooze_days: u32,
    pub history_days: u32,
    pub active_list_limit: usize,
}

impl EngineSettings {
    fn from_raw(raw: &RawEngineConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_active_quests: raw
                .max_active_quests
                .map_or(defaults.max_active_quests, |v| v as usize),
            completion_buff_hours: raw
                .completion_buff_hours
                .unwrap_or(defaults.completion_buff_hours),
            default_snooze_days: raw
                .default_snooze_days
                .unwrap_or(defaults.default_snooze_days),
            history_days: raw.history_days.unwrap_or(defaults.history_days),
            active_list_limit: raw
                .active_list_limit
                .map_or(defaults.active_list_limit, |v| v as usize),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_active_quests: 3,
            completion_buff_hours: 24,
            default_snooze_days: 7,
            history_days: 7,
            active_list_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl StorageSettings {
    fn from_raw(raw: RawStorageConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            log_dir: raw.log_dir.unwrap_or_else(default_log_dir),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILENAME)
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_dir: default_log_dir(),
        }
    }
}

/// A trait to register on first start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitSeed {
    pub name: String,
    pub description: Option<String>,
    /// `None` refers to the stock trait of the same name
    pub modifier: Option<i32>,
}

impl TraitSeed {
    fn from_raw(raw: RawTrait) -> Self {
        Self {
            name: raw.name,
            description: raw.description,
            modifier: raw.modifier,
        }
    }
}

fn modifier_from_raw(raw: RawModifier) -> MoodModifier {
    MoodModifier {
        name: raw.name.unwrap_or_else(|| raw.event_type.clone()),
        event_type: raw.event_type,
        default_value: raw.value,
        duration_hours: raw.duration_hours,
        category: Origin::Custom,
    }
}

/// Resolve configured thresholds, filling gaps from the defaults
pub fn thresholds_from_raw(raw: &RawMoodConfig) -> MoodThresholds {
    let defaults = MoodThresholds::default();
    MoodThresholds {
        very_happy: raw.very_happy.unwrap_or(defaults.very_happy),
        happy: raw.happy.unwrap_or(defaults.happy),
        neutral: raw.neutral.unwrap_or(defaults.neutral),
        unhappy: raw.unhappy.unwrap_or(defaults.unhappy),
    }
}

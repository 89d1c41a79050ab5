//! Configuration validation

use crate::schema::{RawConfig, RawEngineConfig, RawRenewal, RawTemplate};
use crate::settings::thresholds_from_raw;
use moodbbs_api::{Difficulty, QuestCategory, QuestTemplate, RenewalPolicy, RenewalType};
use moodbbs_util::{MAX_SPAN_DAYS, MAX_SPAN_HOURS};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("engine.{key}: {message}")]
    InvalidSetting { key: &'static str, message: String },

    #[error(
        "mood thresholds must be strictly descending \
         (very_happy={very_happy}, happy={happy}, neutral={neutral}, unhappy={unhappy})"
    )]
    ThresholdsNotDescending {
        very_happy: i32,
        happy: i32,
        neutral: i32,
        unhappy: i32,
    },

    #[error("Duplicate trait name: {0}")]
    DuplicateTrait(String),

    #[error("Duplicate modifier event type: {0}")]
    DuplicateModifier(String),

    #[error("Duplicate template ID: {0}")]
    DuplicateTemplateId(String),

    #[error("Trait '{name}': {message}")]
    TraitError { name: String, message: String },

    #[error("Modifier '{event_type}': {message}")]
    ModifierError { event_type: String, message: String },

    #[error("Template '{template_id}': {message}")]
    TemplateError { template_id: String, message: String },
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = validate_engine(&config.engine);

    let thresholds = thresholds_from_raw(&config.mood);
    if !thresholds.is_descending() {
        errors.push(ValidationError::ThresholdsNotDescending {
            very_happy: thresholds.very_happy,
            happy: thresholds.happy,
            neutral: thresholds.neutral,
            unhappy: thresholds.unhappy,
        });
    }

    let mut seen_traits = HashSet::new();
    for t in &config.traits {
        if t.name.trim().is_empty() {
            errors.push(ValidationError::TraitError {
                name: t.name.clone(),
                message: "name cannot be empty".into(),
            });
        } else if !seen_traits.insert(t.name.as_str()) {
            errors.push(ValidationError::DuplicateTrait(t.name.clone()));
        }
    }

    let mut seen_modifiers = HashSet::new();
    for m in &config.modifiers {
        if m.event_type.trim().is_empty() {
            errors.push(ValidationError::ModifierError {
                event_type: m.event_type.clone(),
                message: "event_type cannot be empty".into(),
            });
        } else if !seen_modifiers.insert(m.event_type.as_str()) {
            errors.push(ValidationError::DuplicateModifier(m.event_type.clone()));
        }
        match m.duration_hours {
            Some(0) => errors.push(ValidationError::ModifierError {
                event_type: m.event_type.clone(),
                message: "duration_hours must be at least 1 (omit it for a permanent event)".into(),
            }),
            Some(hours) if hours > MAX_SPAN_HOURS => errors.push(ValidationError::ModifierError {
                event_type: m.event_type.clone(),
                message: format!("duration_hours must be at most {}", MAX_SPAN_HOURS),
            }),
            _ => {}
        }
    }

    let mut seen_templates = HashSet::new();
    for template in &config.templates {
        if !seen_templates.insert(template.id.as_str()) {
            errors.push(ValidationError::DuplicateTemplateId(template.id.clone()));
        }
        if let Err(template_errors) = parse_template(template) {
            errors.extend(template_errors);
        }
    }

    errors
}

fn validate_engine(engine: &RawEngineConfig) -> Vec<ValidationError> {
    let positive = [
        ("max_active_quests", engine.max_active_quests),
        ("completion_buff_hours", engine.completion_buff_hours),
        ("default_snooze_days", engine.default_snooze_days),
        ("history_days", engine.history_days),
        ("active_list_limit", engine.active_list_limit),
    ];

    let mut errors: Vec<ValidationError> = positive
        .into_iter()
        .filter(|(_, value)| *value == Some(0))
        .map(|(key, _)| ValidationError::InvalidSetting {
            key,
            message: "must be at least 1".into(),
        })
        .collect();

    let bounded = [
        ("completion_buff_hours", engine.completion_buff_hours, MAX_SPAN_HOURS),
        ("default_snooze_days", engine.default_snooze_days, MAX_SPAN_DAYS),
        ("history_days", engine.history_days, MAX_SPAN_DAYS),
    ];
    errors.extend(
        bounded
            .into_iter()
            .filter(|(_, value, max)| value.is_some_and(|v| v > *max))
            .map(|(key, _, max)| ValidationError::InvalidSetting {
                key,
                message: format!("must be at most {}", max),
            }),
    );

    errors
}

/// Convert a raw template into a quest template, reporting every bad field
pub fn parse_template(raw: &RawTemplate) -> Result<QuestTemplate, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let template_error = |message: String| ValidationError::TemplateError {
        template_id: raw.id.clone(),
        message,
    };

    if raw.id.trim().is_empty() {
        errors.push(template_error("id cannot be empty".into()));
    }
    if raw.title.trim().is_empty() {
        errors.push(template_error("title cannot be empty".into()));
    }

    let category = raw
        .category
        .parse::<QuestCategory>()
        .map_err(|e| errors.push(template_error(e.to_string())))
        .ok();
    let difficulty = raw
        .difficulty
        .parse::<Difficulty>()
        .map_err(|e| errors.push(template_error(e.to_string())))
        .ok();

    let renewal_policy = match &raw.renewal {
        Some(renewal) => match parse_renewal(renewal) {
            Ok(policy) => Some(policy),
            Err(message) => {
                errors.push(template_error(message));
                None
            }
        },
        None => None,
    };

    match (category, difficulty) {
        (Some(category), Some(difficulty)) if errors.is_empty() => Ok(QuestTemplate {
            id: raw.id.clone(),
            title: raw.title.clone(),
            description: raw.description.clone(),
            category,
            difficulty,
            base_xp: raw.base_xp,
            renewal_policy,
            tags: raw.tags.clone(),
        }),
        _ => Err(errors),
    }
}

/// Convert a raw renewal block into a policy
pub fn parse_renewal(raw: &RawRenewal) -> Result<RenewalPolicy, String> {
    let renewal_type = raw
        .renewal_type
        .parse::<RenewalType>()
        .map_err(|e| e.to_string())?;

    if raw.cooldown_days > MAX_SPAN_DAYS {
        return Err(format!("cooldown_days must be at most {}", MAX_SPAN_DAYS));
    }

    let mut policy = RenewalPolicy::new(renewal_type, raw.cooldown_days);

    if let Some(max) = raw.max_active_instances {
        if max == 0 {
            return Err("max_active_instances must be at least 1".into());
        }
        policy.max_active_instances = max;
    }

    if let Some(months) = &raw.active_months {
        if months.is_empty() {
            return Err("active_months cannot be empty (omit it for all year)".into());
        }
        if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(format!("active month {} is not in 1-12", bad));
        }
        policy = policy.with_active_months(months.iter().copied());
    }

    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawModifier, RawMoodConfig, RawTrait};

    fn template(id: &str, category: &str) -> RawTemplate {
        RawTemplate {
            id: id.into(),
            title: "Call a friend".into(),
            description: String::new(),
            category: category.into(),
            difficulty: "medium".into(),
            base_xp: 20,
            renewal: None,
            tags: vec![],
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = RawConfig {
            config_version: 1,
            ..Default::default()
        };
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = RawConfig::default();
        config.engine.max_active_quests = Some(0);

        let errors = validate_config(&config);
        assert_eq!(
            errors,
            vec![ValidationError::InvalidSetting {
                key: "max_active_quests",
                message: "must be at least 1".into(),
            }]
        );
    }

    #[test]
    fn oversized_spans_are_rejected() {
        let mut config = RawConfig::default();
        config.engine.default_snooze_days = Some(u32::MAX);
        config.engine.completion_buff_hours = Some(MAX_SPAN_HOURS);
        config.modifiers.push(RawModifier {
            event_type: "eternal".into(),
            name: None,
            value: 1,
            duration_hours: Some(MAX_SPAN_HOURS + 1),
        });

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::InvalidSetting {
            key: "default_snooze_days",
            message: format!("must be at most {}", MAX_SPAN_DAYS),
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ModifierError { event_type, .. } if event_type == "eternal")));

        let raw = RawRenewal {
            renewal_type: "seasonal".into(),
            cooldown_days: MAX_SPAN_DAYS + 1,
            max_active_instances: None,
            active_months: None,
        };
        assert!(parse_renewal(&raw).unwrap_err().contains("cooldown_days"));
    }

    #[test]
    fn non_descending_thresholds_are_rejected() {
        let config = RawConfig {
            mood: RawMoodConfig {
                happy: Some(20),
                ..Default::default()
            },
            ..Default::default()
        };

        let errors = validate_config(&config);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::ThresholdsNotDescending { happy: 20, .. }]
        ));
    }

    #[test]
    fn collects_all_errors() {
        let config = RawConfig {
            traits: vec![
                RawTrait {
                    name: "optimist".into(),
                    description: None,
                    modifier: None,
                },
                RawTrait {
                    name: "optimist".into(),
                    description: None,
                    modifier: Some(1),
                },
            ],
            modifiers: vec![RawModifier {
                event_type: "nap".into(),
                name: None,
                value: 2,
                duration_hours: Some(0),
            }],
            templates: vec![template("call", "social"), template("call", "sporty")],
            ..Default::default()
        };

        let errors = validate_config(&config);
        assert!(errors.contains(&ValidationError::DuplicateTrait("optimist".into())));
        assert!(errors.contains(&ValidationError::DuplicateTemplateId("call".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ModifierError { event_type, .. } if event_type == "nap")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::TemplateError { message, .. } if message.contains("sporty"))));
    }

    #[test]
    fn renewal_months_must_be_calendar_months() {
        let raw = RawRenewal {
            renewal_type: "seasonal".into(),
            cooldown_days: 30,
            max_active_instances: None,
            active_months: Some(vec![11, 13]),
        };
        assert!(parse_renewal(&raw).unwrap_err().contains("13"));

        let raw = RawRenewal {
            active_months: Some(vec![12, 1, 2]),
            ..raw
        };
        let policy = parse_renewal(&raw).unwrap();
        assert!(policy.allows_month(1));
        assert!(!policy.allows_month(6));
    }

    #[test]
    fn unknown_renewal_type_is_rejected() {
        let raw = RawRenewal {
            renewal_type: "hourly".into(),
            cooldown_days: 0,
            max_active_instances: None,
            active_months: None,
        };
        assert!(parse_renewal(&raw).is_err());
    }
}

//! Catalogue of mood modifier definitions

use moodbbs_api::{MoodModifier, Origin};

use crate::MoodError;

const STOCK_MODIFIERS: &[(&str, &str, i32, u32)] = &[
    ("ate_without_table", "Ate without a table", -3, 24),
    ("fine_meal", "Ate a fine meal", 5, 24),
    ("social_interaction", "Had a good conversation", 8, 24),
    ("completed_walk", "Took a walk", 6, 24),
    ("too_long_indoors", "Cooped up indoors", -5, 24),
    ("saw_beauty", "Saw something beautiful", 4, 12),
];

/// Stock modifiers plus user-defined ones
#[derive(Debug, Clone)]
pub struct ModifierLibrary {
    stock: Vec<MoodModifier>,
    custom: Vec<MoodModifier>,
}

impl Default for ModifierLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ModifierLibrary {
    pub fn new() -> Self {
        let stock = STOCK_MODIFIERS
            .iter()
            .map(|&(event_type, name, value, hours)| MoodModifier {
                event_type: event_type.to_string(),
                name: name.to_string(),
                default_value: value,
                duration_hours: Some(hours),
                category: Origin::Stock,
            })
            .collect();

        Self {
            stock,
            custom: Vec::new(),
        }
    }

    pub fn stock(&self) -> &[MoodModifier] {
        &self.stock
    }

    pub fn custom(&self) -> &[MoodModifier] {
        &self.custom
    }

    /// Stock entries first, then custom
    pub fn all(&self) -> impl Iterator<Item = &MoodModifier> {
        self.stock.iter().chain(self.custom.iter())
    }

    /// Look up by event type. Stock entries shadow custom ones.
    pub fn get(&self, event_type: &str) -> Option<&MoodModifier> {
        self.all().find(|m| m.event_type == event_type)
    }

    pub fn add_custom(
        &mut self,
        event_type: impl Into<String>,
        name: impl Into<String>,
        default_value: i32,
        duration_hours: Option<u32>,
    ) -> Result<&MoodModifier, MoodError> {
        let event_type = event_type.into();
        if self.get(&event_type).is_some() {
            return Err(MoodError::DuplicateModifier(event_type));
        }

        self.custom.push(MoodModifier {
            event_type,
            name: name.into(),
            default_value,
            duration_hours,
            category: Origin::Custom,
        });

        // Just pushed
        Ok(&self.custom[self.custom.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_catalogue() {
        let library = ModifierLibrary::new();
        assert_eq!(library.stock().len(), 6);

        let beauty = library.get("saw_beauty").unwrap();
        assert_eq!(beauty.default_value, 4);
        assert_eq!(beauty.duration_hours, Some(12));
        assert_eq!(beauty.category, Origin::Stock);

        let table = library.get("ate_without_table").unwrap();
        assert_eq!(table.default_value, -3);
        assert!(library.get("nope").is_none());
    }

    #[test]
    fn custom_modifiers() {
        let mut library = ModifierLibrary::new();
        let added = library.add_custom("cat_purred", "Cat purred", 3, None).unwrap();
        assert_eq!(added.category, Origin::Custom);

        assert_eq!(library.get("cat_purred").unwrap().default_value, 3);
        assert_eq!(library.all().count(), 7);
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut library = ModifierLibrary::new();
        assert_eq!(
            library.add_custom("fine_meal", "Another meal", 1, Some(1)).unwrap_err(),
            MoodError::DuplicateModifier("fine_meal".into())
        );

        library.add_custom("nap", "Nap", 2, Some(4)).unwrap();
        assert!(library.add_custom("nap", "Nap again", 2, Some(4)).is_err());
    }
}

//! Personality traits: persistent mood modifiers without expiry

use moodbbs_api::{Origin, PersonalityTrait};
use moodbbs_util::{TraitId, next_id_after};
use tracing::info;

use crate::MoodError;

/// Built-in trait definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockTrait {
    pub name: &'static str,
    pub description: &'static str,
    pub modifier: i32,
}

pub const STOCK_TRAITS: &[StockTrait] = &[
    StockTrait {
        name: "optimist",
        description: "Always sees the bright side",
        modifier: 5,
    },
    StockTrait {
        name: "pessimist",
        description: "Expects the worst",
        modifier: -5,
    },
    StockTrait {
        name: "sanguine",
        description: "Naturally cheerful",
        modifier: 10,
    },
    StockTrait {
        name: "depressive",
        description: "Struggles with low mood",
        modifier: -10,
    },
    StockTrait {
        name: "ascetic",
        description: "Content with little",
        modifier: 3,
    },
];

pub fn stock_trait(name: &str) -> Option<&'static StockTrait> {
    STOCK_TRAITS.iter().find(|t| t.name == name)
}

/// The user's traits, unique by name
#[derive(Debug, Clone)]
pub struct TraitRegistry {
    traits: Vec<PersonalityTrait>,
    next_id: i64,
}

impl Default for TraitRegistry {
    fn default() -> Self {
        Self::restore(Vec::new())
    }
}

impl TraitRegistry {
    pub fn restore(mut traits: Vec<PersonalityTrait>) -> Self {
        traits.sort_by_key(|t| t.id);
        let next_id = next_id_after(traits.iter().map(|t| t.id.get()));
        Self { traits, next_id }
    }

    /// Add a trait, or overwrite and reactivate an existing one of the same name
    pub fn add(&mut self, name: &str, description: &str, modifier: i32) -> PersonalityTrait {
        self.upsert(name, description, modifier, Origin::Custom)
    }

    pub fn add_stock(&mut self, name: &str) -> Result<PersonalityTrait, MoodError> {
        let stock = stock_trait(name).ok_or_else(|| MoodError::UnknownStockTrait(name.to_string()))?;
        Ok(self.upsert(stock.name, stock.description, stock.modifier, Origin::Stock))
    }

    fn upsert(&mut self, name: &str, description: &str, modifier: i32, category: Origin) -> PersonalityTrait {
        if let Some(existing) = self.traits.iter_mut().find(|t| t.name == name) {
            existing.description = description.to_string();
            existing.modifier = modifier;
            existing.category = category;
            existing.is_active = true;
            info!(trait_name = name, modifier, "Trait reactivated");
            return existing.clone();
        }

        let created = PersonalityTrait {
            id: TraitId::new(self.next_id),
            name: name.to_string(),
            description: description.to_string(),
            modifier,
            is_active: true,
            category,
        };
        self.next_id += 1;
        self.traits.push(created.clone());

        info!(trait_name = name, modifier, "Trait added");
        created
    }

    /// Deactivate a trait by name. Returns false if no such trait exists.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.traits.iter_mut().find(|t| t.name == name) {
            Some(t) => {
                t.is_active = false;
                info!(trait_name = name, "Trait deactivated");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&PersonalityTrait> {
        self.traits.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn active(&self) -> Vec<PersonalityTrait> {
        self.traits.iter().filter(|t| t.is_active).cloned().collect()
    }

    pub fn all(&self) -> &[PersonalityTrait] {
        &self.traits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_catalogue_values() {
        let values: Vec<_> = STOCK_TRAITS.iter().map(|t| (t.name, t.modifier)).collect();
        assert_eq!(
            values,
            vec![
                ("optimist", 5),
                ("pessimist", -5),
                ("sanguine", 10),
                ("depressive", -10),
                ("ascetic", 3)
            ]
        );
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut registry = TraitRegistry::default();
        let a = registry.add("night_owl", "Happier after dark", 2);
        let b = registry.add_stock("optimist").unwrap();

        assert_eq!(a.id, TraitId::new(1));
        assert_eq!(b.id, TraitId::new(2));
        assert_eq!(b.category, Origin::Stock);
        assert_eq!(registry.active().len(), 2);
    }

    #[test]
    fn unknown_stock_trait() {
        let mut registry = TraitRegistry::default();
        assert_eq!(
            registry.add_stock("grumpy").unwrap_err(),
            MoodError::UnknownStockTrait("grumpy".into())
        );
    }

    #[test]
    fn remove_deactivates_and_readd_reactivates() {
        let mut registry = TraitRegistry::default();
        let original = registry.add("gardener", "Loves plants", 2);

        assert!(registry.remove("gardener"));
        assert!(registry.active().is_empty());
        assert_eq!(registry.all().len(), 1);
        assert!(!registry.remove("astronaut"));

        let readded = registry.add("gardener", "Really loves plants", 4);
        assert_eq!(readded.id, original.id);
        assert!(readded.is_active);
        assert_eq!(readded.modifier, 4);
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn restore_continues_ids() {
        let mut registry = TraitRegistry::default();
        registry.add("a", "", 1);
        registry.add("b", "", 1);

        let mut restored = TraitRegistry::restore(registry.all().to_vec());
        assert_eq!(restored.add("c", "", 1).id, TraitId::new(3));
        assert!(restored.contains("a"));
    }
}

//! Strongly-typed identifiers for moodbbs
//!
//! All entity ids are integers assigned by the in-memory owner of the entity
//! (monotonic, starting at 1) and mirrored verbatim by the store.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

integer_id!(
    /// Identifier of a quest instance
    QuestId
);

integer_id!(
    /// Identifier of an immutable quest completion record
    CompletionId
);

integer_id!(
    /// Identifier of a quest snooze record
    SnoozeId
);

integer_id!(
    /// Identifier of a time-bounded mood event
    EventId
);

integer_id!(
    /// Identifier of a personality trait
    TraitId
);

/// Next free id after the given existing ids (max + 1, or 1 when empty)
pub fn next_id_after(ids: impl IntoIterator<Item = i64>) -> i64 {
    ids.into_iter().max().map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quest_id_ordering() {
        let a = QuestId::new(1);
        let b = QuestId::new(2);
        assert!(a < b);
        assert_eq!(a, QuestId::from(1));
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&EventId::new(42)).unwrap();
        assert_eq!(json, "42");

        let parsed: TraitId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.get(), 7);
    }

    #[test]
    fn next_id_after_existing() {
        assert_eq!(next_id_after(Vec::<i64>::new()), 1);
        assert_eq!(next_id_after([3, 9, 4]), 10);
    }
}

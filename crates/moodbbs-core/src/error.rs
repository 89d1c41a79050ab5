//! Core error types

use moodbbs_api::QuestStatus;
use moodbbs_store::StoreError;
use moodbbs_util::{EventId, QuestId};
use thiserror::Error;

/// Quest lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("Quest {0} not found")]
    NotFound(QuestId),

    #[error("Maximum active quests ({max}) reached")]
    CapacityExceeded { max: usize },

    #[error("Quest {0} is already completed")]
    AlreadyCompleted(QuestId),

    #[error("Cannot {action} quest {id} while it is {status}")]
    InvalidTransition {
        id: QuestId,
        status: QuestStatus,
        action: &'static str,
    },

    #[error("Unknown quest template '{0}'")]
    UnknownTemplate(String),

    #[error("A span of {days} days is out of range")]
    DurationOutOfRange { days: u32 },
}

/// Mood ledger, modifier library and trait registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoodError {
    #[error("Mood event {0} not found")]
    EventNotFound(EventId),

    #[error("Mood modifier '{0}' already exists")]
    DuplicateModifier(String),

    #[error("Unknown mood modifier '{0}'")]
    UnknownModifier(String),

    #[error("Unknown stock trait '{0}'")]
    UnknownStockTrait(String),

    #[error("A span of {hours} hours is out of range")]
    DurationOutOfRange { hours: u32 },
}

/// Errors surfaced by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Quest(#[from] QuestError),

    #[error(transparent)]
    Mood(#[from] MoodError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

//! Error types for study-core.

use crate::types::FlashcardId;
use thiserror::Error;

/// Result type alias using StudyError.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Errors surfaced by the study session engine.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("no user is logged in")]
    AuthRequired,

    #[error("scheduler has not been initialized; start a session first")]
    SchedulerNotInitialized,

    #[error("no card is currently being studied")]
    NoActiveCard,

    #[error("review targets card {actual} but the current card is {expected}")]
    CardIdMismatch {
        expected: FlashcardId,
        actual: FlashcardId,
    },

    #[error("invalid rating {0}, expected 1-4")]
    InvalidRating(u8),

    #[error("the active session belongs to another user")]
    SessionUserMismatch,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Errors reported by storage collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Errors reported by a scheduler adapter.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("malformed scheduler state: {0}")]
    Deserialize(String),

    #[error("failed to serialize scheduler data: {0}")]
    Serialize(String),

    #[error("invalid scheduler configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("next review date is out of range")]
    DueOutOfRange,
}

/// Invalid scheduler configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("desired retention must be between 0 and 1, got {0}")]
    DesiredRetention(f64),

    #[error("maximum interval must be between 1 and {max} days, got {actual}")]
    MaximumInterval { max: u32, actual: u32 },

    #[error("expected {expected} scheduler parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    #[error("learning steps must be positive and no longer than the maximum interval")]
    Steps,
}

/// A string that names no known card source.
#[derive(Debug, Error, PartialEq)]
#[error("unknown card source: {0}")]
pub struct UnknownCardSource(pub String);

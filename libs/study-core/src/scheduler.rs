//! Scheduler adapter interface and per-card state repair.

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::types::Rating;
use chrono::{DateTime, Utc};
use std::fmt;

/// Result of reviewing a card.
#[derive(Debug, Clone)]
pub struct ReviewOutcome<S> {
    pub state: S,
    /// Adapter-specific review log payload, stored verbatim.
    pub log_data: String,
}

/// A spaced repetition algorithm, seen by the engine as a black box.
///
/// Building an adapter may be expensive; the engine builds one lazily and
/// keeps it across sessions.
pub trait SchedulerAdapter: Sized {
    /// Opaque per-card state.
    type State: Clone + fmt::Debug;

    fn from_config(config: &SchedulerConfig) -> Result<Self, SchedulerError>;

    /// State for a card that has never been reviewed.
    fn new_card_state(&self, now: DateTime<Utc>) -> Self::State;

    fn deserialize(&self, blob: &str) -> Result<Self::State, SchedulerError>;

    fn serialize(&self, state: &Self::State) -> Result<String, SchedulerError>;

    /// When the card is next due.
    fn due_at(&self, state: &Self::State) -> DateTime<Utc>;

    fn review(
        &self,
        state: &Self::State,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome<Self::State>, SchedulerError>;

    /// Active parameter vector, snapshotted into every review log entry.
    fn parameters(&self) -> &[f64];
}

/// How a card's state was obtained while loading a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRepair {
    /// The stored blob deserialized cleanly.
    Loaded,
    /// No blob was stored; a new-card state was created.
    Initialized,
    /// The stored blob was corrupt and was replaced by a new-card state.
    Reset { reason: String },
}

impl StateRepair {
    /// Whether the state must be written back to the store.
    pub fn was_repaired(&self) -> bool {
        !matches!(self, Self::Loaded)
    }
}

/// Resolve a card's stored blob into a usable state.
///
/// Never fails: a missing or malformed blob yields a fresh new-card state.
pub fn repair_state<S: SchedulerAdapter>(
    scheduler: &S,
    blob: Option<&str>,
    now: DateTime<Utc>,
) -> (S::State, StateRepair) {
    match blob {
        None => (scheduler.new_card_state(now), StateRepair::Initialized),
        Some(blob) => match scheduler.deserialize(blob) {
            Ok(state) => (state, StateRepair::Loaded),
            Err(err) => (
                scheduler.new_card_state(now),
                StateRepair::Reset {
                    reason: err.to_string(),
                },
            ),
        },
    }
}

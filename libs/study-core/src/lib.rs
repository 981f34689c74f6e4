//! Spaced-repetition study session engine shared by the desktop application.
//!
//! Provides:
//! - The study session engine (start, review, advance, progress, end)
//! - Collaborator traits for card storage, review logs and the logged-in user
//! - A pluggable scheduler interface
//! - Due card selection and write-through state repair
//! - Shared types (Flashcard, Rating, ReviewLogEntry, etc.)

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod selector;
pub mod session;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{SchedulerConfig, MAX_INTERVAL_DAYS};
pub use error::{ConfigError, Result, SchedulerError, StoreError, StudyError, UnknownCardSource};
pub use scheduler::{repair_state, ReviewOutcome, SchedulerAdapter, StateRepair};
pub use selector::select_due_cards;
pub use session::{QueuedCard, StudySessionEngine};
pub use store::{FlashcardStore, ReviewLogStore, SessionContext};
pub use types::{
    CardSource, DeckId, Flashcard, FlashcardId, Rating, ReviewLogEntry, SessionProgress, UserId,
};

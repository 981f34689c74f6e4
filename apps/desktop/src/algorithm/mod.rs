//! Scheduler adapters plugged into the study engine.

pub mod fsrs;

pub use fsrs::{CardStatus, FsrsCardState, FsrsReviewLog, FsrsScheduler, DEFAULT_WEIGHTS};

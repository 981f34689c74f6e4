//! Core types for the study session engine.

use crate::error::UnknownCardSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type FlashcardId = i64;
pub type DeckId = i64;
pub type UserId = i64;

/// Where a card's text came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardSource {
    #[default]
    Manual,
    AiGenerated,
    AiEdited,
}

impl CardSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AiGenerated => "ai-generated",
            Self::AiEdited => "ai-edited",
        }
    }
}

impl FromStr for CardSource {
    type Err = UnknownCardSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "ai-generated" => Ok(Self::AiGenerated),
            "ai-edited" => Ok(Self::AiEdited),
            other => Err(UnknownCardSource(other.to_string())),
        }
    }
}

/// Rating for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }
}

/// A stored flashcard.
///
/// `scheduler_state` is the adapter's serialized state blob and is never
/// interpreted outside the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: FlashcardId,
    pub deck_id: DeckId,
    pub front_text: String,
    pub back_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler_state: Option<String>,
    pub source: CardSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One completed review, as appended to the review log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub user_id: UserId,
    pub flashcard_id: FlashcardId,
    pub rating: Rating,
    pub reviewed_at: DateTime<Utc>,
    /// Adapter-produced log payload.
    pub log_data: String,
    /// Scheduler parameters active when the review happened.
    pub scheduler_params: Vec<f64>,
}

/// Position within a session, 1-indexed for "card k of N" display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionProgress {
    pub current: usize,
    pub total: usize,
}

impl SessionProgress {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }
}

impl From<SessionProgress> for (usize, usize) {
    fn from(progress: SessionProgress) -> Self {
        (progress.current, progress.total)
    }
}

impl fmt::Display for SessionProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.current, self.total)
    }
}

//! Collaborator interfaces the engine drives.
//!
//! Methods take `&self`; implementations needing mutation use interior
//! mutability or an underlying connection that allows shared access.

use crate::error::StoreError;
use crate::types::{DeckId, Flashcard, ReviewLogEntry, UserId};

type Result<T> = std::result::Result<T, StoreError>;

/// Card storage.
pub trait FlashcardStore {
    /// All cards of a deck, in stable load order (oldest first).
    fn list_by_deck(&self, deck_id: DeckId) -> Result<Vec<Flashcard>>;

    /// Persist a card, including its scheduler state.
    fn update(&self, flashcard: &Flashcard) -> Result<()>;
}

/// Append-only review history.
pub trait ReviewLogStore {
    fn append(&self, entry: &ReviewLogEntry) -> Result<()>;
}

/// Who is logged in.
pub trait SessionContext {
    fn current_user_id(&self) -> Option<UserId>;
}

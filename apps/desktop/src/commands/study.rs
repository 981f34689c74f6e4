//! Study session commands.

use crate::algorithm::{CardStatus, FsrsCardState};
use crate::state::AppState;
use study_core::{CardSource, DeckId, FlashcardId, QueuedCard, SessionProgress};

use super::deck::{owned_deck, CommandError};

#[derive(Debug, serde::Deserialize)]
pub struct ReviewRequest {
    pub card_id: FlashcardId,
    pub rating: u8,
}

/// Card as shown to the user.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CardView {
    pub id: FlashcardId,
    pub deck_id: DeckId,
    pub front_text: String,
    pub back_text: String,
    pub source: CardSource,
    pub status: CardStatus,
    pub due: String,
    pub reviews_count: u32,
    pub lapses: u32,
}

impl From<&QueuedCard<FsrsCardState>> for CardView {
    fn from(card: &QueuedCard<FsrsCardState>) -> Self {
        Self {
            id: card.flashcard.id,
            deck_id: card.flashcard.deck_id,
            front_text: card.flashcard.front_text.clone(),
            back_text: card.flashcard.back_text.clone(),
            source: card.flashcard.source,
            status: card.state.status,
            due: card.state.due.to_rfc3339(),
            reviews_count: card.state.reviews_count,
            lapses: card.state.lapses,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ReviewResponse {
    pub card: CardView,
    pub next_due: String,
    pub progress: SessionProgress,
}

/// Start studying one of the user's decks. `None` means nothing is due.
pub fn start_study(state: &mut AppState, deck_id: DeckId) -> Result<Option<CardView>, CommandError> {
    owned_deck(state, deck_id)?;
    let first = state.engine.start_session(deck_id)?;
    Ok(first.map(CardView::from))
}

pub fn current_card(state: &AppState) -> Option<CardView> {
    state.engine.current_card().map(CardView::from)
}

/// Rate the current card. The card stays current until [`next_card`].
pub fn submit_review(
    state: &mut AppState,
    request: ReviewRequest,
) -> Result<ReviewResponse, CommandError> {
    let card = CardView::from(state.engine.record_review(request.card_id, request.rating)?);
    Ok(ReviewResponse {
        next_due: card.due.clone(),
        card,
        progress: state.engine.session_progress(),
    })
}

pub fn next_card(state: &mut AppState) -> Option<CardView> {
    state.engine.proceed_to_next_card().map(CardView::from)
}

pub fn study_progress(state: &AppState) -> SessionProgress {
    state.engine.session_progress()
}

pub fn end_study(state: &mut AppState) {
    state.engine.end_session();
}

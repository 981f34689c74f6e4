//! Account and deck commands.

use crate::db::{Deck, NewFlashcard};
use crate::state::AppState;
use study_core::{CardSource, Flashcard, FlashcardId, ReviewLogEntry, SessionContext, StudyError, UserId};

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<crate::db::DbError> for CommandError {
    fn from(e: crate::db::DbError) -> Self {
        Self { message: e.to_string() }
    }
}

impl From<StudyError> for CommandError {
    fn from(e: StudyError) -> Self {
        Self { message: e.to_string() }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct AddCardRequest {
    pub deck_id: i64,
    pub front_text: String,
    pub back_text: String,
    #[serde(default)]
    pub source: CardSource,
    #[serde(default)]
    pub model_name: Option<String>,
}

pub(crate) fn require_user(state: &AppState) -> Result<UserId, CommandError> {
    state
        .session
        .current_user_id()
        .ok_or_else(|| StudyError::AuthRequired.into())
}

/// Deck owned by the logged-in user.
pub(crate) fn owned_deck(state: &AppState, deck_id: i64) -> Result<Deck, CommandError> {
    let user_id = require_user(state)?;
    state
        .repository
        .get_deck(deck_id)?
        .filter(|deck| deck.user_id == user_id)
        .ok_or_else(|| CommandError::new(format!("deck not found: {deck_id}")))
}

/// Log in as a local user. Any unfinished study session is dropped.
pub fn login(state: &mut AppState, username: &str) -> Result<UserId, CommandError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CommandError::new("username must not be empty"));
    }
    state.engine.end_session();
    state.session.login(username).map_err(Into::into)
}

pub fn logout(state: &mut AppState) {
    state.engine.end_session();
    state.session.logout();
}

/// List the logged-in user's decks.
pub fn list_decks(state: &AppState) -> Result<Vec<Deck>, CommandError> {
    let user_id = require_user(state)?;
    state.repository.list_decks(user_id).map_err(Into::into)
}

pub fn create_deck(state: &AppState, name: &str) -> Result<Deck, CommandError> {
    let user_id = require_user(state)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::new("deck name must not be empty"));
    }
    state.repository.create_deck(user_id, name).map_err(Into::into)
}

/// Add a card to one of the user's decks.
pub fn add_card(state: &AppState, request: AddCardRequest) -> Result<Flashcard, CommandError> {
    let deck = owned_deck(state, request.deck_id)?;
    let front_text = request.front_text.trim();
    let back_text = request.back_text.trim();
    if front_text.is_empty() || back_text.is_empty() {
        return Err(CommandError::new("card front and back must not be empty"));
    }
    if request.source == CardSource::Manual && request.model_name.is_some() {
        return Err(CommandError::new("manual cards carry no model name"));
    }

    state
        .repository
        .add_card(&NewFlashcard {
            deck_id: deck.id,
            front_text: front_text.to_string(),
            back_text: back_text.to_string(),
            source: request.source,
            model_name: request.model_name,
        })
        .map_err(Into::into)
}

/// Review history of one of the user's cards, oldest first.
pub fn review_history(
    state: &AppState,
    card_id: FlashcardId,
) -> Result<Vec<ReviewLogEntry>, CommandError> {
    let card = state
        .repository
        .get_flashcard(card_id)?
        .ok_or_else(|| CommandError::new(format!("card not found: {card_id}")))?;
    owned_deck(state, card.deck_id)?;
    state.repository.list_review_logs(card_id).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRepository;
    use study_core::SchedulerConfig;

    fn state() -> AppState {
        AppState::new(SqliteRepository::open_in_memory().unwrap(), SchedulerConfig::default()).unwrap()
    }

    fn request(deck_id: i64, front: &str, back: &str) -> AddCardRequest {
        AddCardRequest {
            deck_id,
            front_text: front.to_string(),
            back_text: back.to_string(),
            source: CardSource::Manual,
            model_name: None,
        }
    }

    #[test]
    fn deck_commands_require_login() {
        let state = state();
        let err = list_decks(&state).unwrap_err();
        assert_eq!(err.message, StudyError::AuthRequired.to_string());
    }

    #[test]
    fn cards_are_trimmed_and_validated() {
        let mut state = state();
        login(&mut state, "ada").unwrap();
        let deck = create_deck(&state, "  Rust ").unwrap();
        assert_eq!(deck.name, "Rust");

        let card = add_card(&state, request(deck.id, " What is a borrow? ", "A reference ")).unwrap();
        assert_eq!(card.front_text, "What is a borrow?");
        assert_eq!(card.back_text, "A reference");

        assert!(add_card(&state, request(deck.id, "   ", "back")).is_err());
    }

    #[test]
    fn other_users_decks_are_hidden() {
        let mut state = state();
        login(&mut state, "ada").unwrap();
        let deck = create_deck(&state, "Private").unwrap();

        login(&mut state, "grace").unwrap();
        assert!(list_decks(&state).unwrap().is_empty());
        let err = add_card(&state, request(deck.id, "front", "back")).unwrap_err();
        assert_eq!(err.message, format!("deck not found: {}", deck.id));
    }

    #[test]
    fn manual_cards_reject_model_names() {
        let mut state = state();
        login(&mut state, "ada").unwrap();
        let deck = create_deck(&state, "Rust").unwrap();
        let err = add_card(
            &state,
            AddCardRequest {
                model_name: Some("gpt-4o".to_string()),
                ..request(deck.id, "front", "back")
            },
        )
        .unwrap_err();
        assert_eq!(err.message, "manual cards carry no model name");
    }
}

//! Commands exposed to front ends.

pub mod deck;
pub mod study;

pub use deck::{
    add_card, create_deck, list_decks, login, logout, review_history, AddCardRequest, CommandError,
};
pub use study::{
    current_card, end_study, next_card, start_study, study_progress, submit_review, CardView,
    ReviewRequest, ReviewResponse,
};

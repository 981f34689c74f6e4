//! Local SQLite storage.

mod date_utils;
mod error;
mod repository;
mod schema;

pub use error::DbError;
pub use repository::{Deck, NewFlashcard, SqliteRepository};

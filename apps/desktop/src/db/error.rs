//! Database error types.

use study_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("card not found: {0}")]
    CardNotFound(i64),

    #[error("deck not found: {0}")]
    DeckNotFound(i64),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl DbError {
    fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::CardNotFound(id) => StoreError::Integrity(format!("card {id} does not exist")),
            DbError::DeckNotFound(id) => StoreError::NotFound(format!("deck {id}")),
            e if e.is_constraint_violation() => StoreError::Integrity(e.to_string()),
            e => StoreError::backend(e),
        }
    }
}

//! Repository pattern for database access.

use crate::db::date_utils::{format_timestamp, timestamp_column};
use crate::db::error::DbError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use study_core::{
    CardSource, DeckId, Flashcard, FlashcardId, FlashcardStore, Rating, ReviewLogEntry,
    ReviewLogStore, StoreError, UserId,
};

type Result<T> = std::result::Result<T, DbError>;

const FLASHCARD_COLUMNS: &str = "id, deck_id, front_text, back_text, scheduler_state, source, model_name, created_at, updated_at";

/// Deck with card count.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Deck {
    pub id: DeckId,
    pub user_id: UserId,
    pub name: String,
    pub card_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Card to be inserted. Text validation happens before this point.
#[derive(Debug, Clone)]
pub struct NewFlashcard {
    pub deck_id: DeckId,
    pub front_text: String,
    pub back_text: String,
    pub source: CardSource,
    pub model_name: Option<String>,
}

/// SQLite implementation of the study stores.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", true)?;
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![super::schema::SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Look up a local user, creating the account on first login.
    pub fn find_or_create_user(&self, username: &str) -> Result<UserId> {
        self.conn.execute(
            "INSERT OR IGNORE INTO users (username, created_at) VALUES (?1, ?2)",
            params![username, format_timestamp(&Utc::now())],
        )?;
        self.conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn create_deck(&self, user_id: UserId, name: &str) -> Result<Deck> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO decks (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, name, format_timestamp(&created_at)],
        )?;
        Ok(Deck {
            id: self.conn.last_insert_rowid(),
            user_id,
            name: name.to_string(),
            card_count: 0,
            created_at,
        })
    }

    pub fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>> {
        self.conn
            .query_row(
                "SELECT d.id, d.user_id, d.name, d.created_at, COUNT(f.id)
                 FROM decks d
                 LEFT JOIN flashcards f ON f.deck_id = d.id
                 WHERE d.id = ?1
                 GROUP BY d.id",
                params![deck_id],
                Self::row_to_deck,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_decks(&self, user_id: UserId) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.user_id, d.name, d.created_at, COUNT(f.id)
             FROM decks d
             LEFT JOIN flashcards f ON f.deck_id = d.id
             WHERE d.user_id = ?1
             GROUP BY d.id
             ORDER BY d.name",
        )?;
        let decks = stmt
            .query_map(params![user_id], Self::row_to_deck)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(decks)
    }

    pub fn add_card(&self, card: &NewFlashcard) -> Result<Flashcard> {
        if self.get_deck(card.deck_id)?.is_none() {
            return Err(DbError::DeckNotFound(card.deck_id));
        }
        let now = Utc::now();
        let stamp = format_timestamp(&now);
        self.conn.execute(
            "INSERT INTO flashcards (deck_id, front_text, back_text, source, model_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                card.deck_id,
                card.front_text,
                card.back_text,
                card.source.as_str(),
                card.model_name,
                stamp
            ],
        )?;
        Ok(Flashcard {
            id: self.conn.last_insert_rowid(),
            deck_id: card.deck_id,
            front_text: card.front_text.clone(),
            back_text: card.back_text.clone(),
            scheduler_state: None,
            source: card.source,
            model_name: card.model_name.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_flashcard(&self, id: FlashcardId) -> Result<Option<Flashcard>> {
        self.conn
            .query_row(
                &format!("SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id = ?1"),
                params![id],
                Self::row_to_flashcard,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Cards of a deck, oldest first. Equal timestamps fall back to id.
    pub fn list_flashcards(&self, deck_id: DeckId) -> Result<Vec<Flashcard>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE deck_id = ?1 ORDER BY created_at, id"
        ))?;
        let cards = stmt
            .query_map(params![deck_id], Self::row_to_flashcard)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    pub fn save_flashcard(&self, card: &Flashcard) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE flashcards
             SET deck_id = ?2, front_text = ?3, back_text = ?4, scheduler_state = ?5,
                 source = ?6, model_name = ?7, updated_at = ?8
             WHERE id = ?1",
            params![
                card.id,
                card.deck_id,
                card.front_text,
                card.back_text,
                card.scheduler_state,
                card.source.as_str(),
                card.model_name,
                format_timestamp(&card.updated_at)
            ],
        )?;
        if updated == 0 {
            return Err(DbError::CardNotFound(card.id));
        }
        Ok(())
    }

    pub fn insert_review_log(&self, entry: &ReviewLogEntry) -> Result<i64> {
        let params_json = serde_json::to_string(&entry.scheduler_params)?;
        self.conn.execute(
            "INSERT INTO review_logs (user_id, flashcard_id, rating, reviewed_at, log_data, scheduler_params)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.user_id,
                entry.flashcard_id,
                entry.rating.to_value(),
                format_timestamp(&entry.reviewed_at),
                entry.log_data,
                params_json
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Review history of a card, oldest first.
    pub fn list_review_logs(&self, flashcard_id: FlashcardId) -> Result<Vec<ReviewLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, flashcard_id, rating, reviewed_at, log_data, scheduler_params
             FROM review_logs
             WHERE flashcard_id = ?1
             ORDER BY reviewed_at, id",
        )?;
        let rows = stmt
            .query_map(params![flashcard_id], |row| {
                let rating: u8 = row.get(2)?;
                let rating = Rating::from_value(rating).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        Type::Integer,
                        Box::new(DbError::InvalidData(format!("rating {rating}"))),
                    )
                })?;
                let params_json: String = row.get(5)?;
                Ok((
                    ReviewLogEntry {
                        user_id: row.get(0)?,
                        flashcard_id: row.get(1)?,
                        rating,
                        reviewed_at: timestamp_column(row, 3)?,
                        log_data: row.get(4)?,
                        scheduler_params: Vec::new(),
                    },
                    params_json,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut entry, params_json)| {
                entry.scheduler_params = serde_json::from_str(&params_json)?;
                Ok(entry)
            })
            .collect()
    }

    fn row_to_deck(row: &rusqlite::Row) -> rusqlite::Result<Deck> {
        Ok(Deck {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            created_at: timestamp_column(row, 3)?,
            card_count: row.get::<_, i64>(4)? as usize,
        })
    }

    fn row_to_flashcard(row: &rusqlite::Row) -> rusqlite::Result<Flashcard> {
        let source: String = row.get(5)?;
        let source = source
            .parse::<CardSource>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
        Ok(Flashcard {
            id: row.get(0)?,
            deck_id: row.get(1)?,
            front_text: row.get(2)?,
            back_text: row.get(3)?,
            scheduler_state: row.get(4)?,
            source,
            model_name: row.get(6)?,
            created_at: timestamp_column(row, 7)?,
            updated_at: timestamp_column(row, 8)?,
        })
    }
}

impl FlashcardStore for SqliteRepository {
    fn list_by_deck(&self, deck_id: DeckId) -> std::result::Result<Vec<Flashcard>, StoreError> {
        self.list_flashcards(deck_id).map_err(Into::into)
    }

    fn update(&self, flashcard: &Flashcard) -> std::result::Result<(), StoreError> {
        self.save_flashcard(flashcard).map_err(Into::into)
    }
}

impl ReviewLogStore for SqliteRepository {
    fn append(&self, entry: &ReviewLogEntry) -> std::result::Result<(), StoreError> {
        self.insert_review_log(entry).map(|_| ()).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn repo_with_deck() -> (SqliteRepository, Deck) {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let user = repo.find_or_create_user("ada").unwrap();
        let deck = repo.create_deck(user, "Rust").unwrap();
        (repo, deck)
    }

    fn new_card(deck_id: DeckId, front: &str) -> NewFlashcard {
        NewFlashcard {
            deck_id,
            front_text: front.to_string(),
            back_text: format!("{front} answer"),
            source: CardSource::Manual,
            model_name: None,
        }
    }

    #[test]
    fn login_reuses_existing_user() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let first = repo.find_or_create_user("ada").unwrap();
        let again = repo.find_or_create_user("ada").unwrap();
        let other = repo.find_or_create_user("grace").unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[test]
    fn decks_report_card_counts() {
        let (repo, deck) = repo_with_deck();
        repo.add_card(&new_card(deck.id, "borrow")).unwrap();
        repo.add_card(&new_card(deck.id, "move")).unwrap();
        let empty = repo.create_deck(deck.user_id, "Async").unwrap();

        let decks = repo.list_decks(deck.user_id).unwrap();
        let counts: Vec<_> = decks.iter().map(|d| (d.name.as_str(), d.card_count)).collect();
        assert_eq!(counts, vec![("Async", 0), ("Rust", 2)]);
        assert_eq!(repo.get_deck(empty.id).unwrap().unwrap().card_count, 0);
    }

    #[test]
    fn add_card_to_missing_deck_fails() {
        let (repo, _) = repo_with_deck();
        let err = repo.add_card(&new_card(999, "orphan")).unwrap_err();
        assert!(matches!(err, DbError::DeckNotFound(999)));
    }

    #[test]
    fn list_by_deck_uses_creation_order() {
        let (repo, deck) = repo_with_deck();
        let first = repo.add_card(&new_card(deck.id, "first")).unwrap();
        let second = repo.add_card(&new_card(deck.id, "second")).unwrap();
        let third = repo.add_card(&new_card(deck.id, "third")).unwrap();

        let ids: Vec<_> = repo.list_by_deck(deck.id).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn update_persists_scheduler_state() {
        let (repo, deck) = repo_with_deck();
        let mut card = repo.add_card(&new_card(deck.id, "lifetime")).unwrap();
        card.scheduler_state = Some(r#"{"due":"later"}"#.to_string());
        card.updated_at = noon() + Duration::minutes(3);

        repo.update(&card).unwrap();

        let stored = repo.get_flashcard(card.id).unwrap().unwrap();
        assert_eq!(stored.scheduler_state, card.scheduler_state);
        assert_eq!(stored.updated_at, card.updated_at);
    }

    #[test]
    fn update_of_unknown_card_is_an_integrity_error() {
        let (repo, deck) = repo_with_deck();
        let mut card = repo.add_card(&new_card(deck.id, "ghost")).unwrap();
        card.id += 100;

        let err = repo.update(&card).unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
    }

    #[test]
    fn review_log_round_trips_parameters() {
        let (repo, deck) = repo_with_deck();
        let card = repo.add_card(&new_card(deck.id, "trait")).unwrap();
        let entry = ReviewLogEntry {
            user_id: deck.user_id,
            flashcard_id: card.id,
            rating: Rating::Hard,
            reviewed_at: noon() + Duration::hours(1),
            log_data: r#"{"rating":2}"#.to_string(),
            scheduler_params: vec![0.4, 0.6, 2.4],
        };

        repo.append(&entry).unwrap();

        assert_eq!(repo.list_review_logs(card.id).unwrap(), vec![entry]);
    }

    #[test]
    fn review_log_for_unknown_card_violates_foreign_key() {
        let (repo, deck) = repo_with_deck();
        let entry = ReviewLogEntry {
            user_id: deck.user_id,
            flashcard_id: 4242,
            rating: Rating::Good,
            reviewed_at: Utc::now(),
            log_data: String::new(),
            scheduler_params: Vec::new(),
        };

        let err = repo.append(&entry).unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
    }

    #[test]
    fn ai_sources_are_stored() {
        let (repo, deck) = repo_with_deck();
        let card = repo
            .add_card(&NewFlashcard {
                source: CardSource::AiGenerated,
                model_name: Some("gpt-4o-mini".to_string()),
                ..new_card(deck.id, "closure")
            })
            .unwrap();

        let stored = repo.get_flashcard(card.id).unwrap().unwrap();
        assert_eq!(stored.source, CardSource::AiGenerated);
        assert_eq!(stored.model_name.as_deref(), Some("gpt-4o-mini"));
    }
}

//! Shared fakes and fixtures for study engine integration tests.
//!
//! Provides:
//! - An in-memory flashcard store and review log that record every write
//! - A deterministic scheduler whose state is just a due date and a counter
//! - A `TestEnv` wiring them into an engine with a fixed clock

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use study_core::{
    CardSource, Clock, FixedClock, Flashcard, FlashcardStore, Rating, ReviewLogEntry,
    ReviewLogStore, ReviewOutcome, SchedulerAdapter, SchedulerConfig, SchedulerError,
    SessionContext, StoreError, StudySessionEngine, UserId,
};

pub const DECK: i64 = 1;
pub const USER: UserId = 42;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// Scheduler state: when the card is due and how often it was reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeState {
    pub due: DateTime<Utc>,
    pub reviews: u32,
}

thread_local! {
    static BUILDS: Cell<usize> = Cell::new(0);
}

/// How many schedulers were built on this test thread.
pub fn scheduler_builds() -> usize {
    BUILDS.with(Cell::get)
}

/// Deterministic scheduler: Again +10min, Hard +1d, Good +2d, Easy +4d.
#[derive(Debug)]
pub struct FakeScheduler {
    parameters: Vec<f64>,
}

impl SchedulerAdapter for FakeScheduler {
    type State = FakeState;

    fn from_config(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        BUILDS.with(|b| b.set(b.get() + 1));
        let parameters = if config.parameters.is_empty() {
            vec![0.4, 1.2, 3.1]
        } else {
            config.parameters.clone()
        };
        Ok(Self { parameters })
    }

    fn new_card_state(&self, now: DateTime<Utc>) -> FakeState {
        FakeState { due: now, reviews: 0 }
    }

    fn deserialize(&self, blob: &str) -> Result<FakeState, SchedulerError> {
        serde_json::from_str(blob).map_err(|e| SchedulerError::Deserialize(e.to_string()))
    }

    fn serialize(&self, state: &FakeState) -> Result<String, SchedulerError> {
        serde_json::to_string(state).map_err(|e| SchedulerError::Serialize(e.to_string()))
    }

    fn due_at(&self, state: &FakeState) -> DateTime<Utc> {
        state.due
    }

    fn review(
        &self,
        state: &FakeState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome<FakeState>, SchedulerError> {
        let interval = match rating {
            Rating::Again => Duration::minutes(10),
            Rating::Hard => Duration::days(1),
            Rating::Good => Duration::days(2),
            Rating::Easy => Duration::days(4),
        };
        Ok(ReviewOutcome {
            state: FakeState {
                due: now + interval,
                reviews: state.reviews + 1,
            },
            log_data: format!(r#"{{"rating":{}}}"#, rating.to_value()),
        })
    }

    fn parameters(&self) -> &[f64] {
        &self.parameters
    }
}

/// Serialized state blob due at `due`.
pub fn blob_due(due: DateTime<Utc>) -> String {
    serde_json::to_string(&FakeState { due, reviews: 1 }).unwrap()
}

pub fn card(id: i64, scheduler_state: Option<String>) -> Flashcard {
    Flashcard {
        id,
        deck_id: DECK,
        front_text: format!("Question {id}?"),
        back_text: format!("Answer {id}."),
        scheduler_state,
        source: CardSource::Manual,
        model_name: None,
        created_at: now() - Duration::days(30) + Duration::minutes(id),
        updated_at: now() - Duration::days(30) + Duration::minutes(id),
    }
}

/// In-memory card store recording every update.
#[derive(Default)]
pub struct MemoryFlashcards {
    pub cards: RefCell<Vec<Flashcard>>,
    pub updates: RefCell<Vec<Flashcard>>,
    pub fail_updates: Cell<bool>,
}

impl MemoryFlashcards {
    pub fn with_cards(cards: Vec<Flashcard>) -> Self {
        Self {
            cards: RefCell::new(cards),
            ..Default::default()
        }
    }

    pub fn stored(&self, id: i64) -> Flashcard {
        self.cards
            .borrow()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("card exists")
    }
}

impl FlashcardStore for MemoryFlashcards {
    fn list_by_deck(&self, deck_id: i64) -> Result<Vec<Flashcard>, StoreError> {
        Ok(self
            .cards
            .borrow()
            .iter()
            .filter(|c| c.deck_id == deck_id)
            .cloned()
            .collect())
    }

    fn update(&self, flashcard: &Flashcard) -> Result<(), StoreError> {
        if self.fail_updates.get() {
            return Err(StoreError::Integrity("update rejected".into()));
        }
        let mut cards = self.cards.borrow_mut();
        let slot = cards
            .iter_mut()
            .find(|c| c.id == flashcard.id)
            .ok_or_else(|| StoreError::NotFound(format!("card {}", flashcard.id)))?;
        *slot = flashcard.clone();
        self.updates.borrow_mut().push(flashcard.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryReviewLog {
    pub entries: RefCell<Vec<ReviewLogEntry>>,
    pub fail_appends: Cell<bool>,
}

impl ReviewLogStore for MemoryReviewLog {
    fn append(&self, entry: &ReviewLogEntry) -> Result<(), StoreError> {
        if self.fail_appends.get() {
            return Err(StoreError::Integrity("log append rejected".into()));
        }
        self.entries.borrow_mut().push(entry.clone());
        Ok(())
    }
}

pub struct FakeLogin {
    pub user: Cell<Option<UserId>>,
}

impl FakeLogin {
    pub fn as_user(user: UserId) -> Self {
        Self {
            user: Cell::new(Some(user)),
        }
    }
}

impl SessionContext for FakeLogin {
    fn current_user_id(&self) -> Option<UserId> {
        self.user.get()
    }
}

/// Engine plus handles to every collaborator.
pub struct TestEnv {
    pub engine: StudySessionEngine<FakeScheduler>,
    pub cards: Rc<MemoryFlashcards>,
    pub logs: Rc<MemoryReviewLog>,
    pub login: Rc<FakeLogin>,
    pub clock: Rc<FixedClock>,
}

impl TestEnv {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        let cards = Rc::new(MemoryFlashcards::with_cards(cards));
        let logs = Rc::new(MemoryReviewLog::default());
        let login = Rc::new(FakeLogin::as_user(USER));
        let clock = Rc::new(FixedClock::new(now()));
        let engine = StudySessionEngine::new(
            SchedulerConfig::default(),
            cards.clone(),
            logs.clone(),
            login.clone(),
        )
        .expect("default config is valid")
        .with_clock(clock.clone() as Rc<dyn Clock>);

        Self {
            engine,
            cards,
            logs,
            login,
            clock,
        }
    }

    /// Id of the current card.
    pub fn current_id(&self) -> Option<i64> {
        self.engine.current_card().map(|c| c.flashcard.id)
    }
}

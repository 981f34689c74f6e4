//! Study session engine.
//!
//! Lifecycle:
//! - Idle: no session.
//! - Active: a session whose position points at a queued card.
//! - Exhausted: position has moved past the last card; stays so until
//!   [`StudySessionEngine::end_session`] or a new
//!   [`StudySessionEngine::start_session`].
//!
//! The engine is single-threaded. Callers serialize access, which holds
//! naturally when one UI thread drives one engine per logged-in user.

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::{ConfigError, Result, StudyError};
use crate::scheduler::{repair_state, SchedulerAdapter, StateRepair};
use crate::selector::select_due_cards;
use crate::store::{FlashcardStore, ReviewLogStore, SessionContext};
use crate::types::{DeckId, Flashcard, FlashcardId, Rating, ReviewLogEntry, SessionProgress, UserId};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// A card in the session queue together with its scheduler state.
#[derive(Debug, Clone)]
pub struct QueuedCard<S> {
    pub flashcard: Flashcard,
    pub state: S,
}

/// Queue and cursor for one user studying one deck.
#[derive(Debug)]
struct StudySession<S> {
    deck_id: DeckId,
    user_id: UserId,
    queue: Vec<QueuedCard<S>>,
    /// Index of the current card; equals `queue.len()` once exhausted.
    position: usize,
    reviewed: usize,
}

impl<S> StudySession<S> {
    fn current(&self) -> Option<&QueuedCard<S>> {
        self.queue.get(self.position)
    }

    fn progress(&self) -> SessionProgress {
        let total = self.queue.len();
        SessionProgress::new((self.position + 1).min(total), total)
    }
}

/// Orchestrates review sessions over the injected collaborators.
pub struct StudySessionEngine<S: SchedulerAdapter> {
    config: SchedulerConfig,
    /// Built on first use, then kept for every later session.
    scheduler: Option<S>,
    flashcards: Rc<dyn FlashcardStore>,
    review_logs: Rc<dyn ReviewLogStore>,
    context: Rc<dyn SessionContext>,
    clock: Rc<dyn Clock>,
    session: Option<StudySession<S::State>>,
}

impl<S: SchedulerAdapter> StudySessionEngine<S> {
    /// Create an engine. An invalid configuration is rejected here rather
    /// than on the first session.
    pub fn new(
        config: SchedulerConfig,
        flashcards: Rc<dyn FlashcardStore>,
        review_logs: Rc<dyn ReviewLogStore>,
        context: Rc<dyn SessionContext>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            scheduler: None,
            flashcards,
            review_logs,
            context,
            clock: Rc::new(SystemClock),
            session: None,
        })
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start studying a deck, discarding any unfinished session.
    ///
    /// Cards without a usable stored state get a fresh one, which is written
    /// back before the due cards are selected. Returns the first card, or
    /// `None` when nothing in the deck is due.
    pub fn start_session(&mut self, deck_id: DeckId) -> Result<Option<&QueuedCard<S::State>>> {
        let user_id = self
            .context
            .current_user_id()
            .ok_or(StudyError::AuthRequired)?;

        self.end_session();

        if self.scheduler.is_none() {
            self.scheduler = Some(S::from_config(&self.config)?);
            debug!("scheduler initialized");
        }
        let scheduler = self
            .scheduler
            .as_ref()
            .ok_or(StudyError::SchedulerNotInitialized)?;

        let now = self.clock.now();
        let cards = self.flashcards.list_by_deck(deck_id)?;
        let total = cards.len();

        let mut loaded = Vec::with_capacity(total);
        for mut flashcard in cards {
            let (state, repair) =
                repair_state(scheduler, flashcard.scheduler_state.as_deref(), now);
            match &repair {
                StateRepair::Loaded => {}
                StateRepair::Initialized => {
                    debug!(card_id = flashcard.id, "initialized scheduler state");
                }
                StateRepair::Reset { reason } => {
                    warn!(card_id = flashcard.id, %reason, "resetting corrupt scheduler state");
                }
            }
            if repair.was_repaired() {
                flashcard.scheduler_state = Some(scheduler.serialize(&state)?);
                flashcard.updated_at = now;
                self.flashcards.update(&flashcard)?;
            }
            loaded.push(QueuedCard { flashcard, state });
        }

        let queue = select_due_cards(scheduler, loaded, now);
        info!(deck_id, user_id, total, due = queue.len(), "study session started");

        if queue.is_empty() {
            return Ok(None);
        }
        self.session = Some(StudySession {
            deck_id,
            user_id,
            queue,
            position: 0,
            reviewed: 0,
        });
        Ok(self.current_card())
    }

    /// The card under the cursor, if any.
    pub fn current_card(&self) -> Option<&QueuedCard<S::State>> {
        self.session.as_ref().and_then(StudySession::current)
    }

    /// Rate the current card.
    ///
    /// `flashcard_id` must name the current card, which guards against stale
    /// UI state such as a double submit after navigating. The card keeps its
    /// position in the queue. If the scheduler or a store fails, the session
    /// is left as it was so the caller can retry.
    pub fn record_review(
        &mut self,
        flashcard_id: FlashcardId,
        rating: u8,
    ) -> Result<&QueuedCard<S::State>> {
        let scheduler = self
            .scheduler
            .as_ref()
            .ok_or(StudyError::SchedulerNotInitialized)?;
        let user_id = self
            .context
            .current_user_id()
            .ok_or(StudyError::AuthRequired)?;
        let session = self.session.as_mut().ok_or(StudyError::NoActiveCard)?;
        if session.user_id != user_id {
            return Err(StudyError::SessionUserMismatch);
        }

        let position = session.position;
        let current = session.queue.get(position).ok_or(StudyError::NoActiveCard)?;
        if current.flashcard.id != flashcard_id {
            return Err(StudyError::CardIdMismatch {
                expected: current.flashcard.id,
                actual: flashcard_id,
            });
        }
        let rating = Rating::from_value(rating).ok_or(StudyError::InvalidRating(rating))?;

        let now = self.clock.now();
        let outcome = scheduler.review(&current.state, rating, now)?;

        let mut flashcard = current.flashcard.clone();
        flashcard.scheduler_state = Some(scheduler.serialize(&outcome.state)?);
        flashcard.updated_at = now;
        self.flashcards.update(&flashcard)?;

        let entry = ReviewLogEntry {
            user_id,
            flashcard_id,
            rating,
            reviewed_at: now,
            log_data: outcome.log_data,
            scheduler_params: scheduler.parameters().to_vec(),
        };
        self.review_logs.append(&entry)?;

        debug!(card_id = flashcard_id, ?rating, "review recorded");
        session.reviewed += 1;
        session.queue[position] = QueuedCard {
            flashcard,
            state: outcome.state,
        };
        Ok(&session.queue[position])
    }

    /// Move to the next card. Returns `None` once the queue is exhausted.
    pub fn proceed_to_next_card(&mut self) -> Option<&QueuedCard<S::State>> {
        let session = self.session.as_mut()?;
        if session.position < session.queue.len() {
            session.position += 1;
        }
        let next = session.queue.get(session.position);
        match next {
            Some(card) => debug!(
                card_id = card.flashcard.id,
                position = session.position + 1,
                "next card"
            ),
            None => info!(
                deck_id = session.deck_id,
                reviewed = session.reviewed,
                "study session exhausted"
            ),
        }
        next
    }

    /// "Card k of N". Never fails.
    pub fn session_progress(&self) -> SessionProgress {
        self.session
            .as_ref()
            .map(StudySession::progress)
            .unwrap_or_default()
    }

    /// Drop the current session. The scheduler is kept for the next one.
    pub fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            info!(
                deck_id = session.deck_id,
                reviewed = session.reviewed,
                total = session.queue.len(),
                "study session ended"
            );
        }
    }

    /// Deck of the active session.
    pub fn deck_id(&self) -> Option<DeckId> {
        self.session.as_ref().map(|s| s.deck_id)
    }

    pub fn is_exhausted(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.position >= s.queue.len())
    }

    /// Cards not yet reached, including the current one.
    pub fn remaining(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.queue.len().saturating_sub(s.position))
    }

    pub fn scheduler(&self) -> Option<&S> {
        self.scheduler.as_ref()
    }
}

//! Shared fixtures for desktop integration tests.

#![allow(dead_code)]

use std::rc::Rc;

use chrono::{TimeZone, Utc};
use study_core::{CardSource, DeckId, FixedClock, FlashcardId, SchedulerConfig};
use study_desktop_lib::commands::{self, AddCardRequest};
use study_desktop_lib::db::SqliteRepository;
use study_desktop_lib::state::AppState;

pub struct TestApp {
    pub state: AppState,
    pub clock: Rc<FixedClock>,
    pub deck_id: DeckId,
    pub card_ids: Vec<FlashcardId>,
}

/// In-memory app with fuzzing off, logged in as `ada`, one deck of `fronts`.
pub fn app_with_deck(fronts: &[&str]) -> TestApp {
    let config = SchedulerConfig {
        enable_fuzzing: false,
        ..SchedulerConfig::default()
    };
    let clock = Rc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap(),
    ));
    let mut state = AppState::new(SqliteRepository::open_in_memory().unwrap(), config)
        .unwrap()
        .with_clock(clock.clone());

    commands::login(&mut state, "ada").unwrap();
    let deck = commands::create_deck(&state, "Rust").unwrap();
    let card_ids = fronts
        .iter()
        .map(|front| {
            commands::add_card(
                &state,
                AddCardRequest {
                    deck_id: deck.id,
                    front_text: front.to_string(),
                    back_text: format!("{front} answer"),
                    source: CardSource::Manual,
                    model_name: None,
                },
            )
            .unwrap()
            .id
        })
        .collect();

    TestApp {
        state,
        clock,
        deck_id: deck.id,
        card_ids,
    }
}

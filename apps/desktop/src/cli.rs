//! Terminal front end.

use crate::commands::{self, AddCardRequest, ReviewRequest};
use crate::state::AppState;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use study_core::{CardSource, DeckId, FlashcardId, Rating};

#[derive(Parser, Debug)]
#[command(name = "study", about = "Spaced-repetition flashcards in the terminal", version)]
pub struct Cli {
    /// Database file (default: $STUDY_DATABASE_PATH or the user data directory)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Local account name (default: $STUDY_USER or $USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List your decks
    Decks,

    /// Create a deck
    AddDeck {
        name: String,
    },

    /// Add a card to a deck
    AddCard {
        deck_id: DeckId,
        front: String,
        back: String,
    },

    /// Study the due cards of a deck
    Study {
        deck_id: DeckId,
    },

    /// Show the review history of a card
    History {
        card_id: FlashcardId,
    },
}

/// Outcome of an interactive study session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StudySummary {
    pub reviewed: usize,
    pub completed: bool,
}

/// Run a non-interactive subcommand, or the study loop on stdin.
pub fn execute(state: &mut AppState, command: Command, format: OutputFormat) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Decks => {
            let decks = commands::list_decks(state)?;
            if format == OutputFormat::Json {
                writeln!(out, "{}", serde_json::to_string_pretty(&decks)?)?;
            } else if decks.is_empty() {
                writeln!(out, "No decks yet. Create one with `study add-deck <name>`.")?;
            } else {
                for deck in decks {
                    writeln!(out, "{:>4}  {}  ({} cards)", deck.id, deck.name, deck.card_count)?;
                }
            }
        }
        Command::AddDeck { name } => {
            let deck = commands::create_deck(state, &name)?;
            writeln!(out, "Created deck {} ({})", deck.id, deck.name)?;
        }
        Command::AddCard {
            deck_id,
            front,
            back,
        } => {
            let card = commands::add_card(
                state,
                AddCardRequest {
                    deck_id,
                    front_text: front,
                    back_text: back,
                    source: CardSource::Manual,
                    model_name: None,
                },
            )?;
            writeln!(out, "Added card {} to deck {}", card.id, card.deck_id)?;
        }
        Command::Study { deck_id } => {
            let stdin = std::io::stdin();
            let summary = study_loop(state, deck_id, stdin.lock(), &mut out)?;
            tracing::debug!(?summary, "study loop finished");
        }
        Command::History { card_id } => {
            let entries = commands::review_history(state, card_id)?;
            if format == OutputFormat::Json {
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            } else if entries.is_empty() {
                writeln!(out, "Card {card_id} has not been reviewed yet.")?;
            } else {
                for entry in entries {
                    writeln!(
                        out,
                        "{}  {:?}",
                        entry.reviewed_at.format("%Y-%m-%d %H:%M"),
                        entry.rating
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn read_answer<R: BufRead>(input: &mut R) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).context("failed to read input")? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}

/// Interactive loop: show the front, reveal the back, read a rating.
///
/// `q` or end of input quits. The session is ended either way.
pub fn study_loop<R: BufRead, W: Write>(
    state: &mut AppState,
    deck_id: DeckId,
    mut input: R,
    out: &mut W,
) -> anyhow::Result<StudySummary> {
    let mut summary = StudySummary::default();
    let mut card = match commands::start_study(state, deck_id)? {
        Some(card) => card,
        None => {
            writeln!(out, "Nothing due in this deck.")?;
            summary.completed = true;
            return Ok(summary);
        }
    };

    'cards: loop {
        writeln!(out)?;
        writeln!(out, "[{}] {}", commands::study_progress(state), card.front_text)?;
        write!(out, "Press enter to reveal (q to quit) ")?;
        out.flush()?;
        if read_answer(&mut input)?.is_none() {
            break;
        }
        writeln!(out, "{}", card.back_text)?;

        loop {
            write!(out, "Rate 1=Again 2=Hard 3=Good 4=Easy (q to quit) ")?;
            out.flush()?;
            let Some(answer) = read_answer(&mut input)? else {
                break 'cards;
            };
            let rating = match answer.parse::<u8>() {
                Ok(rating) => rating,
                Err(_) => {
                    writeln!(out, "Please enter a number from 1 to 4.")?;
                    continue;
                }
            };
            match commands::submit_review(state, ReviewRequest { card_id: card.id, rating }) {
                Ok(response) => {
                    summary.reviewed += 1;
                    let label = Rating::from_value(rating).map_or("?", rating_label);
                    writeln!(out, "{label}: next review {}", response.next_due)?;
                    break;
                }
                Err(e) => writeln!(out, "{e}")?,
            }
        }

        match commands::next_card(state) {
            Some(next) => card = next,
            None => {
                summary.completed = true;
                writeln!(out)?;
                writeln!(out, "Session complete: {} cards reviewed.", summary.reviewed)?;
                break;
            }
        }
    }

    commands::end_study(state);
    Ok(summary)
}

fn rating_label(rating: Rating) -> &'static str {
    match rating {
        Rating::Again => "Again",
        Rating::Hard => "Hard",
        Rating::Good => "Good",
        Rating::Easy => "Easy",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_study_subcommand() {
        let cli = Cli::try_parse_from(["study", "--user", "ada", "study", "7"]).unwrap();
        assert_eq!(cli.user.as_deref(), Some("ada"));
        assert!(matches!(cli.command, Command::Study { deck_id: 7 }));
    }

    #[test]
    fn parses_add_card_with_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["study", "add-card", "3", "front", "back", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Command::AddCard { deck_id: 3, ref front, ref back } if front == "front" && back == "back"
        ));
    }

    #[test]
    fn quit_answer_is_case_insensitive() {
        let mut input = "Q\n".as_bytes();
        assert_eq!(read_answer(&mut input).unwrap(), None);
        let mut input = " 3 \n".as_bytes();
        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some("3"));
        let mut input = "".as_bytes();
        assert_eq!(read_answer(&mut input).unwrap(), None);
    }
}

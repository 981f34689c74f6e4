//! Due card selection.

use crate::scheduler::SchedulerAdapter;
use crate::session::QueuedCard;
use chrono::{DateTime, Utc};

/// Keep the cards due at or before `now`, earliest due first.
///
/// Cards with equal due timestamps keep their relative input order, so the
/// store's load order is the tie-break. The result is deterministic for a
/// given input regardless of how the adapter computes due dates.
pub fn select_due_cards<S: SchedulerAdapter>(
    scheduler: &S,
    cards: Vec<QueuedCard<S::State>>,
    now: DateTime<Utc>,
) -> Vec<QueuedCard<S::State>> {
    let mut due: Vec<_> = cards
        .into_iter()
        .map(|card| (scheduler.due_at(&card.state), card))
        .filter(|(due_at, _)| *due_at <= now)
        .collect();

    // sort_by_key is stable
    due.sort_by_key(|(due_at, _)| *due_at);
    due.into_iter().map(|(_, card)| card).collect()
}

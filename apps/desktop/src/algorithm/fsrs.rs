//! FSRS (Free Spaced Repetition Scheduler) adapter.
//!
//! DSR memory model:
//! - Difficulty (D): Card difficulty 1-10
//! - Stability (S): Days until retention drops to target
//! - Retrievability (R): Probability of recall
//!
//! Cards start in `Learning` and walk the configured learning steps before
//! graduating to `Review`. A lapse in `Review` moves the card through the
//! relearning steps. Card state is stored as a JSON blob.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use study_core::{
    ConfigError, Rating, ReviewOutcome, SchedulerAdapter, SchedulerConfig, SchedulerError,
};

/// FSRS-4.5 default weights.
pub const DEFAULT_WEIGHTS: [f64; 17] = [
    0.4, 0.6, 2.4, 5.8, // w[0-3]: initial stability for Again, Hard, Good, Easy
    4.93, // w[4]: initial difficulty base
    0.94, // w[5]: initial difficulty modifier
    0.86, // w[6]: difficulty decay
    0.01, // w[7]: mean reversion weight
    1.49, // w[8]: stability exp base
    0.14, // w[9]: stability decay
    0.94, // w[10]: retrievability effect
    2.18, // w[11]: forget stability base
    0.05, // w[12]: difficulty on forget
    0.34, // w[13]: stability on forget
    1.26, // w[14]: retrievability on forget
    0.29, // w[15]: hard penalty
    2.61, // w[16]: easy bonus
];

/// (lower bound, upper bound, factor) in days for interval fuzzing.
const FUZZ_RANGES: [(f64, f64, f64); 3] = [
    (2.5, 7.0, 0.15),
    (7.0, 20.0, 0.1),
    (20.0, f64::INFINITY, 0.05),
];

fn durations(secs: &[u64]) -> Result<Vec<Duration>, ConfigError> {
    secs.iter()
        .map(|&s| {
            i64::try_from(s)
                .ok()
                .and_then(Duration::try_seconds)
                .ok_or(ConfigError::Steps)
        })
        .collect()
}

/// Card learning status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Learning,
    Review,
    Relearning,
}

/// Per-card scheduler state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsCardState {
    pub status: CardStatus,
    /// Index into the learning or relearning steps; `None` in review.
    pub step: Option<usize>,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub due: DateTime<Utc>,
    pub last_review: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lapses: u32,
    #[serde(default)]
    pub reviews_count: u32,
}

/// Review log payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsReviewLog {
    pub rating: u8,
    pub review_datetime: DateTime<Utc>,
    pub status_before: CardStatus,
    pub status_after: CardStatus,
    pub elapsed_days: Option<f64>,
    pub scheduled_secs: i64,
}

/// FSRS scheduler built from a [`SchedulerConfig`].
#[derive(Debug, Clone)]
pub struct FsrsScheduler {
    w: Vec<f64>,
    request_retention: f64,
    learning_steps: Vec<Duration>,
    relearning_steps: Vec<Duration>,
    maximum_interval: f64,
    enable_fuzzing: bool,
}

impl SchedulerAdapter for FsrsScheduler {
    type State = FsrsCardState;

    fn from_config(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        let w = if config.parameters.is_empty() {
            DEFAULT_WEIGHTS.to_vec()
        } else if config.parameters.len() == DEFAULT_WEIGHTS.len() {
            config.parameters.clone()
        } else {
            return Err(ConfigError::ParameterCount {
                expected: DEFAULT_WEIGHTS.len(),
                actual: config.parameters.len(),
            }
            .into());
        };

        Ok(Self {
            w,
            request_retention: config.desired_retention,
            learning_steps: durations(&config.learning_steps_secs)?,
            relearning_steps: durations(&config.relearning_steps_secs)?,
            maximum_interval: config.maximum_interval as f64,
            enable_fuzzing: config.enable_fuzzing,
        })
    }

    fn new_card_state(&self, now: DateTime<Utc>) -> FsrsCardState {
        FsrsCardState {
            status: CardStatus::Learning,
            step: Some(0),
            stability: None,
            difficulty: None,
            due: now,
            last_review: None,
            lapses: 0,
            reviews_count: 0,
        }
    }

    fn deserialize(&self, blob: &str) -> Result<FsrsCardState, SchedulerError> {
        let state: FsrsCardState =
            serde_json::from_str(blob).map_err(|e| SchedulerError::Deserialize(e.to_string()))?;
        if state.stability.is_some_and(|s| !(s > 0.0)) {
            return Err(SchedulerError::Deserialize("stability must be positive".into()));
        }
        Ok(state)
    }

    fn serialize(&self, state: &FsrsCardState) -> Result<String, SchedulerError> {
        serde_json::to_string(state).map_err(|e| SchedulerError::Serialize(e.to_string()))
    }

    fn due_at(&self, state: &FsrsCardState) -> DateTime<Utc> {
        state.due
    }

    fn review(
        &self,
        state: &FsrsCardState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome<FsrsCardState>, SchedulerError> {
        let rating_value = rating.to_value();
        let elapsed_days = state
            .last_review
            .map(|last| (now.signed_duration_since(last).num_seconds() as f64 / 86400.0).max(0.0));

        let (stability, difficulty) = match (state.stability, state.difficulty) {
            (Some(s), Some(d)) => (
                self.next_stability(s, d, elapsed_days.unwrap_or(0.0), rating_value),
                self.next_difficulty(d, rating_value),
            ),
            _ => (
                self.initial_stability(rating_value),
                self.initial_difficulty(rating_value),
            ),
        };

        let (status, step, interval) = match state.status {
            CardStatus::Learning => self.step_through(
                &self.learning_steps,
                CardStatus::Learning,
                state.step.unwrap_or(0),
                rating_value,
                stability,
            ),
            CardStatus::Relearning => self.step_through(
                &self.relearning_steps,
                CardStatus::Relearning,
                state.step.unwrap_or(0),
                rating_value,
                stability,
            ),
            CardStatus::Review => match self.relearning_steps.first() {
                Some(&first) if rating_value == 1 => (CardStatus::Relearning, Some(0), first),
                _ => (CardStatus::Review, None, self.review_interval(stability)),
            },
        };

        let lapses = if state.status == CardStatus::Review && rating_value == 1 {
            state.lapses + 1
        } else {
            state.lapses
        };

        let log = FsrsReviewLog {
            rating: rating_value,
            review_datetime: now,
            status_before: state.status,
            status_after: status,
            elapsed_days,
            scheduled_secs: interval.num_seconds(),
        };
        let log_data =
            serde_json::to_string(&log).map_err(|e| SchedulerError::Serialize(e.to_string()))?;

        let due = now
            .checked_add_signed(interval)
            .ok_or(SchedulerError::DueOutOfRange)?;

        Ok(ReviewOutcome {
            state: FsrsCardState {
                status,
                step,
                stability: Some(stability),
                difficulty: Some(difficulty),
                due,
                last_review: Some(now),
                lapses,
                reviews_count: state.reviews_count + 1,
            },
            log_data,
        })
    }

    fn parameters(&self) -> &[f64] {
        &self.w
    }
}

impl FsrsScheduler {
    /// Walk a learning or relearning step sequence.
    fn step_through(
        &self,
        steps: &[Duration],
        status: CardStatus,
        step: usize,
        rating: u8,
        stability: f64,
    ) -> (CardStatus, Option<usize>, Duration) {
        let graduate = || (CardStatus::Review, None, self.review_interval(stability));

        if steps.is_empty() || (step >= steps.len() && rating != 1) {
            return graduate();
        }

        match rating {
            1 => (status, Some(0), steps[0]),
            2 => {
                let interval = match (step, steps.len()) {
                    (0, 1) => steps[0] * 3 / 2,
                    (0, _) => (steps[0] + steps[1]) / 2,
                    _ => steps[step],
                };
                (status, Some(step), interval)
            }
            3 if step + 1 < steps.len() => (status, Some(step + 1), steps[step + 1]),
            _ => graduate(),
        }
    }

    /// Review interval in whole days, optionally fuzzed.
    fn review_interval(&self, stability: f64) -> Duration {
        let days = self.interval_from_stability(stability).round();
        let days = if self.enable_fuzzing {
            self.fuzz_interval(days)
        } else {
            days
        };
        Duration::days(days as i64)
    }

    /// Calculate initial stability for a new card based on first rating.
    /// S0(G) = w[G-1] where G is rating 1-4
    fn initial_stability(&self, rating: u8) -> f64 {
        let index = (rating.saturating_sub(1)) as usize;
        self.w[index.min(3)].max(0.1)
    }

    /// Calculate initial difficulty for a new card based on first rating.
    /// D0(G) = w[4] - w[5] * (G - 3)
    fn initial_difficulty(&self, rating: u8) -> f64 {
        let d0 = self.w[4] - self.w[5] * (rating as f64 - 3.0);
        d0.clamp(1.0, 10.0)
    }

    /// D' = w[7] * D0(G) + (1 - w[7]) * D, then D'' = D' - w[6] * (G - 3)
    fn next_difficulty(&self, current_d: f64, rating: u8) -> f64 {
        let d0 = self.initial_difficulty(rating);
        let d_new = self.w[7] * d0 + (1.0 - self.w[7]) * current_d;
        let d_decayed = d_new - self.w[6] * (rating as f64 - 3.0);
        d_decayed.clamp(1.0, 10.0)
    }

    /// R = (1 + t / (9 * S))^(-1)
    fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        if stability <= 0.0 {
            return 0.0;
        }
        let factor = 1.0 + elapsed_days / (9.0 * stability);
        factor.powf(-1.0)
    }

    /// Stability after a review of a card that already has a memory state.
    /// Same-day successes leave stability unchanged.
    fn next_stability(&self, stability: f64, difficulty: f64, elapsed_days: f64, rating: u8) -> f64 {
        let r = self.retrievability(elapsed_days, stability);
        if rating == 1 {
            self.next_stability_forget(stability, difficulty, r)
        } else if elapsed_days < 1.0 {
            stability
        } else {
            self.next_stability_recall(stability, difficulty, r, rating)
        }
    }

    /// S' = S * (e^(w[8]) * (11 - D) * S^(-w[9]) * (e^(w[10]*(1-R)) - 1) + 1) * modifier
    fn next_stability_recall(
        &self,
        stability: f64,
        difficulty: f64,
        retrievability: f64,
        rating: u8,
    ) -> f64 {
        let exp_w8 = self.w[8].exp();
        let d_factor = (11.0 - difficulty).max(0.1);
        let s_decay = stability.powf(-self.w[9]);
        let r_factor = (self.w[10] * (1.0 - retrievability)).exp() - 1.0;

        let growth = exp_w8 * d_factor * s_decay * r_factor + 1.0;

        let modifier = match rating {
            2 => self.w[15],
            4 => self.w[16],
            _ => 1.0,
        };

        let new_s = stability * growth * modifier;
        new_s.max(0.1).min(self.maximum_interval)
    }

    /// S' = w[11] * D^(-w[12]) * ((S+1)^w[13] - 1) * e^(w[14]*(1-R))
    fn next_stability_forget(&self, stability: f64, difficulty: f64, retrievability: f64) -> f64 {
        let d_factor = difficulty.max(1.0).powf(-self.w[12]);
        let s_factor = (stability + 1.0).powf(self.w[13]) - 1.0;
        let r_factor = (self.w[14] * (1.0 - retrievability)).exp();

        let new_s = self.w[11] * d_factor * s_factor * r_factor;
        // Never exceed previous stability on lapse
        new_s.max(0.1).min(stability)
    }

    /// I = 9 * S * (1/R - 1) where R = request_retention
    fn interval_from_stability(&self, stability: f64) -> f64 {
        let interval = 9.0 * stability * (1.0 / self.request_retention - 1.0);
        interval.max(1.0).min(self.maximum_interval)
    }

    /// Spread intervals of 2.5 days or more over a small window.
    fn fuzz_interval(&self, days: f64) -> f64 {
        if days < 2.5 {
            return days;
        }
        let delta = FUZZ_RANGES
            .iter()
            .map(|&(start, end, factor)| factor * (days.min(end) - start).max(0.0))
            .sum::<f64>()
            + 1.0;
        let min_days = (days - delta).round().max(2.0);
        let max_days = (days + delta).round().min(self.maximum_interval).max(min_days);
        let fuzzed = rand::rng().random_range(min_days..=max_days).round();
        fuzzed.min(self.maximum_interval)
    }
}

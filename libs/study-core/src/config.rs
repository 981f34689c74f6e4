//! Static scheduler configuration.
//!
//! The engine hands this to [`SchedulerAdapter::from_config`] without
//! interpreting it. Only shape checks that hold for any algorithm live here;
//! adapters validate the parameter vector themselves.
//!
//! [`SchedulerAdapter::from_config`]: crate::scheduler::SchedulerAdapter::from_config

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Upper bound for `maximum_interval`, one hundred years.
pub const MAX_INTERVAL_DAYS: u32 = 36500;

/// Scheduler construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Algorithm weights. Empty means "use the adapter's defaults".
    pub parameters: Vec<f64>,
    pub desired_retention: f64,
    /// Learning step durations in seconds.
    pub learning_steps_secs: Vec<u64>,
    /// Relearning step durations in seconds.
    pub relearning_steps_secs: Vec<u64>,
    /// Maximum interval in days.
    pub maximum_interval: u32,
    pub enable_fuzzing: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parameters: Vec::new(),
            desired_retention: 0.9,
            learning_steps_secs: vec![60, 600],
            relearning_steps_secs: vec![600],
            maximum_interval: MAX_INTERVAL_DAYS,
            enable_fuzzing: true,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return Err(ConfigError::DesiredRetention(self.desired_retention));
        }
        if !(1..=MAX_INTERVAL_DAYS).contains(&self.maximum_interval) {
            return Err(ConfigError::MaximumInterval {
                max: MAX_INTERVAL_DAYS,
                actual: self.maximum_interval,
            });
        }
        let longest = u64::from(self.maximum_interval) * 86_400;
        let mut steps = self
            .learning_steps_secs
            .iter()
            .chain(&self.relearning_steps_secs);
        if steps.any(|&secs| secs == 0 || secs > longest) {
            return Err(ConfigError::Steps);
        }
        Ok(())
    }
}

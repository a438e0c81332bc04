//! Trial configuration and recorded results.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RateUndefinedError};

/// Mode-specific trial parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TrialMode {
    /// Stopwatch: simulated time counts up from zero. The pace changes every
    /// `change_interval_secs` real seconds and the clock auto-resets after
    /// `deadline_secs` real seconds.
    CountUp {
        change_interval_secs: f64,
        deadline_secs: f64,
    },
    /// Timer: simulated time counts down from `countdown_secs`. The pace
    /// changes once per completed countdown cycle.
    CountDown { countdown_secs: u32 },
}

/// One trial's immutable configuration, as read from the trial table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    /// 1-indexed trial number from the input table.
    pub trial_num: u32,
    /// Initial rate multiplier. Strictly positive.
    pub base_pace: f64,
    /// Rate delta applied at each scheduled change, in (-1, 1).
    pub increment: f64,
    #[serde(flatten)]
    pub mode: TrialMode,
}

impl TrialConfig {
    /// Check the invariants every trial row must satisfy: all numeric fields
    /// finite, `base_pace > 0`, increment within (-1, 1), durations positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.trial_num;
        if !self.base_pace.is_finite() {
            return Err(ConfigError::NonFinite {
                trial_num: n,
                field: "base_pace",
            });
        }
        if self.base_pace <= 0.0 {
            return Err(ConfigError::NonPositiveBasePace {
                trial_num: n,
                value: self.base_pace,
            });
        }
        if !self.increment.is_finite() {
            return Err(ConfigError::NonFinite {
                trial_num: n,
                field: "add_increment",
            });
        }
        if self.increment <= -1.0 || self.increment >= 1.0 {
            return Err(ConfigError::IncrementOutOfRange {
                trial_num: n,
                value: self.increment,
            });
        }
        match self.mode {
            TrialMode::CountUp {
                change_interval_secs,
                deadline_secs,
            } => {
                if !change_interval_secs.is_finite() {
                    return Err(ConfigError::NonFinite {
                        trial_num: n,
                        field: "frequency_of_change",
                    });
                }
                if change_interval_secs <= 0.0 {
                    return Err(ConfigError::NonPositive {
                        trial_num: n,
                        field: "frequency_of_change",
                    });
                }
                if !deadline_secs.is_finite() {
                    return Err(ConfigError::NonFinite {
                        trial_num: n,
                        field: "stop_time",
                    });
                }
                if deadline_secs <= 0.0 {
                    return Err(ConfigError::NonPositive {
                        trial_num: n,
                        field: "stop_time",
                    });
                }
            }
            TrialMode::CountDown { countdown_secs } => {
                if countdown_secs == 0 {
                    return Err(ConfigError::NonPositive {
                        trial_num: n,
                        field: "countdown_time",
                    });
                }
            }
        }
        Ok(())
    }
}

/// The values frozen when the operator marks a running trial.
///
/// Fields not applicable to the trial's mode are `None`; so is the cycle
/// count when the increment makes it underivable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkRecord {
    /// Simulated seconds elapsed at the mark (count-up only).
    pub simulated_secs: Option<f64>,
    /// Rate in effect at the mark.
    pub pace: f64,
    /// How many countdown cycles the current rate implies, including the
    /// base-pace one (count-down only).
    pub cycles_completed: Option<f64>,
    /// Real seconds one full countdown takes at the marked pace
    /// (count-down only).
    pub elapsed_secs: Option<f64>,
}

/// Derive the cycle count from the marked pace: how many increments took
/// `base_pace` to `pace`, plus one for the base-pace cycle.
pub fn cycles_from_pace(
    pace: f64,
    base_pace: f64,
    increment: f64,
) -> Result<f64, RateUndefinedError> {
    if increment == 0.0 {
        return Err(RateUndefinedError::ZeroIncrement);
    }
    Ok((pace - base_pace) / increment + 1.0)
}

/// One exported row: the trial's configuration plus its mark, if the trial
/// was ever marked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    pub config: TrialConfig,
    pub mark: Option<MarkRecord>,
}

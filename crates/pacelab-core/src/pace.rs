use serde::{Deserialize, Serialize};

/// Smallest rate the schedule will accept. Candidate rates at or below this
/// floor are rejected so the clock can never stall or run backwards.
pub const RATE_FLOOR: f64 = 1e-4;

/// Piecewise-constant pace schedule.
///
/// Holds the rate multiplier currently applied to real elapsed time and the
/// rule for how it evolves: each `advance()` adds the configured increment,
/// subject to the [`RATE_FLOOR`] clamp. The schedule is pure state -- it has
/// no timing side effects and is driven entirely by the sequencer's scheduled
/// rate-change actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaceSchedule {
    base_pace: f64,
    increment: f64,
    rate: f64,
}

impl PaceSchedule {
    /// Create a schedule starting at `base_pace`.
    ///
    /// Callers validate inputs beforehand (`TrialConfig::validate`); this
    /// constructor assumes `base_pace > 0` and a finite increment.
    pub fn new(base_pace: f64, increment: f64) -> Self {
        Self {
            base_pace,
            increment,
            rate: base_pace,
        }
    }

    pub fn current_rate(&self) -> f64 {
        self.rate
    }

    pub fn base_pace(&self) -> f64 {
        self.base_pace
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Apply one scheduled rate change.
    ///
    /// The candidate rate is `rate + increment`. Candidates at or below the
    /// floor leave the rate unchanged; there is no upper clamp, so positive
    /// increments may grow the rate without bound. Returns the rate in effect
    /// afterwards.
    pub fn advance(&mut self) -> f64 {
        let candidate = self.rate + self.increment;
        if candidate > RATE_FLOOR {
            self.rate = candidate;
        }
        self.rate
    }

    /// Restore the starting rate.
    pub fn reset_to_base(&mut self) {
        self.rate = self.base_pace;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_adds_increment() {
        let mut pace = PaceSchedule::new(1.0, 0.1);
        assert!((pace.advance() - 1.1).abs() < 1e-12);
        assert!((pace.advance() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn negative_increment_clamps_at_floor() {
        // 1.0 -> 0.7 -> 0.4 -> 0.1, then 0.1 - 0.3 <= floor so the rate holds.
        let mut pace = PaceSchedule::new(1.0, -0.3);
        pace.advance();
        pace.advance();
        pace.advance();
        assert!((pace.current_rate() - 0.1).abs() < 1e-12);
        pace.advance();
        assert!((pace.current_rate() - 0.1).abs() < 1e-12);
        assert!(pace.current_rate() > RATE_FLOOR);
    }

    #[test]
    fn no_upper_clamp() {
        let mut pace = PaceSchedule::new(1.0, 0.9);
        for _ in 0..100 {
            pace.advance();
        }
        assert!(pace.current_rate() > 90.0);
    }

    #[test]
    fn reset_restores_base() {
        let mut pace = PaceSchedule::new(1.5, 0.2);
        pace.advance();
        pace.advance();
        pace.reset_to_base();
        assert!((pace.current_rate() - 1.5).abs() < 1e-12);
    }
}

//! Variable-rate virtual clock.
//!
//! The clock maps real (wall-clock) elapsed time to simulated elapsed time
//! running at the pace schedule's current rate. It operates on caller-supplied
//! epoch-millisecond timestamps -- no internal threads, no ambient reads of
//! the system clock -- so every transition is deterministic under test.
//!
//! Simulated time is accumulated per run segment: `start` anchors a segment,
//! and `fold` commits `(now - anchor) * rate` into the accumulator before
//! re-anchoring. A rate change must fold **before** the rate mutates, so the
//! segment that just ended is charged at the rate that was actually in effect;
//! [`VirtualClock::advance_pace`] enforces that ordering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InvalidStateError;
use crate::pace::PaceSchedule;

/// Variable-rate clock over one pace schedule.
///
/// Invariant: `segment_start_ms.is_some()` exactly while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualClock {
    pace: PaceSchedule,
    /// Simulated seconds accrued from fully-completed run segments.
    accumulated_secs: f64,
    /// Real time (epoch ms) at which the current running segment began.
    segment_start_ms: Option<u64>,
}

impl VirtualClock {
    /// Create a fresh stopped clock at zero simulated time.
    pub fn new(pace: PaceSchedule) -> Self {
        Self {
            pace,
            accumulated_secs: 0.0,
            segment_start_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn running(&self) -> bool {
        self.segment_start_ms.is_some()
    }

    pub fn pace(&self) -> &PaceSchedule {
        &self.pace
    }

    pub fn current_rate(&self) -> f64 {
        self.pace.current_rate()
    }

    /// Simulated seconds elapsed so far.
    ///
    /// Read-only projection: the accumulator plus, while running, the current
    /// segment's contribution at the current rate. Does not mutate state.
    pub fn current_simulated_secs(&self, now_ms: u64) -> f64 {
        match self.segment_start_ms {
            Some(anchor) => {
                self.accumulated_secs
                    + real_secs_between(anchor, now_ms) * self.pace.current_rate()
            }
            None => self.accumulated_secs,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a run segment at `now_ms`.
    pub fn start(&mut self, now_ms: u64) -> Result<(), InvalidStateError> {
        if self.running() {
            return Err(InvalidStateError::StartWhileRunning);
        }
        self.segment_start_ms = Some(now_ms);
        debug!(now_ms, rate = self.pace.current_rate(), "clock started");
        Ok(())
    }

    /// Commit the current segment's simulated time and re-anchor at `now_ms`.
    ///
    /// No-op while stopped. Used by rate-change processing (to charge the
    /// ended segment at the old rate) and by `stop`.
    pub fn fold(&mut self, now_ms: u64) {
        if let Some(anchor) = self.segment_start_ms {
            self.accumulated_secs +=
                real_secs_between(anchor, now_ms) * self.pace.current_rate();
            self.segment_start_ms = Some(now_ms);
        }
    }

    /// Fold, then clear the running state.
    pub fn stop(&mut self, now_ms: u64) -> Result<(), InvalidStateError> {
        if !self.running() {
            return Err(InvalidStateError::StopWhileStopped);
        }
        self.fold(now_ms);
        self.segment_start_ms = None;
        debug!(
            now_ms,
            accumulated_secs = self.accumulated_secs,
            "clock stopped"
        );
        Ok(())
    }

    /// Apply a scheduled rate change at `now_ms`.
    ///
    /// Folds first so the elapsed portion of the running segment is charged
    /// at the outgoing rate, then advances the pace schedule. Returns the
    /// rate in effect afterwards.
    pub fn advance_pace(&mut self, now_ms: u64) -> f64 {
        self.fold(now_ms);
        let rate = self.pace.advance();
        debug!(now_ms, rate, "pace advanced");
        rate
    }

    /// Restore the pace schedule's starting rate.
    pub fn reset_pace(&mut self) {
        self.pace.reset_to_base();
    }

    /// Zero the accumulator. The caller must stop the clock first.
    pub fn reset(&mut self) -> Result<(), InvalidStateError> {
        if self.running() {
            return Err(InvalidStateError::ResetWhileRunning);
        }
        self.accumulated_secs = 0.0;
        Ok(())
    }
}

fn real_secs_between(start_ms: u64, end_ms: u64) -> f64 {
    end_ms.saturating_sub(start_ms) as f64 / 1000.0
}

/// Current wall-clock time in epoch milliseconds, for hosts driving the
/// engine in real time.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Render simulated elapsed time as `HH:MM:SS.CC` (centisecond precision).
pub fn format_elapsed(secs: f64) -> String {
    let total_centis = (secs.max(0.0) * 100.0) as u64;
    let centis = total_centis % 100;
    let total_secs = total_centis / 100;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// Render remaining countdown time as `HH:MM:SS`.
pub fn format_countdown(remaining_secs: u64) -> String {
    let hours = remaining_secs / 3600;
    let minutes = (remaining_secs % 3600) / 60;
    let seconds = remaining_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clock(base: f64, inc: f64) -> VirtualClock {
        VirtualClock::new(PaceSchedule::new(base, inc))
    }

    #[test]
    fn one_segment_accumulates_at_rate() {
        let mut c = clock(2.0, 0.0);
        c.start(1_000).unwrap();
        assert!((c.current_simulated_secs(4_000) - 6.0).abs() < 1e-9);
        c.stop(4_000).unwrap();
        assert!((c.current_simulated_secs(9_999) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn start_while_running_fails() {
        let mut c = clock(1.0, 0.1);
        c.start(0).unwrap();
        assert_eq!(c.start(5), Err(InvalidStateError::StartWhileRunning));
    }

    #[test]
    fn stop_while_stopped_fails() {
        let mut c = clock(1.0, 0.1);
        assert_eq!(c.stop(0), Err(InvalidStateError::StopWhileStopped));
    }

    #[test]
    fn reset_requires_stopped() {
        let mut c = clock(1.0, 0.1);
        c.start(0).unwrap();
        assert_eq!(c.reset(), Err(InvalidStateError::ResetWhileRunning));
        c.stop(3_000).unwrap();
        c.reset().unwrap();
        assert_eq!(c.current_simulated_secs(3_000), 0.0);
        assert!(!c.running());
    }

    #[test]
    fn pause_resume_preserves_accumulated_time() {
        let mut c = clock(1.0, 0.0);
        c.start(0).unwrap();
        c.stop(2_000).unwrap();
        // Paused for 10 real seconds; no simulated time accrues.
        c.start(12_000).unwrap();
        assert!((c.current_simulated_secs(15_000) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn advance_pace_folds_old_rate_first() {
        let mut c = clock(1.0, 0.1);
        c.start(0).unwrap();
        // 5 s at 1.0 folded before the rate becomes 1.1.
        let rate = c.advance_pace(5_000);
        assert!((rate - 1.1).abs() < 1e-12);
        assert!((c.current_simulated_secs(7_000) - 7.2).abs() < 1e-9);
    }

    #[test]
    fn fold_is_idempotent_for_reads() {
        let mut c = clock(1.3, 0.0);
        c.start(0).unwrap();
        c.fold(4_000);
        let a = c.current_simulated_secs(4_000);
        c.fold(4_000);
        let b = c.current_simulated_secs(4_000);
        assert_eq!(a, b);
    }

    #[test]
    fn format_elapsed_centis() {
        assert_eq!(format_elapsed(0.0), "00:00:00.00");
        assert_eq!(format_elapsed(7.2), "00:00:07.20");
        assert_eq!(format_elapsed(3661.5), "01:01:01.50");
    }

    #[test]
    fn format_countdown_hms() {
        assert_eq!(format_countdown(5), "00:00:05");
        assert_eq!(format_countdown(3725), "01:02:05");
    }

    proptest! {
        // Within a single run segment, simulated time is linear in real time.
        #[test]
        fn segment_linearity(
            rate in 0.01f64..10.0,
            start in 0u64..1_000_000,
            d1 in 0u64..100_000,
            d2 in 0u64..100_000,
        ) {
            let mut c = clock(rate, 0.0);
            c.start(start).unwrap();
            let t1 = start + d1;
            let t2 = t1 + d2;
            let delta = c.current_simulated_secs(t2) - c.current_simulated_secs(t1);
            let expected = (d2 as f64 / 1000.0) * rate;
            prop_assert!((delta - expected).abs() < 1e-6);
        }

        // Reads are monotonically non-decreasing while running.
        #[test]
        fn running_reads_monotonic(
            rate in 0.01f64..10.0,
            times in proptest::collection::vec(0u64..1_000_000, 1..20),
        ) {
            let mut sorted = times.clone();
            sorted.sort_unstable();
            let mut c = clock(rate, 0.0);
            c.start(0).unwrap();
            let mut last = 0.0f64;
            for t in sorted {
                let v = c.current_simulated_secs(t);
                prop_assert!(v >= last);
                last = v;
            }
        }
    }
}

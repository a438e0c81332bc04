use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trial::MarkRecord;

/// Every state change in the engine produces an Event.
///
/// The host prints or logs them; the engine itself never prints. Timestamps
/// are derived from the caller-supplied `now`, never from the ambient wall
/// clock, so event streams are reproducible under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TrialSelected {
        index: usize,
        trial_num: u32,
        at: DateTime<Utc>,
    },
    ClockStarted {
        trial_num: u32,
        rate: f64,
        at: DateTime<Utc>,
    },
    PaceChanged {
        rate: f64,
        at: DateTime<Utc>,
    },
    /// The count-up deadline fired: the clock auto-reset to zero and the
    /// pace returned to base.
    DeadlineReset {
        trial_num: u32,
        at: DateTime<Utc>,
    },
    /// One simulated second elapsed in count-down mode.
    CountdownTick {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// A full countdown finished; `rate` is the pace the next cycle will
    /// run at.
    CycleCompleted {
        rate: f64,
        at: DateTime<Utc>,
    },
    Marked {
        trial_num: u32,
        record: MarkRecord,
        at: DateTime<Utc>,
    },
    TrialReset {
        trial_num: u32,
        at: DateTime<Utc>,
    },
}

/// Convert a caller-supplied epoch-millisecond timestamp into the event
/// timestamp representation.
pub(crate) fn at(now_ms: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_ms as i64).unwrap_or_default()
}

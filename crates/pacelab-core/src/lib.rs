//! # Pacelab Core Library
//!
//! Engine for an experimental timing instrument whose perceived rate of time
//! passage is deliberately manipulated. The instrument is either a stopwatch
//! (count-up, pace changes on a wall-clock schedule, auto-reset deadline) or
//! a countdown timer (count-down, pace changes once per completed cycle);
//! both share one engine shape.
//!
//! ## Architecture
//!
//! - **Variable-rate clock**: maps real elapsed time to simulated time at a
//!   piecewise-constant rate, accumulated per run segment. Wall-clock-driven
//!   state machine in the host-calls-`tick()` style -- no internal threads,
//!   no blocking sleeps, every operation takes an explicit timestamp.
//! - **Pace schedule**: the current rate and its evolution rule (increment
//!   with a positive floor).
//! - **Event scheduler**: due-time queue of cancellable deferred actions
//!   (periodic pace changes, the auto-reset deadline, countdown steps).
//! - **Trial sequencer**: ordered trial configurations, navigation with the
//!   boundary clamp, mark recording, result export.
//!
//! ## Key Components
//!
//! - [`VirtualClock`]: segment-folding variable-rate clock
//! - [`PaceSchedule`]: rate state and increment rule
//! - [`EventScheduler`]: cancellable deferred actions
//! - [`TrialSequencer`]: trial state machine and result recording

pub mod clock;
pub mod error;
pub mod events;
pub mod pace;
pub mod scheduler;
pub mod sequencer;
pub mod trial;

pub use clock::{format_countdown, format_elapsed, now_ms, VirtualClock};
pub use error::{ConfigError, EngineError, InvalidStateError, RateUndefinedError};
pub use events::Event;
pub use pace::{PaceSchedule, RATE_FLOOR};
pub use scheduler::{EventScheduler, Fired, Handle};
pub use sequencer::TrialSequencer;
pub use trial::{MarkRecord, TrialConfig, TrialMode, TrialReport};

//! Trial sequencing and scheduled-action processing.
//!
//! The sequencer owns the active clock, pace schedule, and scheduler for one
//! trial at a time, and is the only component that wires them together. It is
//! host-driven: every command takes the current real time in epoch
//! milliseconds, and the host calls [`TrialSequencer::tick`] periodically to
//! process due scheduled actions.
//!
//! Due actions are processed at their *due* time, not the tick time. A tick
//! that arrives late replays the intervening rate changes exactly as a prompt
//! host would have seen them, so simulated time is never charged to the wrong
//! rate.

use tracing::{debug, warn};

use crate::clock::{format_countdown, format_elapsed, VirtualClock};
use crate::error::{ConfigError, EngineError, InvalidStateError};
use crate::events::{at, Event};
use crate::pace::PaceSchedule;
use crate::scheduler::{EventScheduler, Handle};
use crate::trial::{cycles_from_pace, MarkRecord, TrialConfig, TrialMode, TrialReport};

/// Deferred actions the sequencer arms on the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Periodic rate change (count-up mode). Re-armed on fire.
    PaceChange,
    /// One-shot auto-reset deadline (count-up mode).
    Deadline,
    /// One simulated second of countdown (count-down mode).
    Step,
}

/// State machine over the configured trials.
///
/// `Idle(selected) -> Running -> {MarkedAndIdle | AutoReset -> Idle}`;
/// navigation or reset while running discards the in-flight measurement
/// without recording.
#[derive(Debug)]
pub struct TrialSequencer {
    trials: Vec<TrialConfig>,
    current: usize,
    clock: VirtualClock,
    scheduler: EventScheduler<Action>,
    marks: Vec<Option<MarkRecord>>,
    /// Countdown steps remaining in the current cycle (count-down mode).
    steps_left: u32,
    pace_change: Option<Handle>,
    deadline: Option<Handle>,
    step: Option<Handle>,
}

impl TrialSequencer {
    /// Build a sequencer over a validated, non-empty trial list and select
    /// the first trial.
    pub fn new(trials: Vec<TrialConfig>) -> Result<Self, ConfigError> {
        if trials.is_empty() {
            return Err(ConfigError::EmptyTrialTable);
        }
        for trial in &trials {
            trial.validate()?;
        }
        let marks = vec![None; trials.len()];
        let mut seq = Self {
            current: 0,
            clock: VirtualClock::new(PaceSchedule::new(
                trials[0].base_pace,
                trials[0].increment,
            )),
            scheduler: EventScheduler::new(),
            marks,
            steps_left: 0,
            pace_change: None,
            deadline: None,
            step: None,
            trials,
        };
        seq.load_trial(0);
        Ok(seq)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_trial(&self) -> &TrialConfig {
        &self.trials[self.current]
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    pub fn running(&self) -> bool {
        self.clock.running()
    }

    pub fn current_rate(&self) -> f64 {
        self.clock.current_rate()
    }

    pub fn current_simulated_secs(&self, now_ms: u64) -> f64 {
        self.clock.current_simulated_secs(now_ms)
    }

    /// Label for the active trial, as shown by the host.
    pub fn trial_label(&self) -> String {
        format!("Trial {}", self.current_trial().trial_num)
    }

    /// Render-ready clock face: `HH:MM:SS.CC` counting up, `HH:MM:SS`
    /// counting down. Recomputed from the clock on every call.
    pub fn render(&self, now_ms: u64) -> String {
        match self.current_trial().mode {
            TrialMode::CountUp { .. } => {
                format_elapsed(self.clock.current_simulated_secs(now_ms))
            }
            TrialMode::CountDown { countdown_secs } => {
                let sim = self.clock.current_simulated_secs(now_ms).floor() as u64;
                format_countdown(u64::from(countdown_secs).saturating_sub(sim))
            }
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Select a trial by requested index, applying the boundary clamp:
    /// indices past either end land on the second-to-last trial. Discards
    /// any in-flight run.
    pub fn select(&mut self, requested: i64, now_ms: u64) -> Event {
        let idx = clamp_index(requested, self.trials.len());
        self.load_trial(idx);
        Event::TrialSelected {
            index: idx,
            trial_num: self.current_trial().trial_num,
            at: at(now_ms),
        }
    }

    /// Select a trial by exact index, failing instead of clamping.
    pub fn select_exact(&mut self, index: usize, now_ms: u64) -> Result<Event, ConfigError> {
        if index >= self.trials.len() {
            return Err(ConfigError::TrialOutOfRange {
                index,
                len: self.trials.len(),
            });
        }
        self.load_trial(index);
        Ok(Event::TrialSelected {
            index,
            trial_num: self.current_trial().trial_num,
            at: at(now_ms),
        })
    }

    pub fn next(&mut self, now_ms: u64) -> Event {
        self.select(self.current as i64 + 1, now_ms)
    }

    pub fn previous(&mut self, now_ms: u64) -> Event {
        self.select(self.current as i64 - 1, now_ms)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the active trial's clock and arm the mode's scheduled actions.
    ///
    /// Count-up starts resume from the accumulated simulated time (a marked
    /// or stopped stopwatch continues where it left off); count-down starts
    /// always begin a fresh full cycle at the current pace.
    pub fn start(&mut self, now_ms: u64) -> Result<Event, EngineError> {
        if self.clock.running() {
            return Err(InvalidStateError::StartWhileRunning.into());
        }
        if let TrialMode::CountDown { countdown_secs } = self.current_trial().mode {
            self.clock.reset().ok();
            self.steps_left = countdown_secs;
        }
        self.clock.start(now_ms)?;
        match self.current_trial().mode {
            TrialMode::CountUp {
                change_interval_secs,
                deadline_secs,
            } => {
                self.pace_change = Some(self.scheduler.schedule_periodic(
                    now_ms,
                    secs_to_ms(change_interval_secs),
                    Action::PaceChange,
                ));
                self.deadline = Some(self.scheduler.schedule_once(
                    now_ms,
                    secs_to_ms(deadline_secs),
                    Action::Deadline,
                ));
            }
            TrialMode::CountDown { .. } => {
                self.step = Some(self.scheduler.schedule_once(
                    now_ms,
                    step_delay_ms(self.clock.current_rate()),
                    Action::Step,
                ));
            }
        }
        Ok(Event::ClockStarted {
            trial_num: self.current_trial().trial_num,
            rate: self.clock.current_rate(),
            at: at(now_ms),
        })
    }

    /// Process every scheduled action due by `now_ms`, in due order.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(fired) = self.scheduler.pop_due(now_ms) {
            let due = fired.due_ms;
            match fired.action {
                Action::PaceChange => {
                    // Fold before the rate mutates: the ended segment is
                    // charged at the outgoing rate.
                    let rate = self.clock.advance_pace(due);
                    if let TrialMode::CountUp {
                        change_interval_secs,
                        ..
                    } = self.current_trial().mode
                    {
                        self.pace_change = Some(self.scheduler.schedule_periodic(
                            due,
                            secs_to_ms(change_interval_secs),
                            Action::PaceChange,
                        ));
                    }
                    events.push(Event::PaceChanged { rate, at: at(due) });
                }
                Action::Deadline => {
                    self.halt_clock(due);
                    self.clock.reset_pace();
                    self.cancel_scheduled();
                    debug!(due, "deadline fired, clock auto-reset");
                    events.push(Event::DeadlineReset {
                        trial_num: self.current_trial().trial_num,
                        at: at(due),
                    });
                }
                Action::Step => {
                    self.steps_left = self.steps_left.saturating_sub(1);
                    if self.steps_left > 0 {
                        self.step = Some(self.scheduler.schedule_once(
                            due,
                            step_delay_ms(self.clock.current_rate()),
                            Action::Step,
                        ));
                        events.push(Event::CountdownTick {
                            remaining_secs: self.steps_left,
                            at: at(due),
                        });
                    } else {
                        // Full cycle complete: the once-per-cycle rate change.
                        self.halt_clock(due);
                        let rate = self.clock.advance_pace(due);
                        if let TrialMode::CountDown { countdown_secs } =
                            self.current_trial().mode
                        {
                            self.steps_left = countdown_secs;
                        }
                        self.step = None;
                        events.push(Event::CycleCompleted { rate, at: at(due) });
                    }
                }
            }
        }
        events
    }

    /// Freeze and record the running trial.
    ///
    /// Stops the clock (folding pending elapsed time), cancels all scheduled
    /// actions, and writes the active trial's output row. Marking the same
    /// trial again on a later run overwrites the row.
    pub fn mark(&mut self, now_ms: u64) -> Result<Event, EngineError> {
        if !self.clock.running() {
            return Err(InvalidStateError::MarkWhileStopped.into());
        }
        let trial = *self.current_trial();
        let pace = self.clock.current_rate();
        let record = match trial.mode {
            TrialMode::CountUp { .. } => MarkRecord {
                simulated_secs: Some(self.clock.current_simulated_secs(now_ms)),
                pace,
                cycles_completed: None,
                elapsed_secs: None,
            },
            TrialMode::CountDown { countdown_secs } => {
                let cycles = match cycles_from_pace(pace, trial.base_pace, trial.increment) {
                    Ok(cycles) => Some(cycles),
                    Err(err) => {
                        warn!(trial_num = trial.trial_num, %err, "cycle count unavailable");
                        None
                    }
                };
                MarkRecord {
                    simulated_secs: None,
                    pace,
                    cycles_completed: cycles,
                    elapsed_secs: Some(f64::from(countdown_secs) / pace),
                }
            }
        };
        self.clock.stop(now_ms)?;
        self.cancel_scheduled();
        self.marks[self.current] = Some(record);
        Ok(Event::Marked {
            trial_num: trial.trial_num,
            record,
            at: at(now_ms),
        })
    }

    /// Return the active trial to its idle starting state, discarding any
    /// in-flight run: clock zeroed, pace back to base, actions cancelled.
    pub fn reset(&mut self, now_ms: u64) -> Event {
        self.cancel_scheduled();
        self.halt_clock(now_ms);
        self.clock.reset_pace();
        if let TrialMode::CountDown { countdown_secs } = self.current_trial().mode {
            self.steps_left = countdown_secs;
        }
        Event::TrialReset {
            trial_num: self.current_trial().trial_num,
            at: at(now_ms),
        }
    }

    /// The full ordered result table, one row per trial. Trials never marked
    /// carry no record.
    pub fn export(&self) -> Vec<TrialReport> {
        self.trials
            .iter()
            .zip(&self.marks)
            .map(|(config, mark)| TrialReport {
                config: *config,
                mark: *mark,
            })
            .collect()
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Replace the active clock/pace/scheduler with a fresh set for `idx`.
    /// The previous trial's in-flight state is dropped wholesale.
    fn load_trial(&mut self, idx: usize) {
        let cfg = self.trials[idx];
        self.current = idx;
        self.clock = VirtualClock::new(PaceSchedule::new(cfg.base_pace, cfg.increment));
        self.scheduler.clear();
        self.pace_change = None;
        self.deadline = None;
        self.step = None;
        self.steps_left = match cfg.mode {
            TrialMode::CountDown { countdown_secs } => countdown_secs,
            TrialMode::CountUp { .. } => 0,
        };
        debug!(trial_num = cfg.trial_num, "trial loaded");
    }

    /// Stop and zero the clock; no-op on the stop if already stopped.
    fn halt_clock(&mut self, now_ms: u64) {
        if self.clock.running() {
            self.clock.stop(now_ms).ok();
        }
        self.clock.reset().ok();
    }

    fn cancel_scheduled(&mut self) {
        if let Some(h) = self.pace_change.take() {
            self.scheduler.cancel(h);
        }
        if let Some(h) = self.deadline.take() {
            self.scheduler.cancel(h);
        }
        if let Some(h) = self.step.take() {
            self.scheduler.cancel(h);
        }
    }
}

/// Boundary policy for trial navigation: requests past either end land on
/// the second-to-last trial (saturating at the first for a single-trial
/// table).
fn clamp_index(requested: i64, len: usize) -> usize {
    debug_assert!(len > 0);
    if requested >= 0 && (requested as usize) < len {
        requested as usize
    } else {
        len.saturating_sub(2)
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

/// Real delay between countdown steps: one simulated second at the current
/// rate.
fn step_delay_ms(rate: f64) -> u64 {
    (1000.0 / rate).round() as u64
}

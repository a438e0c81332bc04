//! Core error types for pacelab-core.
//!
//! This module defines the error hierarchy using thiserror. The engine has
//! three failure families: contract violations on the clock state machine,
//! invalid trial configuration, and the one derived quantity that can be
//! mathematically undefined.

use thiserror::Error;

/// Core error type for pacelab-core.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Clock/sequencer state-machine contract violations
    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidStateError),

    /// Trial configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Derived-field errors
    #[error("Rate derivation error: {0}")]
    RateUndefined(#[from] RateUndefinedError),

    /// IO errors (host boundary)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Programming-contract violations on the clock state machine.
///
/// These are surfaced to the caller and never recovered internally; the
/// engine state is unchanged when one is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateError {
    /// `start` called while the clock is already running
    #[error("clock is already running")]
    StartWhileRunning,

    /// `stop` called while the clock is stopped
    #[error("clock is not running")]
    StopWhileStopped,

    /// `reset` called without stopping first
    #[error("clock must be stopped before reset")]
    ResetWhileRunning,

    /// `mark` called while the clock is stopped
    #[error("cannot mark: clock is not running")]
    MarkWhileStopped,
}

/// Trial configuration errors, surfaced before a trial can be selected.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric field is NaN or infinite
    #[error("field '{field}' of trial {trial_num} is not finite")]
    NonFinite { trial_num: u32, field: &'static str },

    /// `base_pace` must be strictly positive
    #[error("base_pace of trial {trial_num} must be > 0, got {value}")]
    NonPositiveBasePace { trial_num: u32, value: f64 },

    /// `add_increment` must lie in the open interval (-1, 1)
    #[error("add_increment of trial {trial_num} must be in (-1, 1), got {value}")]
    IncrementOutOfRange { trial_num: u32, value: f64 },

    /// A duration field must be strictly positive
    #[error("field '{field}' of trial {trial_num} must be > 0")]
    NonPositive { trial_num: u32, field: &'static str },

    /// The trial table has no rows
    #[error("trial table is empty")]
    EmptyTrialTable,

    /// Explicit trial selection outside the configured range
    #[error("trial index {index} out of range (have {len} trials)")]
    TrialOutOfRange { index: usize, len: usize },

    /// Failed to parse the trial table
    #[error("failed to parse {path} (line {line}): {message}")]
    ParseFailed {
        path: String,
        line: usize,
        message: String,
    },

    /// The trial table header is missing a required column
    #[error("missing column '{column}' in {path}")]
    MissingColumn { path: String, column: &'static str },

    /// Failed to load host settings
    #[error("failed to load settings from {path}: {message}")]
    SettingsLoadFailed { path: String, message: String },
}

/// The cycle-count derivation divides by `add_increment`; with a zero
/// increment the count is undefined and the field is reported as unavailable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUndefinedError {
    #[error("cycle count is undefined when add_increment is 0")]
    ZeroIncrement,
}

/// Result type alias for EngineError
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

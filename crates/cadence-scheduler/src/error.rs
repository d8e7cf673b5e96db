use cadence_clock::ClockError;
use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A queue item declared no usable priority (absent or NaN).
    #[error("An item without a priority cannot be added to the queue")]
    MissingPriority,

    /// Repeat intervals must be finite and strictly positive.
    #[error("Invalid repeat interval: {interval}")]
    InvalidInterval { interval: f64 },

    /// A time field of an event spec is not a number.
    #[error("Invalid {field}: {value}")]
    InvalidTime { field: &'static str, value: f64 },

    /// The clock the scheduler should bind to could not be built.
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

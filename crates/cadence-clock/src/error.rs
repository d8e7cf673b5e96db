use thiserror::Error;

/// Errors raised while constructing or driving a clock.
#[derive(Debug, Error)]
pub enum ClockError {
    /// Tick rates must be finite and strictly positive.
    #[error("Invalid clock rate: {rate}")]
    InvalidRate { rate: f64 },

    /// The tick relay thread could not be started.
    #[error("Failed to spawn tick relay thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClockError>;

/// Shared rate check used by every clock constructor.
pub(crate) fn check_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(ClockError::InvalidRate { rate })
    }
}

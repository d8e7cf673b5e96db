use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClockError, Result};

/// One notification from a clock: the time it was taken and the clock rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Clock time in seconds.
    pub time: f64,
    /// Ticks per second at the moment of the tick.
    pub rate: f64,
}

impl Tick {
    pub fn new(time: f64, rate: f64) -> Self {
        Self { time, rate }
    }

    /// Seconds covered by this tick; the scheduler's dispatch window.
    pub fn duration(&self) -> f64 {
        1.0 / self.rate
    }
}

/// A time source a scheduler binds to.
///
/// `time()` must be monotonic for the lifetime of the clock. How ticks are
/// produced (manual stepping, frame callbacks, timers, threads) is up to the
/// implementation and whoever drives it.
pub trait Clock: Send {
    /// Current time in seconds.
    fn time(&self) -> f64;

    /// Nominal ticks per second. Not guaranteed to be precise for realtime clocks.
    fn rate(&self) -> f64;

    /// Nominal seconds between ticks.
    fn tick_duration(&self) -> f64 {
        1.0 / self.rate()
    }

    /// Advance or sample the clock and return the resulting tick.
    fn tick(&mut self) -> Tick;

    fn start(&mut self) {}

    fn stop(&mut self) {}

    /// Whether the clock currently produces ticks. Stopped clocks are skipped
    /// by `Scheduler::advance`.
    fn is_running(&self) -> bool {
        true
    }
}

/// Wall-clock period between ticks at `rate`.
///
/// Fails with [`ClockError::InvalidRate`] when the period is not representable
/// as a non-zero [`Duration`]: rates so high the period rounds to zero, or so
/// low it overflows.
pub fn tick_period(rate: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(1.0 / rate) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(ClockError::InvalidRate { rate }),
    }
}

//! Manually stepped clock for offline rendering and tests.

use crate::clock::{Clock, Tick};
use crate::error::{check_rate, Result};

/// Decimal places kept after each step (1e-14 s resolution).
const ROUNDING_SCALE: f64 = 1e14;

/// Tracks time relatively, without reference to any real time source.
///
/// Each `tick()` advances the clock by exactly one tick duration. Whoever owns
/// the clock (an offline frame or audio renderer, a test) decides when to tick.
#[derive(Debug, Clone)]
pub struct OfflineClock {
    time: f64,
    rate: f64,
    tick_duration: f64,
}

impl OfflineClock {
    /// Create a clock at time zero ticking `rate` times per second.
    pub fn new(rate: f64) -> Result<Self> {
        let rate = check_rate(rate)?;
        Ok(Self {
            time: 0.0,
            rate,
            tick_duration: 1.0 / rate,
        })
    }

    /// Start the clock at an arbitrary time instead of zero.
    pub fn starting_at(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}

/// Repeated float addition drifts (0.1 + 0.1 + 0.1 != 0.3); snap each step.
fn round(time: f64) -> f64 {
    (time * ROUNDING_SCALE).round() / ROUNDING_SCALE
}

impl Clock for OfflineClock {
    fn time(&self) -> f64 {
        self.time
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn tick_duration(&self) -> f64 {
        self.tick_duration
    }

    fn tick(&mut self) -> Tick {
        self.time = round(self.time + self.tick_duration);
        Tick::new(self.time, self.rate)
    }
}

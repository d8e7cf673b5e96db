//! Clocks backed by the monotonic system clock.

use std::time::Instant;

use tracing::debug;

use crate::clock::{Clock, Tick};
use crate::error::{check_rate, Result};

/// Tracks time based on the system's monotonic clock.
///
/// Time is measured in seconds since the clock was created. The rate is the
/// nominal frequency of whatever drives `tick()`; it sizes the scheduler's
/// dispatch window but is not enforced here.
#[derive(Debug, Clone)]
pub struct RealtimeClock {
    origin: Instant,
    rate: f64,
    /// Time of the most recent tick.
    last_tick: f64,
}

impl RealtimeClock {
    pub fn new(rate: f64) -> Result<Self> {
        Ok(Self {
            origin: Instant::now(),
            rate: check_rate(rate)?,
            last_tick: 0.0,
        })
    }

    /// Time at which the most recent tick was sampled.
    pub fn last_tick(&self) -> f64 {
        self.last_tick
    }

    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Clock for RealtimeClock {
    fn time(&self) -> f64 {
        self.now()
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn tick(&mut self) -> Tick {
        self.last_tick = self.now();
        Tick::new(self.last_tick, self.rate)
    }
}

/// A realtime clock ticked once per rendered frame by a host render loop.
///
/// The rate should match the refresh rate of the display. A stopped frame
/// clock reports `is_running() == false` so the scheduler ignores frames
/// delivered while it is stopped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    inner: RealtimeClock,
    running: bool,
    frames: u64,
}

impl FrameClock {
    pub fn new(rate: f64) -> Result<Self> {
        Ok(Self {
            inner: RealtimeClock::new(rate)?,
            running: false,
            frames: 0,
        })
    }

    /// Number of ticks taken since the clock was created.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Clock for FrameClock {
    fn time(&self) -> f64 {
        self.inner.time()
    }

    fn rate(&self) -> f64 {
        self.inner.rate()
    }

    fn tick(&mut self) -> Tick {
        self.frames += 1;
        self.inner.tick()
    }

    fn start(&mut self) {
        debug!(rate = self.inner.rate(), "frame clock started");
        self.running = true;
    }

    fn stop(&mut self) {
        debug!(frames = self.frames, "frame clock stopped");
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_time_is_monotonic() {
        let mut clock = RealtimeClock::new(100.0).unwrap();
        let a = clock.tick().time;
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = clock.tick().time;
        assert!(b > a);
        assert_eq!(clock.last_tick(), b);
        assert!(clock.time() >= b);
    }

    #[test]
    fn realtime_reports_nominal_rate() {
        let mut clock = RealtimeClock::new(50.0).unwrap();
        assert_eq!(clock.tick().rate, 50.0);
        assert_eq!(clock.tick_duration(), 0.02);
    }

    #[test]
    fn frame_clock_start_stop() {
        let mut clock = FrameClock::new(60.0).unwrap();
        assert!(!clock.is_running());
        clock.start();
        assert!(clock.is_running());
        clock.tick();
        clock.tick();
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn realtime_rejects_zero_rate() {
        assert!(RealtimeClock::new(0.0).is_err());
        assert!(FrameClock::new(0.0).is_err());
    }
}

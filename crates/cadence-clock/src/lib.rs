//! `cadence-clock`: time sources that drive a cadence scheduler.
//!
//! # Overview
//!
//! A [`Clock`] exposes a current time, a tick rate and a `tick()` that
//! samples (or advances) the clock and returns the [`Tick`] notification the
//! scheduler dispatches against.
//!
//! | Clock            | Time source                                   |
//! |------------------|-----------------------------------------------|
//! | [`OfflineClock`]  | Relative; advanced by `1/rate` per tick       |
//! | [`RealtimeClock`] | Monotonic system time since construction      |
//! | [`FrameClock`]    | Realtime, ticked once per rendered frame      |
//!
//! [`TickRelay`] runs a background thread that paces tick signals for a
//! realtime clock. [`IntervalLogger`] records the spacing between ticks.

pub mod clock;
pub mod error;
pub mod logger;
pub mod offline;
pub mod realtime;
pub mod relay;

pub use clock::{tick_period, Clock, Tick};
pub use error::{ClockError, Result};
pub use logger::{IntervalLogger, IntervalStats};
pub use offline::OfflineClock;
pub use realtime::{FrameClock, RealtimeClock};
pub use relay::{RelayStop, TickRelay};

use cadence_core::{ClockConfig, ClockKind};

/// Build the clock described by `config`.
pub fn clock_from_config(config: &ClockConfig) -> Result<Box<dyn Clock>> {
    let rate = config.effective_rate();
    let clock: Box<dyn Clock> = match config.kind {
        ClockKind::Offline => Box::new(OfflineClock::new(rate)?),
        ClockKind::Realtime => Box::new(RealtimeClock::new(rate)?),
        ClockKind::Frame => Box::new(FrameClock::new(rate)?),
    };
    tracing::debug!(kind = ?config.kind, rate, "clock built from config");
    Ok(clock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_selects_clock_and_rate() {
        let config = ClockConfig {
            kind: ClockKind::Frame,
            rate: None,
        };
        let clock = clock_from_config(&config).unwrap();
        assert_eq!(clock.rate(), 60.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn config_with_bad_rate_fails() {
        let config = ClockConfig {
            kind: ClockKind::Offline,
            rate: Some(-1.0),
        };
        assert!(matches!(
            clock_from_config(&config),
            Err(ClockError::InvalidRate { .. })
        ));
    }
}

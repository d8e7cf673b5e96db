//! Loops that feed clock ticks into a [`Scheduler`].
//!
//! [`run`] paces ticks with a tokio interval timer; [`run_relayed`] waits on
//! a [`TickRelay`] thread. Both leave the actual time reading to the
//! scheduler's bound clock.

use cadence_clock::{tick_period, TickRelay};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::engine::Scheduler;
use crate::error::Result;

/// Drive `scheduler` from a timer firing once per tick duration of its clock.
///
/// Runs until `shutdown` broadcasts `true` (or its sender is dropped), then
/// stops the clock and hands the scheduler back. Fails before starting the
/// clock if its rate has no usable timer period.
pub async fn run(
    mut scheduler: Scheduler,
    mut shutdown: watch::Receiver<bool>,
) -> Result<Scheduler> {
    let period = tick_period(scheduler.clock().rate())?;
    info!(period_ms = period.as_secs_f64() * 1000.0, "scheduler driver started");

    scheduler.start();
    let mut interval = tokio::time::interval(period);
    // A late tick is dispatched once; the window catches up on overdue events.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if scheduler.advance().is_some() {
                    ticks += 1;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    scheduler.stop();
    info!(ticks, pending = scheduler.pending(), "scheduler driver shutting down");
    Ok(scheduler)
}

/// Drive `scheduler` from a relay thread until the relay stops.
///
/// Blocks the calling thread. Returns the number of ticks taken.
pub fn run_relayed(scheduler: &mut Scheduler, relay: &TickRelay) -> u64 {
    info!(rate = relay.rate(), "relayed scheduler driver started");
    scheduler.start();

    let mut ticks: u64 = 0;
    while relay.wait() {
        if scheduler.advance().is_some() {
            ticks += 1;
        }
    }

    scheduler.stop();
    info!(ticks, "relayed scheduler driver finished");
    ticks
}

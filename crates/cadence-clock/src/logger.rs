//! Tick-interval logging.
//!
//! Records the time between successive ticks so the realtime behaviour of a
//! clock can be analysed afterwards, e.g. to tell whether a frame clock is
//! dropping frames. The logger is a passive observer; it never affects
//! dispatch.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::warn;

use crate::clock::Tick;

#[derive(Debug)]
struct LogState {
    capacity: usize,
    last_tick_time: Option<f64>,
    tick_count: u64,
    last_interval: f64,
    intervals: Vec<f32>,
    overflow_reported: bool,
}

/// Summary of the logged intervals, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Bounded interval recorder. Clones share the same log, so one clone can be
/// registered as a tick listener while another is read afterwards.
#[derive(Debug, Clone)]
pub struct IntervalLogger {
    state: Arc<Mutex<LogState>>,
}

impl IntervalLogger {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(LogState {
                capacity,
                last_tick_time: None,
                tick_count: 0,
                last_interval: 0.0,
                intervals: Vec::with_capacity(capacity),
                overflow_reported: false,
            })),
        }
    }

    /// Record one tick. The first tick only establishes the reference time.
    pub fn log(&self, tick: &Tick) {
        let mut state = self.state.lock().expect("interval log poisoned");
        let Some(last) = state.last_tick_time.replace(tick.time) else {
            return;
        };

        state.tick_count += 1;
        state.last_interval = tick.time - last;

        if state.intervals.len() < state.capacity {
            let interval = state.last_interval as f32;
            state.intervals.push(interval);
        } else if !state.overflow_reported {
            state.overflow_reported = true;
            warn!(
                capacity = state.capacity,
                "interval log full; further intervals are counted but not stored"
            );
        }
    }

    /// Number of intervals observed (ticks after the first).
    pub fn tick_count(&self) -> u64 {
        self.state.lock().expect("interval log poisoned").tick_count
    }

    /// Most recent interval, or `0.0` before two ticks have been seen.
    pub fn last_interval(&self) -> f64 {
        self.state.lock().expect("interval log poisoned").last_interval
    }

    /// Copy of the stored intervals, oldest first.
    pub fn intervals(&self) -> Vec<f32> {
        self.state
            .lock()
            .expect("interval log poisoned")
            .intervals
            .clone()
    }

    /// Min / max / mean over the stored intervals; `None` when nothing is stored.
    pub fn stats(&self) -> Option<IntervalStats> {
        let state = self.state.lock().expect("interval log poisoned");
        if state.intervals.is_empty() {
            return None;
        }

        let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for &interval in &state.intervals {
            let interval = f64::from(interval);
            min = min.min(interval);
            max = max.max(interval);
            sum += interval;
        }

        Some(IntervalStats {
            count: state.intervals.len(),
            min,
            max,
            mean: sum / state.intervals.len() as f64,
        })
    }
}

//! Background-thread tick pacing.
//!
//! A relay thread sleeps for one tick duration at a time and posts a signal
//! over a channel after each sleep. The receiving side (usually the thread
//! that owns the scheduler) wakes on each signal and samples its own realtime
//! clock, so the relay only decides *when* ticks happen, never their time.
//!
//! At most one signal is held for the receiver. A signal due while the
//! previous one is still unread is dropped, so a stalled receiver resumes
//! with a single tick rather than a burst.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::clock::tick_period;
use crate::error::{check_rate, Result};

/// Cloneable handle that stops a [`TickRelay`] from any thread.
#[derive(Debug, Clone)]
pub struct RelayStop {
    flag: Arc<AtomicBool>,
}

impl RelayStop {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Paces tick signals from a dedicated thread.
pub struct TickRelay {
    rate: f64,
    rx: Receiver<()>,
    stop: RelayStop,
    handle: Option<JoinHandle<()>>,
}

impl TickRelay {
    /// Spawn the relay thread, posting `rate` signals per second.
    pub fn spawn(rate: f64) -> Result<Self> {
        let rate = check_rate(rate)?;
        let period = tick_period(rate)?;
        let (tx, rx) = mpsc::sync_channel(1);
        let stop = RelayStop {
            flag: Arc::new(AtomicBool::new(false)),
        };

        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("cadence-tick-relay".to_string())
            .spawn(move || {
                let mut dropped: u64 = 0;
                while !thread_stop.is_stopped() {
                    std::thread::sleep(period);
                    if thread_stop.is_stopped() {
                        break;
                    }
                    match tx.try_send(()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(())) => {
                            dropped += 1;
                            warn!(dropped, "tick relay receiver lagging, signal dropped");
                        }
                        Err(TrySendError::Disconnected(())) => break,
                    }
                }
                debug!(dropped, "tick relay thread exiting");
            })?;

        info!(rate, "tick relay started");
        Ok(Self {
            rate,
            rx,
            stop,
            handle: Some(handle),
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Handle for stopping the relay from elsewhere (e.g. inside a callback).
    pub fn stopper(&self) -> RelayStop {
        self.stop.clone()
    }

    /// Block until the next tick signal. Returns `false` once the relay has stopped.
    pub fn wait(&self) -> bool {
        if self.stop.is_stopped() {
            return false;
        }
        self.rx.recv().is_ok() && !self.stop.is_stopped()
    }

    /// Stop the relay thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.stop.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            info!("tick relay stopped");
        }
    }
}

impl Drop for TickRelay {
    fn drop(&mut self) {
        self.stop();
    }
}

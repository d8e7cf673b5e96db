//! `cadence-scheduler`: clock-driven callback scheduling for time-based media.
//!
//! # Overview
//!
//! Clients register one-shot or repeating events with a time offset. The
//! [`Scheduler`] stores them on a binary min-heap ([`PriorityQueue`]) keyed by
//! absolute due time, and on every clock tick fires all events due within
//! the tick window, in due-time order.
//!
//! # Event kinds
//!
//! | Kind     | Behaviour                                                   |
//! |----------|-------------------------------------------------------------|
//! | `Once`   | Fires one time at `now + offset`, then retires              |
//! | `Repeat` | Fires at `now + offset`, then every `interval` after each actual fire, until `end` |
//!
//! Events due in the past fire on the next tick. Events with equal due times
//! fire in an unspecified order.
//!
//! # Driving
//!
//! Call [`Scheduler::advance`] yourself (offline rendering, frame loops), or
//! use [`driver::run`] (tokio timer) / [`driver::run_relayed`] (relay thread).

pub mod driver;
pub mod engine;
pub mod error;
pub mod queue;
pub mod types;

pub use engine::{Scheduler, TickListener};
pub use error::{Result, SchedulerError};
pub use queue::{Prioritized, PriorityQueue};
pub use types::{Callback, EventId, EventKind, EventRecord, EventSpec};

use std::fmt;

use uuid::Uuid;

use crate::engine::Scheduler;
use crate::queue::Prioritized;

/// Work to run when an event fires. Receives the scheduler (so it can
/// schedule or clear further events) and the current tick time.
pub type Callback = Box<dyn FnMut(&mut Scheduler, f64) + Send>;

/// Handle identifying one scheduled event (UUIDv7, so ids sort by creation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a scheduled event does after it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    /// Fires exactly one time, then retires.
    Once,
    /// Re-arms for `fire time + interval` until a firing happens at or after `end_time`.
    Repeat {
        /// Seconds between successive firings.
        interval: f64,
        /// Absolute time after which the event is no longer re-armed.
        end_time: f64,
    },
}

/// A request to schedule an event, relative to the scheduler's current time.
pub enum EventSpec {
    Once {
        /// Seconds from now. Zero or negative fires on the next tick.
        offset: f64,
        callback: Callback,
    },
    Repeat {
        /// Seconds between firings.
        interval: f64,
        /// Seconds from now until the first firing; defaults to 0.
        offset: Option<f64>,
        /// Seconds from now after which the event stops re-arming; defaults to never.
        end: Option<f64>,
        callback: Callback,
    },
}

impl EventSpec {
    pub fn once<F>(offset: f64, callback: F) -> Self
    where
        F: FnMut(&mut Scheduler, f64) + Send + 'static,
    {
        EventSpec::Once {
            offset,
            callback: Box::new(callback),
        }
    }

    /// Unbounded repeat starting immediately.
    pub fn repeat<F>(interval: f64, callback: F) -> Self
    where
        F: FnMut(&mut Scheduler, f64) + Send + 'static,
    {
        EventSpec::Repeat {
            interval,
            offset: None,
            end: None,
            callback: Box::new(callback),
        }
    }

    /// Set the offset of the first firing.
    pub fn starting_after(mut self, seconds: f64) -> Self {
        match &mut self {
            EventSpec::Once { offset, .. } => *offset = seconds,
            EventSpec::Repeat { offset, .. } => *offset = Some(seconds),
        }
        self
    }

    /// Bound a repeat: it stops re-arming once it fires at or after
    /// `seconds` from now. Has no effect on a once event.
    pub fn ending_after(mut self, seconds: f64) -> Self {
        if let EventSpec::Repeat { end, .. } = &mut self {
            *end = Some(seconds);
        }
        self
    }
}

impl fmt::Debug for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSpec::Once { offset, .. } => {
                f.debug_struct("Once").field("offset", offset).finish_non_exhaustive()
            }
            EventSpec::Repeat {
                interval,
                offset,
                end,
                ..
            } => f
                .debug_struct("Repeat")
                .field("interval", interval)
                .field("offset", offset)
                .field("end", end)
                .finish_non_exhaustive(),
        }
    }
}

/// A normalized, queued event.
///
/// `priority` is always an absolute due time comparable with clock time. It
/// is advanced in place each time a repeating event is re-armed.
pub struct EventRecord {
    pub(crate) id: EventId,
    pub(crate) kind: EventKind,
    pub(crate) offset: f64,
    pub(crate) priority: f64,
    pub(crate) callback: Callback,
}

impl EventRecord {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Offset from the scheduling moment, as originally requested.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Absolute time at which the event is next due.
    pub fn due_time(&self) -> f64 {
        self.priority
    }

    pub fn is_repeating(&self) -> bool {
        matches!(self.kind, EventKind::Repeat { .. })
    }
}

impl Prioritized for EventRecord {
    fn priority(&self) -> Option<f64> {
        Some(self.priority)
    }
}

/// Records are compared by identity, never by contents.
impl PartialEq for EventRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecord")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

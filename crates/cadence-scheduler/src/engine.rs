use cadence_clock::{clock_from_config, Clock, Tick};
use cadence_core::ClockConfig;
use tracing::{debug, trace, warn};

use crate::{
    error::{Result, SchedulerError},
    queue::PriorityQueue,
    types::{EventId, EventKind, EventRecord, EventSpec},
};

/// Observer notified of every tick the scheduler takes from its clock.
pub type TickListener = Box<dyn FnMut(&Tick) + Send>;

/// Clock-driven callback scheduler.
///
/// Turns relative scheduling requests into absolute due times on a private
/// [`PriorityQueue`], and on every tick fires everything due within the tick
/// window in ascending due-time order.
pub struct Scheduler {
    clock: Box<dyn Clock>,
    queue: PriorityQueue<EventRecord>,
    /// Repeats fired during the current tick, waiting to go back into the queue.
    rearmed: Vec<EventRecord>,
    listeners: Vec<TickListener>,
}

impl Scheduler {
    /// Bind a new scheduler to `clock`.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_clock(Box::new(clock))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            queue: PriorityQueue::new(),
            rearmed: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Build the configured clock and bind a scheduler to it.
    pub fn from_config(config: &ClockConfig) -> Result<Self> {
        Ok(Self::with_clock(clock_from_config(config)?))
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current time of the bound clock.
    pub fn now(&self) -> f64 {
        self.clock.time()
    }

    // --- scheduling --------------------------------------------------------

    /// Schedule one event relative to the clock's current time.
    ///
    /// Returns the id to pass to [`Scheduler::clear`].
    pub fn schedule(&mut self, spec: EventSpec) -> Result<EventId> {
        let record = normalize(spec, self.now())?;
        self.enqueue(record)
    }

    /// Schedule several events against the same clock reading.
    ///
    /// Every spec is validated before any is queued, so an invalid spec leaves
    /// the scheduler unchanged.
    pub fn schedule_all<I>(&mut self, specs: I) -> Result<Vec<EventId>>
    where
        I: IntoIterator<Item = EventSpec>,
    {
        let now = self.now();
        let records = specs
            .into_iter()
            .map(|spec| normalize(spec, now))
            .collect::<Result<Vec<_>>>()?;
        records.into_iter().map(|r| self.enqueue(r)).collect()
    }

    /// Fire `callback` once, `delay` seconds from now.
    pub fn once<F>(&mut self, delay: f64, callback: F) -> Result<EventId>
    where
        F: FnMut(&mut Scheduler, f64) + Send + 'static,
    {
        self.schedule(EventSpec::once(delay, callback))
    }

    /// Fire `callback` now and then every `interval` seconds, without end.
    pub fn repeat<F>(&mut self, interval: f64, callback: F) -> Result<EventId>
    where
        F: FnMut(&mut Scheduler, f64) + Send + 'static,
    {
        self.schedule(EventSpec::repeat(interval, callback))
    }

    /// Cancel a pending event. Unknown, already-fired or currently-firing
    /// events are ignored. Returns whether anything was removed.
    pub fn clear(&mut self, id: EventId) -> bool {
        let removed = self.queue.remove_where(|r| r.id == id).is_some() || {
            let before = self.rearmed.len();
            self.rearmed.retain(|r| r.id != id);
            self.rearmed.len() < before
        };
        if removed {
            debug!(event_id = %id, "event cleared");
        }
        removed
    }

    /// Cancel every pending event.
    pub fn clear_all(&mut self) {
        let count = self.pending();
        self.queue.clear();
        self.rearmed.clear();
        debug!(count, "all events cleared");
    }

    // --- inspection --------------------------------------------------------

    /// Number of events waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.len() + self.rearmed.len()
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a pending event.
    pub fn get(&self, id: EventId) -> Option<&EventRecord> {
        self.queue
            .iter()
            .chain(self.rearmed.iter())
            .find(|r| r.id == id)
    }

    /// Due time of the most urgent pending event, including repeats re-armed
    /// during the tick in progress.
    pub fn next_due(&self) -> Option<f64> {
        self.queue
            .peek()
            .into_iter()
            .chain(self.rearmed.iter())
            .map(EventRecord::due_time)
            .reduce(f64::min)
    }

    // --- driving -----------------------------------------------------------

    /// Register an observer for every tick taken by [`Scheduler::advance`].
    pub fn on_tick<F>(&mut self, listener: F)
    where
        F: FnMut(&Tick) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn start(&mut self) {
        self.clock.start();
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Take one tick from the bound clock and dispatch against it.
    ///
    /// Returns `None` without touching the queue when the clock is stopped.
    pub fn advance(&mut self) -> Option<Tick> {
        if !self.clock.is_running() {
            return None;
        }

        let tick = self.clock.tick();
        for listener in &mut self.listeners {
            listener(&tick);
        }
        self.tick(tick.time, tick.duration());
        Some(tick)
    }

    /// Fire every event due at or before `time + window`, in due-time order.
    ///
    /// Callbacks receive `time` even when their nominal due time lies later in
    /// the window. Repeats re-arm relative to `time` (the actual fire time),
    /// and are held back until the drain finishes so a repeat can fire at
    /// most once per tick. Returns the number of callbacks invoked.
    pub fn tick(&mut self, time: f64, window: f64) -> usize {
        let max_time = time + window;
        let mut fired = 0;

        // Peek fresh each iteration: callbacks may schedule or clear events.
        while self.queue.peek().is_some_and(|next| next.priority <= max_time) {
            let Some(mut event) = self.queue.pop() else {
                break;
            };

            trace!(event_id = %event.id, due = event.priority, time, "firing event");
            (event.callback)(self, time);
            fired += 1;

            match event.kind {
                EventKind::Repeat { interval, end_time } if end_time > time => {
                    event.priority = time + interval;
                    self.rearmed.push(event);
                }
                EventKind::Repeat { .. } => {
                    debug!(event_id = %event.id, time, "repeat reached its end");
                }
                EventKind::Once => {}
            }
        }

        for event in std::mem::take(&mut self.rearmed) {
            let id = event.id;
            if let Err(e) = self.queue.push(event) {
                warn!(event_id = %id, "failed to re-arm repeating event: {e}");
            }
        }

        if fired > 0 {
            trace!(time, window, fired, pending = self.queue.len(), "tick dispatched");
        }
        fired
    }

    fn enqueue(&mut self, record: EventRecord) -> Result<EventId> {
        let id = record.id;
        let (kind, due) = (record.kind, record.priority);
        self.queue.push(record)?;
        debug!(event_id = %id, kind = ?kind, due, "event scheduled");
        Ok(id)
    }
}

/// Validate `spec` and resolve its relative times against `now`.
fn normalize(spec: EventSpec, now: f64) -> Result<EventRecord> {
    let (kind, offset, callback) = match spec {
        EventSpec::Once { offset, callback } => (EventKind::Once, offset, callback),
        EventSpec::Repeat {
            interval,
            offset,
            end,
            callback,
        } => {
            if !interval.is_finite() || interval <= 0.0 {
                return Err(SchedulerError::InvalidInterval { interval });
            }
            let end_time = match end {
                Some(end) if end.is_nan() => {
                    return Err(SchedulerError::InvalidTime {
                        field: "end",
                        value: end,
                    })
                }
                Some(end) => end + now,
                None => f64::INFINITY,
            };
            (
                EventKind::Repeat { interval, end_time },
                offset.unwrap_or(0.0),
                callback,
            )
        }
    };

    if offset.is_nan() {
        return Err(SchedulerError::InvalidTime {
            field: "offset",
            value: offset,
        });
    }

    Ok(EventRecord {
        id: EventId::new(),
        kind,
        offset,
        priority: now + offset,
        callback,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use cadence_clock::OfflineClock;

    use super::*;

    type Log = Arc<Mutex<Vec<(&'static str, f64, usize)>>>;

    /// Callback that records (name, tick time, pending count at fire time).
    fn recorder(log: &Log, name: &'static str) -> impl FnMut(&mut Scheduler, f64) + Send + 'static {
        let log = Arc::clone(log);
        move |s: &mut Scheduler, time| log.lock().unwrap().push((name, time, s.pending()))
    }

    fn scheduler_at(rate: f64) -> Scheduler {
        Scheduler::new(OfflineClock::new(rate).unwrap())
    }

    fn fired(log: &Log) -> Vec<(&'static str, f64)> {
        log.lock().unwrap().iter().map(|&(n, t, _)| (n, t)).collect()
    }

    #[test]
    fn new_scheduler_is_empty() {
        let s = scheduler_at(10.0);
        assert_eq!(s.pending(), 0);
        assert_eq!(s.next_due(), None);
        assert_eq!(s.now(), 0.0);
    }

    #[test]
    fn once_fires_exactly_once_within_window() {
        let log = Log::default();
        let mut s = scheduler_at(0.1); // ticks every 10s
        s.once(20.0, recorder(&log, "only")).unwrap();
        assert_eq!(s.next_due(), Some(20.0));

        for _ in 0..5 {
            s.advance();
        }

        // The tick at 10 covers [10, 20], so the event fires there.
        assert_eq!(*log.lock().unwrap(), vec![("only", 10.0, 0)]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn events_fire_in_due_order() {
        let log = Log::default();
        let mut s = scheduler_at(10.0);
        s.once(41.0, recorder(&log, "c")).unwrap();
        s.once(10.0, recorder(&log, "a")).unwrap();
        s.once(20.0, recorder(&log, "b")).unwrap();

        for t in [10.0, 20.0, 30.0, 40.0, 50.0] {
            s.tick(t, 10.0);
        }
        assert_eq!(fired(&log), vec![("a", 10.0), ("b", 10.0), ("c", 40.0)]);
    }

    #[test]
    fn repeat_fires_every_interval_from_actual_fire_time() {
        let log = Log::default();
        let mut s = Scheduler::new(OfflineClock::new(1.0).unwrap().starting_at(10.0));
        s.repeat(20.0, recorder(&log, "r")).unwrap();

        for t in [10.0, 30.0, 50.0, 70.0, 90.0] {
            s.tick(t, 20.0);
        }
        let times: Vec<f64> = fired(&log).into_iter().map(|(_, t)| t).collect();
        assert_eq!(times, vec![10.0, 30.0, 50.0, 70.0, 90.0]);
        assert_eq!(s.pending(), 1);
        assert_eq!(s.next_due(), Some(110.0));
    }

    #[test]
    fn bounded_repeat_stops_after_end_time() {
        let log = Log::default();
        let mut s = scheduler_at(0.1);
        s.schedule(EventSpec::repeat(10.0, recorder(&log, "thrice")).ending_after(20.0))
            .unwrap();

        for t in [0.0, 10.0, 20.0, 30.0, 40.0] {
            s.tick(t, 10.0);
        }
        let times: Vec<f64> = fired(&log).into_iter().map(|(_, t)| t).collect();
        assert_eq!(times, vec![0.0, 10.0, 20.0]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn tick_drains_everything_in_window() {
        let mut s = scheduler_at(1.0);
        for delay in [0.5, 1.0, 1.5, 2.0, 2.5, 3.0] {
            s.once(delay, |_, _| {}).unwrap();
        }
        assert_eq!(s.tick(0.0, 2.0), 4);
        assert_eq!(s.next_due(), Some(2.5));
        assert_eq!(s.pending(), 2);
    }

    #[test]
    fn past_due_events_fire_on_next_tick() {
        let log = Log::default();
        let mut s = scheduler_at(1.0);
        s.once(-5.0, recorder(&log, "late")).unwrap();
        s.tick(0.0, 0.0);
        assert_eq!(fired(&log), vec![("late", 0.0)]);
    }

    #[test]
    fn repeat_shorter_than_window_fires_once_per_tick() {
        let log = Log::default();
        let mut s = scheduler_at(1.0);
        s.repeat(0.25, recorder(&log, "fast")).unwrap();

        assert_eq!(s.tick(0.0, 1.0), 1);
        assert_eq!(s.next_due(), Some(0.25));
        assert_eq!(s.tick(1.0, 1.0), 1);
        assert_eq!(s.next_due(), Some(1.25));
        assert_eq!(fired(&log).len(), 2);
    }

    #[test]
    fn clear_removes_pending_event_and_is_idempotent() {
        let log = Log::default();
        let mut s = scheduler_at(1.0);
        let keep = s.once(1.0, recorder(&log, "keep")).unwrap();
        let dropped = s.once(1.0, recorder(&log, "drop")).unwrap();

        assert!(s.clear(dropped));
        assert!(!s.clear(dropped));
        assert!(s.is_pending(keep));
        assert!(!s.is_pending(dropped));

        s.tick(1.0, 0.0);
        assert_eq!(fired(&log), vec![("keep", 1.0)]);
        assert!(!s.clear(keep));
    }

    #[test]
    fn clear_all_empties_queue() {
        let mut s = scheduler_at(1.0);
        s.once(1.0, |_, _| {}).unwrap();
        s.repeat(1.0, |_, _| {}).unwrap();
        s.clear_all();
        assert_eq!(s.pending(), 0);
        assert_eq!(s.tick(100.0, 1.0), 0);
    }

    #[test]
    fn callback_scheduling_is_visible_within_same_tick() {
        let log = Log::default();
        let mut s = scheduler_at(1.0);
        let inner = recorder(&log, "inner");
        let mut inner = Some(inner);
        s.once(0.0, move |s: &mut Scheduler, _| {
            if let Some(cb) = inner.take() {
                s.once(0.5, cb).unwrap();
            }
        })
        .unwrap();

        assert_eq!(s.tick(0.0, 1.0), 2);
        assert_eq!(fired(&log), vec![("inner", 0.0)]);
    }

    #[test]
    fn callback_can_clear_later_event() {
        let log = Log::default();
        let mut s = scheduler_at(1.0);
        let victim = s.once(0.5, recorder(&log, "victim")).unwrap();
        s.once(0.0, move |s: &mut Scheduler, _| {
            s.clear(victim);
        })
        .unwrap();

        assert_eq!(s.tick(0.0, 1.0), 1);
        assert!(fired(&log).is_empty());
    }

    #[test]
    fn clearing_a_firing_repeat_does_not_stop_it() {
        let log = Log::default();
        let own_id: Arc<Mutex<Option<EventId>>> = Arc::default();
        let mut s = scheduler_at(1.0);

        let id_slot = Arc::clone(&own_id);
        let mut record = recorder(&log, "self");
        let id = s
            .repeat(1.0, move |s: &mut Scheduler, time| {
                record(s, time);
                if let Some(id) = *id_slot.lock().unwrap() {
                    assert!(!s.clear(id), "firing record is not in the queue");
                }
            })
            .unwrap();
        *own_id.lock().unwrap() = Some(id);

        for t in [0.0, 1.0, 2.0] {
            s.tick(t, 0.5);
        }
        assert_eq!(fired(&log).len(), 3);
        assert!(s.is_pending(id));

        // Outside a tick the re-armed record is reachable again.
        assert!(s.clear(id));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn later_callback_can_clear_repeat_rearmed_in_same_tick() {
        let log = Log::default();
        let cleared: Arc<Mutex<Option<bool>>> = Arc::default();
        let mut s = scheduler_at(1.0);

        let repeat = s.repeat(1.0, recorder(&log, "repeat")).unwrap();
        let result = Arc::clone(&cleared);
        s.once(0.5, move |s: &mut Scheduler, _| {
            *result.lock().unwrap() = Some(s.clear(repeat));
        })
        .unwrap();

        // The repeat (due 0) fires and is parked before the once (due 0.5) runs.
        assert_eq!(s.tick(0.0, 1.0), 2);
        assert_eq!(*cleared.lock().unwrap(), Some(true));
        assert!(!s.is_pending(repeat));

        for t in [1.0, 2.0, 3.0] {
            assert_eq!(s.tick(t, 1.0), 0);
        }
        assert_eq!(fired(&log), vec![("repeat", 0.0)]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn next_due_sees_repeats_rearmed_in_same_tick() {
        let seen: Arc<Mutex<Option<f64>>> = Arc::default();
        let mut s = scheduler_at(1.0);
        s.repeat(2.0, |_, _| {}).unwrap();
        let slot = Arc::clone(&seen);
        s.once(0.5, move |s: &mut Scheduler, _| {
            *slot.lock().unwrap() = s.next_due();
        })
        .unwrap();

        s.tick(0.0, 1.0);
        assert_eq!(*seen.lock().unwrap(), Some(2.0));
        assert_eq!(s.next_due(), Some(2.0));
    }

    #[test]
    fn enqueue_failure_is_reported() {
        let mut s = scheduler_at(1.0);
        let record = EventRecord {
            id: EventId::new(),
            kind: EventKind::Once,
            offset: 0.0,
            priority: f64::NAN,
            callback: Box::new(|_, _| {}),
        };
        assert!(matches!(
            s.enqueue(record),
            Err(SchedulerError::MissingPriority)
        ));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn clear_all_inside_callback_drops_rearmed_repeats() {
        let mut s = scheduler_at(1.0);
        s.repeat(1.0, |_, _| {}).unwrap();
        s.once(0.0, |s: &mut Scheduler, _| s.clear_all()).unwrap();
        s.tick(0.0, 0.0);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn schedule_all_uses_one_clock_reading() {
        let mut s = scheduler_at(1.0);
        s.advance();
        let ids = s
            .schedule_all([
                EventSpec::once(1.0, |_, _| {}),
                EventSpec::repeat(2.0, |_, _| {}).starting_after(3.0),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(s.get(ids[0]).unwrap().due_time(), 2.0);
        let repeat = s.get(ids[1]).unwrap();
        assert_eq!(repeat.due_time(), 4.0);
        assert_eq!(repeat.offset(), 3.0);
        assert!(repeat.is_repeating());
    }

    #[test]
    fn schedule_all_rejects_batch_atomically() {
        let mut s = scheduler_at(1.0);
        let result = s.schedule_all([
            EventSpec::once(1.0, |_, _| {}),
            EventSpec::repeat(0.0, |_, _| {}),
        ]);
        assert!(matches!(result, Err(SchedulerError::InvalidInterval { .. })));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn end_time_is_absolute_after_scheduling() {
        let mut s = Scheduler::new(OfflineClock::new(1.0).unwrap().starting_at(5.0));
        let id = s
            .schedule(EventSpec::repeat(1.0, |_, _| {}).ending_after(3.0))
            .unwrap();
        match s.get(id).unwrap().kind() {
            EventKind::Repeat { end_time, .. } => assert_eq!(end_time, 8.0),
            EventKind::Once => panic!("expected repeat"),
        }
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let mut s = scheduler_at(1.0);
        assert!(matches!(
            s.once(f64::NAN, |_, _| {}),
            Err(SchedulerError::InvalidTime { field: "offset", .. })
        ));
        assert!(matches!(
            s.repeat(-1.0, |_, _| {}),
            Err(SchedulerError::InvalidInterval { .. })
        ));
        assert!(matches!(
            s.repeat(f64::INFINITY, |_, _| {}),
            Err(SchedulerError::InvalidInterval { .. })
        ));
        assert!(matches!(
            s.schedule(EventSpec::repeat(1.0, |_, _| {}).ending_after(f64::NAN)),
            Err(SchedulerError::InvalidTime { field: "end", .. })
        ));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn advance_notifies_listeners_and_uses_tick_duration() {
        let ticks: Arc<Mutex<Vec<f64>>> = Arc::default();
        let seen = Arc::clone(&ticks);
        let mut s = scheduler_at(10.0);
        s.on_tick(move |tick| seen.lock().unwrap().push(tick.time));
        s.once(0.2, |_, _| {}).unwrap();

        let tick = s.advance().unwrap();
        assert_eq!(tick.time, 0.1);
        // Window [0.1, 0.2] reaches the event at 0.2.
        assert_eq!(s.pending(), 0);
        assert_eq!(*ticks.lock().unwrap(), vec![0.1]);
    }

    #[test]
    fn stopped_clock_does_not_advance() {
        let mut s = Scheduler::new(cadence_clock::FrameClock::new(60.0).unwrap());
        s.once(0.0, |_, _| {}).unwrap();
        assert!(s.advance().is_none());
        assert_eq!(s.pending(), 1);

        s.start();
        assert!(s.advance().is_some());
        assert_eq!(s.pending(), 0);
        s.stop();
        assert!(s.advance().is_none());
    }

    #[test]
    fn from_config_binds_configured_clock() {
        let config = ClockConfig {
            kind: cadence_core::ClockKind::Offline,
            rate: Some(4.0),
        };
        let mut s = Scheduler::from_config(&config).unwrap();
        assert_eq!(s.clock().rate(), 4.0);
        assert_eq!(s.advance().unwrap().time, 0.25);
    }
}

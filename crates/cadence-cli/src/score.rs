//! The demo score: a one-bar drum pattern at 60 bpm.
//!
//! Quarter note = 1 s. Kick on beats 1 and 3, snare on 2 and 4, hihat on
//! every eighth note, and a single splash just after beat 3.

use cadence_scheduler::{EventSpec, Scheduler};
use serde::Serialize;

/// One fired event as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct FireReport {
    pub instrument: &'static str,
    pub time: f64,
}

impl FireReport {
    fn print(&self, json: bool) {
        if json {
            match serde_json::to_string(self) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("failed to encode fire report: {e}"),
            }
        } else {
            println!("{:>10.4}s  {}", self.time, self.instrument);
        }
    }
}

fn hit(instrument: &'static str, json: bool) -> impl FnMut(&mut Scheduler, f64) + Send + 'static {
    move |_: &mut Scheduler, time| FireReport { instrument, time }.print(json)
}

/// Event specs for the drum pattern, relative to the moment they are scheduled.
pub fn drum_pattern(json: bool) -> Vec<EventSpec> {
    vec![
        EventSpec::repeat(2.0, hit("kick", json)),
        EventSpec::repeat(2.0, hit("snare", json)).starting_after(1.0),
        EventSpec::repeat(0.5, hit("hihat", json)),
        EventSpec::once(2.25, hit("splash", json)),
    ]
}

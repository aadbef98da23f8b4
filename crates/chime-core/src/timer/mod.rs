mod queue;

pub use queue::{TimerHandle, TimerQueue};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmTask, SessionId};
use crate::events::Event;

/// Everything the engine can have scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Run one due-reminder poll cycle.
    Poll,
    /// A timer owned by one alarm session; stale once that session has ended.
    Alarm { session: SessionId, task: AlarmTask },
}

pub type Timers = TimerQueue<Task>;

/// Scheduling context handed to whatever is running inside a tick.
pub struct Cx<'a> {
    pub now: DateTime<Utc>,
    pub timers: &'a mut Timers,
    pub events: &'a mut Vec<Event>,
}

impl<'a> Cx<'a> {
    pub fn new(now: DateTime<Utc>, timers: &'a mut Timers, events: &'a mut Vec<Event>) -> Self {
        Self { now, timers, events }
    }

    pub fn after(&mut self, ms: u64, task: Task) -> TimerHandle {
        self.timers.schedule_once(self.now + millis(ms), task)
    }

    pub fn every(&mut self, ms: u64, task: Task) -> TimerHandle {
        self.timers
            .schedule_repeating(self.now + millis(ms), millis(ms), task)
    }

    /// Cancel and clear a handle slot.
    pub fn cancel(&mut self, slot: &mut Option<TimerHandle>) {
        if let Some(handle) = slot.take() {
            self.timers.cancel(handle);
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// Longest delay accepted from configuration (about ten years).
const MAX_DELAY_MS: u64 = 10 * 365 * 24 * 60 * 60 * 1000;

pub(crate) fn millis(ms: u64) -> Duration {
    Duration::milliseconds(ms.min(MAX_DELAY_MS) as i64)
}

//! Due-reminder detection.
//!
//! A reminder is due in a cycle iff `watermark < due_at <= now`, where
//! `watermark` is the `now` of the previous cycle. The window is half-open
//! so a reminder fires exactly once: the cycle after it fires, it is at or
//! below the watermark.
//!
//! The watermark moves only at the end of a cycle. A process that was
//! suspended therefore sees every reminder that came due during the gap on
//! its first cycle after resuming. `missed_grace` optionally drops those
//! that are too stale to be worth ringing for.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::reminder::Reminder;
use crate::storage::PollerConfig;
use crate::timer::millis;

/// Whether `due_at` falls in the `(watermark, now]` window.
pub fn is_due(due_at: DateTime<Utc>, watermark: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    watermark < due_at && due_at <= now
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub now: DateTime<Utc>,
    /// Watermark the window was computed against.
    pub previous_watermark: DateTime<Utc>,
    /// Watermark after the cycle.
    pub watermark: DateTime<Utc>,
    /// Reminders to signal, in store order.
    pub due: Vec<Reminder>,
    /// In the window but older than the grace period.
    pub skipped: Vec<Reminder>,
    /// Datetime could not be parsed; these never fire.
    pub invalid: Vec<Reminder>,
}

#[derive(Debug, Clone)]
pub struct DuePoller {
    watermark: DateTime<Utc>,
    missed_grace: Option<Duration>,
}

impl DuePoller {
    /// A poller whose window opens at `now`: anything already in the past is
    /// not signaled.
    pub fn new(config: &PollerConfig, now: DateTime<Utc>) -> Self {
        Self {
            watermark: now,
            missed_grace: config
                .missed_grace_secs
                .map(|secs| millis(secs.saturating_mul(1000))),
        }
    }

    pub fn with_watermark(mut self, watermark: DateTime<Utc>) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    pub fn missed_grace(&self) -> Option<Duration> {
        self.missed_grace
    }

    /// Run one cycle over a snapshot of the store and advance the watermark.
    pub fn check(&mut self, now: DateTime<Utc>, reminders: &[Reminder]) -> PollReport {
        let previous = self.watermark;
        let mut due = Vec::new();
        let mut skipped = Vec::new();
        let mut invalid = Vec::new();

        for reminder in reminders {
            let Some(due_at) = reminder.due_at() else {
                invalid.push(reminder.clone());
                continue;
            };
            if !is_due(due_at, previous, now) {
                continue;
            }
            match self.missed_grace {
                Some(grace) if now - due_at > grace => skipped.push(reminder.clone()),
                _ => due.push(reminder.clone()),
            }
        }

        if !invalid.is_empty() {
            warn!(count = invalid.len(), "reminders with unparsable datetime ignored");
        }
        if !skipped.is_empty() {
            warn!(count = skipped.len(), "stale reminders skipped after a gap");
        }

        // Never move backwards, even if the wall clock did.
        self.watermark = previous.max(now);
        debug!(
            due = due.len(),
            watermark = %self.watermark,
            "poll cycle"
        );

        PollReport {
            now,
            previous_watermark: previous,
            watermark: self.watermark,
            due,
            skipped,
            invalid,
        }
    }
}

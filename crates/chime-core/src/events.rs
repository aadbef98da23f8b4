use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::{EnvEvent, SessionId, StopReason, StrategyKind};
use crate::reminder::Reminder;

/// Every state change in the scheduler produces an Event.
/// Engine operations return them in the order they happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A reminder entered the `(watermark, now]` window.
    ReminderDue {
        reminder: Reminder,
        at: DateTime<Utc>,
    },
    /// A reminder was in the window but will not fire.
    ReminderSkipped {
        reminder: Reminder,
        reason: String,
        at: DateTime<Utc>,
    },
    /// One poll cycle finished; `watermark` is the new watermark.
    PollCompleted {
        due: usize,
        watermark: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    AlarmStarted {
        session: SessionId,
        text: String,
        at: DateTime<Utc>,
    },
    /// A due reminder was folded into the already-ringing alarm.
    AlarmRetriggered {
        session: SessionId,
        text: String,
        at: DateTime<Utc>,
    },
    StrategyStarted {
        strategy: StrategyKind,
        at: DateTime<Utc>,
    },
    StrategyFailed {
        strategy: StrategyKind,
        error: String,
        at: DateTime<Utc>,
    },
    NotificationSent {
        tag: String,
        at: DateTime<Utc>,
    },
    NotificationFailed {
        tag: String,
        error: String,
        at: DateTime<Utc>,
    },
    /// Environment recovery nudged the audio chain.
    RecoveryAction {
        trigger: EnvEvent,
        action: RecoveryStep,
        at: DateTime<Utc>,
    },
    AlarmStopped {
        session: SessionId,
        reason: StopReason,
        /// Sub-steps that failed; the alarm is stopped regardless.
        errors: Vec<String>,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStep {
    MediaResumed,
    ToneRestarted,
    NoticeSent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let at = Utc::now();
        let json = serde_json::to_value(Event::PollCompleted {
            due: 2,
            watermark: at,
            at,
        })
        .unwrap();
        assert_eq!(json["type"], "PollCompleted");
        assert_eq!(json["due"], 2);

        let json = serde_json::to_value(Event::RecoveryAction {
            trigger: EnvEvent::Hidden,
            action: RecoveryStep::ToneRestarted,
            at,
        })
        .unwrap();
        assert_eq!(json["action"], "tone_restarted");
        assert_eq!(json["trigger"], "hidden");
    }
}

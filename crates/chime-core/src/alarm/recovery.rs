//! Environment recovery.
//!
//! Backgrounding a host tends to pause media and suspend audio output.
//! While an alarm is ringing, visibility and focus transitions are used as
//! a cue to nudge the chain back into making noise. Nothing here changes
//! alarm state.

use tracing::info;

use super::audio::AudioDevices;
use super::session::AlarmSession;
use super::EnvEvent;
use crate::events::{Event, RecoveryStep};
use crate::timer::Cx;

/// What one environment event did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryOutcome {
    pub media_resumed: bool,
    pub tone_started: bool,
    /// The caller should send a "still active" notification.
    pub send_notice: bool,
}

impl RecoveryOutcome {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryMonitor {
    background_notice: bool,
}

impl RecoveryMonitor {
    pub fn new(background_notice: bool) -> Self {
        Self { background_notice }
    }

    pub fn handle(
        &self,
        event: EnvEvent,
        session: &mut AlarmSession,
        cx: &mut Cx<'_>,
        devices: &mut dyn AudioDevices,
    ) -> RecoveryOutcome {
        let mut outcome = RecoveryOutcome::default();
        let Some(chain) = session.chain_mut() else {
            return outcome;
        };

        outcome.media_resumed = chain.resume_media_if_paused();
        if outcome.media_resumed {
            cx.emit(Event::RecoveryAction {
                trigger: event,
                action: RecoveryStep::MediaResumed,
                at: cx.now,
            });
        }

        if event.is_backgrounding() {
            outcome.tone_started = chain.start_tone(cx, devices);
            if outcome.tone_started {
                cx.emit(Event::RecoveryAction {
                    trigger: event,
                    action: RecoveryStep::ToneRestarted,
                    at: cx.now,
                });
            }
            outcome.send_notice = self.background_notice && event == EnvEvent::Hidden;
        }

        if !outcome.is_noop() {
            info!(?event, ?outcome, "alarm recovery");
        }
        outcome
    }
}

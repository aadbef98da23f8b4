//! Alarm delivery: the single active-alarm session, the fallback audio chain
//! and environment recovery.
//!
//! ## State Transitions
//!
//! ```text
//! Inactive -> Active            first due reminder
//! Active   -> Active            further due reminders (coalesced)
//! Active   -> Inactive          dismiss button, Space/Enter/Escape, auto-dismiss timeout
//! ```
//!
//! Everything here runs on the caller's thread inside `AlarmEngine` ticks.
//! Timers carry the id of the session that scheduled them, so a timer that
//! outlives its session is recognized as stale and dropped.

mod audio;
mod chain;
mod host;
mod recovery;
mod session;
mod strategy;

pub use audio::{AudioDevices, MediaElement, MediaSource, OutputState, Tone, ToneSynth, Waveform};
pub use chain::FallbackChain;
pub use host::{Collaborators, Host, Notification, NotificationSink, Overlay};
pub use recovery::{RecoveryMonitor, RecoveryOutcome};
pub use session::{ActiveAlarm, AlarmSession, AlarmState, SessionConfig, StopReport, Trigger};
pub use strategy::{AlertStrategy, EmbeddedMedia, PrimaryMedia, ToneSequence};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one Inactive -> Active -> Inactive run of the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alarm#{}", self.0)
    }
}

/// Timers scheduled on behalf of an alarm session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmTask {
    AutoDismiss,
    MediaRetry,
    MediaKeepAlive,
    ToneBackstop,
    ToneRepeat,
    LowTone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    PrimaryMedia,
    ToneSequence,
    EmbeddedMedia,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::PrimaryMedia => "primary media",
            StrategyKind::ToneSequence => "tone sequence",
            StrategyKind::EmbeddedMedia => "embedded media",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Overlay stop button.
    Dismissed,
    /// Space, Enter or Escape.
    Keyboard,
    /// Auto-dismiss safety valve.
    Timeout,
}

/// Keys the overlay cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
    Escape,
    Other,
}

impl Key {
    pub fn dismisses(self) -> bool {
        matches!(self, Key::Space | Key::Enter | Key::Escape)
    }
}

/// Host visibility and focus transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvEvent {
    Hidden,
    Visible,
    Blurred,
    Focused,
}

impl EnvEvent {
    /// Hidden and Blurred are the transitions that tend to suspend output.
    pub fn is_backgrounding(self) -> bool {
        matches!(self, EnvEvent::Hidden | EnvEvent::Blurred)
    }
}

//! Collaborators outside the audio chain: notifications, the stop overlay and
//! the host application window.

use serde::{Deserialize, Serialize};

use super::audio::AudioDevices;
use crate::error::Result;
use crate::reminder::Reminder;

/// A platform notification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Keep the notification up until the user acts on it.
    pub require_interaction: bool,
    /// Unique per emission so notifications never collapse into one.
    pub tag: String,
}

/// Permission-gated push notifications.
pub trait NotificationSink {
    fn notify(&mut self, notification: &Notification) -> Result<()>;
    /// Close every outstanding notification whose tag starts with `prefix`.
    fn close_by_prefix(&mut self, prefix: &str) -> Result<()>;
}

/// The full-screen "stop alarm" surface.
///
/// There is at most one; the alarm session decides when it appears.
pub trait Overlay {
    fn show(&mut self, reminder: &Reminder) -> Result<()>;
    /// Another reminder fired while the overlay is up.
    fn add_reminder(&mut self, _reminder: &Reminder) -> Result<()> {
        Ok(()) // default no-op
    }
    fn hide(&mut self) -> Result<()>;
}

/// The application hosting the scheduler.
pub trait Host {
    /// Best-effort request to bring the application to the foreground.
    fn focus_app(&mut self) -> Result<()> {
        Ok(()) // default no-op
    }
}

/// Everything the engine calls out to.
pub struct Collaborators {
    pub devices: Box<dyn AudioDevices>,
    pub notifier: Box<dyn NotificationSink>,
    pub overlay: Box<dyn Overlay>,
    pub host: Box<dyn Host>,
}

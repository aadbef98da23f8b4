//! Alarm state machine.
//!
//! Owns the at-most-one active alarm. Start is idempotent (a second due
//! reminder joins the ringing alarm), stop is idempotent and runs every
//! teardown step even when earlier ones fail.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::chain::FallbackChain;
use super::host::Collaborators;
use super::{AlarmTask, Key, SessionId, StopReason};
use crate::events::Event;
use crate::reminder::Reminder;
use crate::storage::{Config, MediaConfig, ToneConfig};
use crate::timer::{Cx, Task, TimerHandle};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub auto_dismiss_secs: u64,
    pub backstop_delay_ms: u64,
    pub tag_prefix: String,
    pub media: MediaConfig,
    pub tone: ToneConfig,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auto_dismiss_secs: config.alarm.auto_dismiss_secs,
            backstop_delay_ms: config.alarm.backstop_delay_ms,
            tag_prefix: config.notifications.tag_prefix.clone(),
            media: config.media.clone(),
            tone: config.tone.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Inactive,
    Active,
}

/// The live alarm: what it is ringing for and everything it holds.
pub struct ActiveAlarm {
    id: SessionId,
    reminders: Vec<Reminder>,
    started_at: DateTime<Utc>,
    chain: FallbackChain,
    auto_dismiss: Option<TimerHandle>,
    notification_tags: Vec<String>,
}

impl ActiveAlarm {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Every reminder folded into this alarm, first trigger first.
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    pub fn auto_dismiss_handle(&self) -> Option<TimerHandle> {
        self.auto_dismiss
    }

    pub fn notification_tags(&self) -> &[String] {
        &self.notification_tags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Inactive -> Active.
    Started(SessionId),
    /// Already ringing; the reminder joined the existing alarm.
    Coalesced(SessionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub session: SessionId,
    pub reason: StopReason,
    /// Teardown steps that failed. The alarm is stopped regardless.
    pub errors: Vec<String>,
}

pub struct AlarmSession {
    config: SessionConfig,
    active: Option<ActiveAlarm>,
    last_id: u64,
}

impl AlarmSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            active: None,
            last_id: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> AlarmState {
        if self.active.is_some() {
            AlarmState::Active
        } else {
            AlarmState::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveAlarm> {
        self.active.as_ref()
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub(crate) fn chain_mut(&mut self) -> Option<&mut FallbackChain> {
        self.active.as_mut().map(|a| &mut a.chain)
    }

    /// Remember a notification sent on behalf of the active alarm.
    pub fn record_notification(&mut self, tag: String) {
        if let Some(active) = self.active.as_mut() {
            active.notification_tags.push(tag);
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn trigger(&mut self, reminder: &Reminder, cx: &mut Cx<'_>, io: &mut Collaborators) -> Trigger {
        if let Some(active) = self.active.as_mut() {
            active.reminders.push(reminder.clone());
            if let Err(e) = io.overlay.add_reminder(reminder) {
                debug!(error = %e, "overlay refresh failed");
            }
            info!(session = %active.id, text = %reminder.text, "reminder joined ringing alarm");
            cx.emit(Event::AlarmRetriggered {
                session: active.id,
                text: reminder.text.clone(),
                at: cx.now,
            });
            return Trigger::Coalesced(active.id);
        }

        self.last_id += 1;
        let id = SessionId(self.last_id);
        info!(session = %id, text = %reminder.text, "alarm started");
        cx.emit(Event::AlarmStarted {
            session: id,
            text: reminder.text.clone(),
            at: cx.now,
        });

        if let Err(e) = io.overlay.show(reminder) {
            warn!(error = %e, "alarm overlay could not be shown");
        }

        let mut chain = FallbackChain::new(
            id,
            self.config.backstop_delay_ms,
            self.config.media.clone(),
            self.config.tone.clone(),
        );
        chain.start(cx, io.devices.as_mut());

        let auto_dismiss = cx.after(
            self.config.auto_dismiss_secs.saturating_mul(1000),
            Task::Alarm {
                session: id,
                task: AlarmTask::AutoDismiss,
            },
        );

        self.active = Some(ActiveAlarm {
            id,
            reminders: vec![reminder.clone()],
            started_at: cx.now,
            chain,
            auto_dismiss: Some(auto_dismiss),
            notification_tags: Vec::new(),
        });
        Trigger::Started(id)
    }

    /// Tear the active alarm down. No-op when nothing is ringing.
    pub fn stop(&mut self, reason: StopReason, cx: &mut Cx<'_>, io: &mut Collaborators) -> Option<StopReport> {
        // Inactive from this point on, whatever the teardown below runs into.
        let mut active = self.active.take()?;
        let mut errors = Vec::new();

        cx.cancel(&mut active.auto_dismiss);
        for (kind, e) in active.chain.stop_all(cx) {
            errors.push(format!("{kind}: {e}"));
        }
        if let Err(e) = io.overlay.hide() {
            errors.push(format!("overlay: {e}"));
        }
        if let Err(e) = io.notifier.close_by_prefix(&self.config.tag_prefix) {
            errors.push(format!("notifications: {e}"));
        }

        for error in &errors {
            warn!(session = %active.id, %error, "alarm teardown step failed");
        }
        info!(session = %active.id, ?reason, "alarm stopped");
        cx.emit(Event::AlarmStopped {
            session: active.id,
            reason,
            errors: errors.clone(),
            at: cx.now,
        });

        Some(StopReport {
            session: active.id,
            reason,
            errors,
        })
    }

    /// Space, Enter and Escape stop a ringing alarm; anything else is ignored.
    pub fn handle_key(&mut self, key: Key, cx: &mut Cx<'_>, io: &mut Collaborators) -> Option<StopReport> {
        if !key.dismisses() {
            return None;
        }
        self.stop(StopReason::Keyboard, cx, io)
    }

    /// Dispatch a timer scheduled by some alarm session.
    ///
    /// Timers from a session that is no longer active are cancelled and
    /// otherwise ignored, so a late auto-dismiss is a no-op.
    pub fn on_timer(
        &mut self,
        session: SessionId,
        task: AlarmTask,
        handle: TimerHandle,
        cx: &mut Cx<'_>,
        io: &mut Collaborators,
    ) {
        if self.active_id() != Some(session) {
            cx.timers.cancel(handle);
            debug!(%session, ?task, "dropping timer from finished alarm");
            return;
        }
        match task {
            AlarmTask::AutoDismiss => {
                self.stop(StopReason::Timeout, cx, io);
            }
            _ => {
                if let Some(chain) = self.chain_mut() {
                    chain.on_timer(task, handle, cx, io.devices.as_mut());
                }
            }
        }
    }
}

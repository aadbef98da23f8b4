//! Scheduler engine.
//!
//! Owns the reminder store, the due-reminder poller, the alarm session and
//! every timer they schedule. Like the rest of the core it has no threads:
//! the caller passes the current time to `tick()` often enough (the CLI
//! uses 100 ms) and forwards keyboard and environment events.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = AlarmEngine::new(config, store, collaborators, Utc::now());
//! engine.start(Utc::now());
//! // In a loop:
//! for event in engine.tick(Utc::now()) { /* log, render */ }
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::alarm::{
    AlarmSession, AlarmState, Collaborators, EnvEvent, Key, Notification, RecoveryMonitor,
    SessionConfig, StopReason,
};
use crate::events::{Event, RecoveryStep};
use crate::poller::{DuePoller, PollReport};
use crate::reminder::Reminder;
use crate::storage::{Config, KvStore, NotificationsConfig, ReminderStore};
use crate::timer::{millis, Cx, Task, TimerHandle, Timers};

pub struct AlarmEngine<S: KvStore> {
    config: Config,
    store: ReminderStore<S>,
    poller: DuePoller,
    session: AlarmSession,
    recovery: RecoveryMonitor,
    timers: Timers,
    io: Collaborators,
    /// Process-wide notification counter; tags are `prefix + n`.
    notification_seq: u64,
    poll_handle: Option<TimerHandle>,
}

impl<S: KvStore> AlarmEngine<S> {
    /// Build an idle engine. Reminders due at or before `now` will not fire.
    pub fn new(config: Config, store: ReminderStore<S>, io: Collaborators, now: DateTime<Utc>) -> Self {
        Self {
            poller: DuePoller::new(&config.poller, now),
            session: AlarmSession::new(SessionConfig::from_config(&config)),
            recovery: RecoveryMonitor::new(config.recovery.background_notice),
            timers: Timers::new(),
            notification_seq: 0,
            poll_handle: None,
            config,
            store,
            io,
        }
    }

    /// Start with an explicit watermark instead of the construction time.
    pub fn with_watermark(mut self, watermark: DateTime<Utc>) -> Self {
        self.poller = self.poller.with_watermark(watermark);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ReminderStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ReminderStore<S> {
        &mut self.store
    }

    pub fn session(&self) -> &AlarmSession {
        &self.session
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.poller.watermark()
    }

    pub fn is_polling(&self) -> bool {
        self.poll_handle.is_some()
    }

    /// Whether an alarm is currently ringing.
    pub fn is_alarm_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.session.state()
    }

    /// When the next timer is due; a driver can sleep until then.
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        self.timers.next_due()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Run an immediate poll cycle and schedule the recurring one.
    ///
    /// Calling it again while polling is a no-op.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        if self.poll_handle.is_some() {
            return events;
        }
        self.run_cycle(now, &mut events);
        let every = millis(self.config.poller.interval_secs.max(1).saturating_mul(1000));
        self.poll_handle = Some(self.timers.schedule_repeating(now + every, every, Task::Poll));
        info!(interval_secs = self.config.poller.interval_secs, "reminder polling started");
        events
    }

    /// Cancel the recurring poll. A ringing alarm keeps ringing.
    pub fn stop_polling(&mut self) {
        if let Some(handle) = self.poll_handle.take() {
            self.timers.cancel(handle);
        }
    }

    /// Fire every timer due at `now`, in due order.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some((handle, task)) = self.timers.pop_due(now) {
            match task {
                Task::Poll => {
                    self.run_cycle(now, &mut events);
                }
                Task::Alarm { session, task } => {
                    let mut cx = Cx::new(now, &mut self.timers, &mut events);
                    self.session.on_timer(session, task, handle, &mut cx, &mut self.io);
                }
            }
        }
        events
    }

    /// Run one poll cycle right away, outside the regular cadence.
    pub fn poll_now(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        self.run_cycle(now, &mut events);
        events
    }

    /// Overlay stop button.
    pub fn dismiss(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        let mut cx = Cx::new(now, &mut self.timers, &mut events);
        self.session.stop(StopReason::Dismissed, &mut cx, &mut self.io);
        events
    }

    pub fn handle_key(&mut self, key: Key, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        let mut cx = Cx::new(now, &mut self.timers, &mut events);
        self.session.handle_key(key, &mut cx, &mut self.io);
        events
    }

    /// Host visibility or focus changed.
    pub fn on_environment(&mut self, event: EnvEvent, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        let mut cx = Cx::new(now, &mut self.timers, &mut events);
        let outcome = self
            .recovery
            .handle(event, &mut self.session, &mut cx, self.io.devices.as_mut());

        if outcome.send_notice {
            let body = self
                .session
                .active()
                .and_then(|a| a.reminders().last())
                .map(|r| r.text.clone())
                .unwrap_or_default();
            let tag = format!(
                "{}background-{}",
                self.config.notifications.tag_prefix,
                next_seq(&mut self.notification_seq)
            );
            let title = self.config.notifications.still_active_title.clone();
            if let Some(tag) = send_notification(
                &mut self.io,
                &self.config.notifications,
                title,
                body,
                tag,
                &mut cx,
            ) {
                cx.emit(Event::RecoveryAction {
                    trigger: event,
                    action: RecoveryStep::NoticeSent,
                    at: now,
                });
                self.session.record_notification(tag);
            }
        }
        events
    }

    /// Store a reminder from a reminder source.
    ///
    /// The poller picks it up on its next cycle.
    pub fn add_reminder(&mut self, reminder: Reminder) -> crate::error::Result<()> {
        self.store.append(reminder)
    }

    fn run_cycle(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) -> PollReport {
        let reminders = self.store.read_all();
        let report = self.poller.check(now, &reminders);
        let mut cx = Cx::new(now, &mut self.timers, events);

        for reminder in &report.skipped {
            cx.emit(Event::ReminderSkipped {
                reminder: reminder.clone(),
                reason: "missed by more than the grace window".into(),
                at: now,
            });
        }

        for reminder in &report.due {
            info!(text = %reminder.text, datetime = %reminder.datetime, "reminder due");
            cx.emit(Event::ReminderDue {
                reminder: reminder.clone(),
                at: now,
            });

            self.session.trigger(reminder, &mut cx, &mut self.io);

            let tag = format!(
                "{}{}",
                self.config.notifications.tag_prefix,
                next_seq(&mut self.notification_seq)
            );
            let title = self.config.notifications.title.clone();
            if let Some(tag) = send_notification(
                &mut self.io,
                &self.config.notifications,
                title,
                reminder.text.clone(),
                tag,
                &mut cx,
            ) {
                self.session.record_notification(tag);
            }

            if let Err(e) = self.io.host.focus_app() {
                debug!(error = %e, "could not bring app to foreground");
            }
        }

        cx.emit(Event::PollCompleted {
            due: report.due.len(),
            watermark: report.watermark,
            at: now,
        });
        report
    }
}

fn next_seq(seq: &mut u64) -> u64 {
    *seq += 1;
    *seq
}

/// Best effort. Returns the tag on success.
fn send_notification(
    io: &mut Collaborators,
    config: &NotificationsConfig,
    title: String,
    body: String,
    tag: String,
    cx: &mut Cx<'_>,
) -> Option<String> {
    if !config.enabled {
        return None;
    }
    let notification = Notification {
        title,
        body,
        icon: config.icon.clone(),
        require_interaction: true,
        tag,
    };
    match io.notifier.notify(&notification) {
        Ok(()) => {
            cx.emit(Event::NotificationSent {
                tag: notification.tag.clone(),
                at: cx.now,
            });
            Some(notification.tag)
        }
        Err(e) => {
            warn!(tag = %notification.tag, error = %e, "notification failed");
            cx.emit(Event::NotificationFailed {
                tag: notification.tag,
                error: e.to_string(),
                at: cx.now,
            });
            None
        }
    }
}

//! Fallback audio chain.
//!
//! Strategies overlap rather than strictly sequence: primary media starts
//! first, a failure falls straight through to the tone sequence (and a tone
//! construction failure to embedded media), and the tone sequence is also
//! scheduled as a backstop shortly after activation no matter what media
//! reported. A success report is not proof of continued audibility.

use tracing::{info, warn};

use super::audio::AudioDevices;
use super::strategy::{AlertStrategy, EmbeddedMedia, PrimaryMedia, ToneSequence};
use super::{AlarmTask, SessionId, StrategyKind};
use crate::error::AudioError;
use crate::events::Event;
use crate::storage::{MediaConfig, ToneConfig};
use crate::timer::{Cx, Task, TimerHandle};

pub struct FallbackChain {
    session: SessionId,
    backstop_delay_ms: u64,
    backstop: Option<TimerHandle>,
    media: PrimaryMedia,
    tone: ToneSequence,
    embedded: EmbeddedMedia,
}

impl FallbackChain {
    pub fn new(
        session: SessionId,
        backstop_delay_ms: u64,
        media: MediaConfig,
        tone: ToneConfig,
    ) -> Self {
        Self {
            session,
            backstop_delay_ms,
            backstop: None,
            media: PrimaryMedia::new(session, media),
            tone: ToneSequence::new(session, tone.clone()),
            embedded: EmbeddedMedia::new(tone),
        }
    }

    pub fn media(&self) -> &PrimaryMedia {
        &self.media
    }

    pub fn tone(&self) -> &ToneSequence {
        &self.tone
    }

    pub fn embedded(&self) -> &EmbeddedMedia {
        &self.embedded
    }

    /// Make noise by any means available.
    pub fn start(&mut self, cx: &mut Cx<'_>, devices: &mut dyn AudioDevices) {
        if Self::try_start(&mut self.media, cx, devices).is_err() {
            self.start_tone(cx, devices);
        }
        let task = Task::Alarm {
            session: self.session,
            task: AlarmTask::ToneBackstop,
        };
        self.backstop = Some(cx.after(self.backstop_delay_ms, task));
    }

    /// Start the tone sequence unless it is already running; fall through to
    /// embedded media if no synthesizer can be built.
    ///
    /// Returns whether a new sequence was started.
    pub fn start_tone(&mut self, cx: &mut Cx<'_>, devices: &mut dyn AudioDevices) -> bool {
        if self.tone.is_running() {
            return false;
        }
        match Self::try_start(&mut self.tone, cx, devices) {
            Ok(()) => true,
            Err(_) => {
                if !self.embedded.is_running() {
                    let _ = Self::try_start(&mut self.embedded, cx, devices);
                }
                false
            }
        }
    }

    fn try_start(
        strategy: &mut dyn AlertStrategy,
        cx: &mut Cx<'_>,
        devices: &mut dyn AudioDevices,
    ) -> Result<(), AudioError> {
        let kind = strategy.kind();
        match strategy.start(cx, devices) {
            Ok(()) => {
                info!(strategy = %kind, "alert strategy started");
                cx.emit(Event::StrategyStarted {
                    strategy: kind,
                    at: cx.now,
                });
                Ok(())
            }
            Err(e) => {
                warn!(strategy = %kind, error = %e, "alert strategy failed, falling through");
                cx.emit(Event::StrategyFailed {
                    strategy: kind,
                    error: e.to_string(),
                    at: cx.now,
                });
                Err(e)
            }
        }
    }

    pub fn on_timer(
        &mut self,
        task: AlarmTask,
        handle: TimerHandle,
        cx: &mut Cx<'_>,
        devices: &mut dyn AudioDevices,
    ) {
        match task {
            AlarmTask::ToneBackstop => {
                self.backstop = None;
                self.start_tone(cx, devices);
            }
            AlarmTask::MediaRetry => {
                self.media.on_timer(task, handle, cx);
                // Out of retries without ever playing: make sure something is audible.
                if !self.media.is_running() {
                    self.start_tone(cx, devices);
                }
            }
            AlarmTask::MediaKeepAlive => self.media.on_timer(task, handle, cx),
            AlarmTask::ToneRepeat | AlarmTask::LowTone => self.tone.on_timer(task, handle, cx),
            AlarmTask::AutoDismiss => {}
        }
    }

    /// Resume primary media if it had been playing and is now paused.
    pub fn resume_media_if_paused(&mut self) -> bool {
        self.media.resume_if_paused()
    }

    /// Halt every strategy, whichever of them actually started.
    ///
    /// Never short-circuits; returns each failure.
    pub fn stop_all(&mut self, cx: &mut Cx<'_>) -> Vec<(StrategyKind, AudioError)> {
        cx.cancel(&mut self.backstop);
        let strategies: [&mut dyn AlertStrategy; 3] =
            [&mut self.media, &mut self.tone, &mut self.embedded];
        let mut failures = Vec::new();
        for strategy in strategies {
            if let Err(e) = strategy.stop(cx) {
                failures.push((strategy.kind(), e));
            }
        }
        failures
    }
}

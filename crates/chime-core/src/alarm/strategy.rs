//! The three alerting strategies.
//!
//! Each owns its own device object and its own timer handles, and clears
//! both the moment it is stopped. Repeating timers check that the device is
//! still held before doing anything and cancel themselves otherwise.

use tracing::{debug, info, warn};

use super::audio::{AudioDevices, MediaElement, MediaSource, OutputState, Tone, ToneSynth};
use super::{AlarmTask, SessionId, StrategyKind};
use crate::error::AudioError;
use crate::events::Event;
use crate::storage::{MediaConfig, ToneConfig};
use crate::timer::{Cx, Task, TimerHandle};
use crate::tone;

/// One interchangeable alerting backend.
pub trait AlertStrategy {
    fn kind(&self) -> StrategyKind;

    /// Start emitting. An error means this strategy is unavailable right now
    /// and the chain should fall through to the next one.
    fn start(&mut self, cx: &mut Cx<'_>, devices: &mut dyn AudioDevices) -> Result<(), AudioError>;

    /// Handle one of this strategy's own timers.
    fn on_timer(&mut self, task: AlarmTask, handle: TimerHandle, cx: &mut Cx<'_>);

    /// Halt output and cancel every timer this strategy holds. Safe to call
    /// whether or not the strategy ever started.
    fn stop(&mut self, cx: &mut Cx<'_>) -> Result<(), AudioError>;

    fn is_running(&self) -> bool;
}

// ── Primary media ────────────────────────────────────────────────────

/// Loops the configured alert asset at full volume.
pub struct PrimaryMedia {
    session: SessionId,
    config: MediaConfig,
    element: Option<Box<dyn MediaElement>>,
    playing: bool,
    retries: Vec<TimerHandle>,
    keep_alive: Option<TimerHandle>,
}

impl PrimaryMedia {
    pub fn new(session: SessionId, config: MediaConfig) -> Self {
        Self {
            session,
            config,
            element: None,
            playing: false,
            retries: Vec::new(),
            keep_alive: None,
        }
    }

    fn task(&self, task: AlarmTask) -> Task {
        Task::Alarm {
            session: self.session,
            task,
        }
    }

    /// Playback has been confirmed at least once.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_paused(&self) -> bool {
        self.element.as_ref().map_or(true, |el| el.is_paused())
    }

    pub fn keep_alive_handle(&self) -> Option<TimerHandle> {
        self.keep_alive
    }

    fn mark_playing(&mut self, cx: &mut Cx<'_>) {
        self.playing = true;
        for handle in self.retries.drain(..) {
            cx.timers.cancel(handle);
        }
        if self.keep_alive.is_none() {
            let task = self.task(AlarmTask::MediaKeepAlive);
            self.keep_alive = Some(cx.every(self.config.keep_alive_ms, task));
        }
    }

    /// Issue a play call if confirmed playback has since been paused.
    ///
    /// Returns whether a resume was attempted.
    pub fn resume_if_paused(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        let Some(element) = self.element.as_mut() else {
            return false;
        };
        if !element.is_paused() {
            return false;
        }
        if let Err(e) = element.play() {
            debug!(error = %e, "alarm media resume failed");
        }
        true
    }
}

impl AlertStrategy for PrimaryMedia {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PrimaryMedia
    }

    fn start(&mut self, cx: &mut Cx<'_>, devices: &mut dyn AudioDevices) -> Result<(), AudioError> {
        if self.element.is_some() {
            return Ok(());
        }
        let asset = self
            .config
            .alert_asset
            .clone()
            .ok_or_else(|| AudioError::Unsupported("no alert asset configured".into()))?;

        let mut element = devices.media_element()?;
        element.load(&MediaSource::File(asset.into()))?;
        element.set_volume(self.config.volume);
        element.set_looping(true);
        let attempt = element.play();
        self.element = Some(element);

        match attempt {
            Ok(()) => {
                self.mark_playing(cx);
                Ok(())
            }
            Err(e) => {
                for ms in self.config.play_retry_ms.clone() {
                    let task = self.task(AlarmTask::MediaRetry);
                    self.retries.push(cx.after(ms, task));
                }
                if self.retries.is_empty() {
                    self.element = None;
                }
                Err(e)
            }
        }
    }

    fn on_timer(&mut self, task: AlarmTask, handle: TimerHandle, cx: &mut Cx<'_>) {
        match task {
            AlarmTask::MediaRetry => {
                self.retries.retain(|h| *h != handle);
                if self.playing {
                    return;
                }
                let Some(element) = self.element.as_mut() else {
                    return;
                };
                match element.play() {
                    Ok(()) => {
                        info!("alarm media started on retry");
                        self.mark_playing(cx);
                        cx.emit(Event::StrategyStarted {
                            strategy: StrategyKind::PrimaryMedia,
                            at: cx.now,
                        });
                    }
                    Err(e) if self.retries.is_empty() => {
                        warn!(error = %e, "alarm media refused on every attempt");
                        self.element = None;
                    }
                    Err(e) => debug!(error = %e, "alarm media retry refused"),
                }
            }
            AlarmTask::MediaKeepAlive => match self.element.as_mut() {
                None => {
                    cx.timers.cancel(handle);
                    self.keep_alive = None;
                }
                Some(element) => {
                    if element.is_paused() {
                        debug!("restarting paused alarm media");
                        if let Err(e) = element.play() {
                            debug!(error = %e, "alarm media restart failed");
                        }
                    }
                }
            },
            _ => {}
        }
    }

    fn stop(&mut self, cx: &mut Cx<'_>) -> Result<(), AudioError> {
        for handle in self.retries.drain(..) {
            cx.timers.cancel(handle);
        }
        cx.cancel(&mut self.keep_alive);
        self.playing = false;
        match self.element.take() {
            Some(mut element) => {
                let paused = element.pause();
                element.rewind();
                paused
            }
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.element.is_some()
    }
}

// ── Tone sequence ────────────────────────────────────────────────────

/// High tone, low tone after a short gap, repeated on a fixed interval.
pub struct ToneSequence {
    session: SessionId,
    config: ToneConfig,
    synth: Option<Box<dyn ToneSynth>>,
    repeat: Option<TimerHandle>,
    low: Option<TimerHandle>,
}

impl ToneSequence {
    pub fn new(session: SessionId, config: ToneConfig) -> Self {
        Self {
            session,
            config,
            synth: None,
            repeat: None,
            low: None,
        }
    }

    fn task(&self, task: AlarmTask) -> Task {
        Task::Alarm {
            session: self.session,
            task,
        }
    }

    pub fn repeat_handle(&self) -> Option<TimerHandle> {
        self.repeat
    }

    fn synth_usable(&self) -> bool {
        self.synth
            .as_ref()
            .is_some_and(|s| s.state() != OutputState::Closed)
    }

    /// Emit the high tone and schedule the low one. Returns the high tone's result.
    fn beat(&mut self, cx: &mut Cx<'_>) -> Result<(), AudioError> {
        let (high, _) = tone::alarm_tones(&self.config);
        let emitted = self.emit(&high);
        cx.cancel(&mut self.low);
        let task = self.task(AlarmTask::LowTone);
        self.low = Some(cx.after(self.config.gap_ms, task));
        emitted
    }

    fn emit(&mut self, tone: &Tone) -> Result<(), AudioError> {
        let Some(synth) = self.synth.as_mut() else {
            return Ok(());
        };
        if synth.state() == OutputState::Suspended {
            if let Err(e) = synth.resume() {
                debug!(error = %e, "tone output still suspended, retrying next beat");
            }
        }
        let emitted = synth.play_tone(tone);
        if let Err(e) = &emitted {
            debug!(error = %e, hz = tone.frequency_hz, "tone emission failed");
        }
        emitted
    }
}

impl AlertStrategy for ToneSequence {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ToneSequence
    }

    fn start(&mut self, cx: &mut Cx<'_>, devices: &mut dyn AudioDevices) -> Result<(), AudioError> {
        if self.is_running() {
            return Ok(());
        }
        if !self.synth_usable() {
            self.synth = Some(devices.tone_synth()?);
        }
        // A suspended output is retried on later beats; anything else means no tones here.
        if let Err(e) = self.beat(cx) {
            if e != AudioError::Suspended {
                cx.cancel(&mut self.low);
                if let Some(mut synth) = self.synth.take() {
                    let _ = synth.close();
                }
                return Err(e);
            }
        }
        cx.cancel(&mut self.repeat);
        let task = self.task(AlarmTask::ToneRepeat);
        self.repeat = Some(cx.every(self.config.interval_ms, task));
        Ok(())
    }

    fn on_timer(&mut self, task: AlarmTask, handle: TimerHandle, cx: &mut Cx<'_>) {
        match task {
            AlarmTask::ToneRepeat => {
                if self.synth.is_none() {
                    cx.timers.cancel(handle);
                    self.repeat = None;
                    return;
                }
                let _ = self.beat(cx);
            }
            AlarmTask::LowTone => {
                self.low = None;
                let (_, low) = tone::alarm_tones(&self.config);
                let _ = self.emit(&low);
            }
            _ => {}
        }
    }

    fn stop(&mut self, cx: &mut Cx<'_>) -> Result<(), AudioError> {
        cx.cancel(&mut self.repeat);
        cx.cancel(&mut self.low);
        match self.synth.take() {
            Some(mut synth) => synth.close(),
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.repeat.is_some() && self.synth_usable()
    }
}

// ── Embedded media ───────────────────────────────────────────────────

/// Last resort: loops a generated beep payload on the alternate element type.
pub struct EmbeddedMedia {
    tone: ToneConfig,
    element: Option<Box<dyn MediaElement>>,
}

impl EmbeddedMedia {
    pub fn new(tone: ToneConfig) -> Self {
        Self {
            tone,
            element: None,
        }
    }
}

impl AlertStrategy for EmbeddedMedia {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EmbeddedMedia
    }

    fn start(&mut self, _cx: &mut Cx<'_>, devices: &mut dyn AudioDevices) -> Result<(), AudioError> {
        if self.element.is_some() {
            return Ok(());
        }
        let payload = tone::embedded_payload(&self.tone)?;
        let mut element = devices.embedded_element()?;
        element.load(&MediaSource::Bytes(payload))?;
        element.set_volume(1.0);
        element.set_looping(true);
        element.play()?;
        self.element = Some(element);
        Ok(())
    }

    fn on_timer(&mut self, _task: AlarmTask, _handle: TimerHandle, _cx: &mut Cx<'_>) {}

    fn stop(&mut self, _cx: &mut Cx<'_>) -> Result<(), AudioError> {
        match self.element.take() {
            Some(mut element) => {
                let paused = element.pause();
                element.rewind();
                paused
            }
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.element.is_some()
    }
}

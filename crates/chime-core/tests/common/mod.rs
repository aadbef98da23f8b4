//! Recording fakes for the engine's collaborators.
//!
//! Every fake shares one `World`: the switches tests flip to make a device
//! misbehave, and a flat call log to assert against.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use chime_core::alarm::{
    AudioDevices, Collaborators, Host, MediaElement, MediaSource, Notification, NotificationSink,
    OutputState, Overlay, Tone, ToneSynth,
};
use chime_core::storage::MemoryKv;
use chime_core::{AlarmEngine, AudioError, Config, CoreError, Reminder, ReminderStore};
use chrono::{DateTime, Utc};

pub struct World {
    pub calls: Vec<String>,
    pub media_unavailable: bool,
    /// Number of upcoming primary play calls to refuse.
    pub media_refusals: u32,
    pub media_paused: bool,
    pub synth_unavailable: bool,
    pub synth_state: OutputState,
    /// Every tone emission fails with a device error.
    pub tone_fails: bool,
    pub tones: Vec<f32>,
    pub embedded_playing: bool,
    pub notify_fails: bool,
    pub hide_fails: bool,
    pub pause_fails: bool,
}

impl Default for World {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            media_unavailable: false,
            media_refusals: 0,
            media_paused: true,
            synth_unavailable: false,
            synth_state: OutputState::Running,
            tone_fails: false,
            tones: Vec::new(),
            embedded_playing: false,
            notify_fails: false,
            hide_fails: false,
            pause_fails: false,
        }
    }
}

pub type Shared = Rc<RefCell<World>>;

impl World {
    pub fn shared() -> Shared {
        Rc::new(RefCell::new(World::default()))
    }
}

pub fn count(world: &Shared, call: &str) -> usize {
    world.borrow().calls.iter().filter(|c| c.as_str() == call).count()
}

pub fn calls_starting(world: &Shared, prefix: &str) -> Vec<String> {
    world
        .borrow()
        .calls
        .iter()
        .filter(|c| c.starts_with(prefix))
        .cloned()
        .collect()
}

struct FakeMedia {
    world: Shared,
    embedded: bool,
}

impl FakeMedia {
    fn name(&self) -> &'static str {
        if self.embedded {
            "embedded"
        } else {
            "media"
        }
    }
}

impl MediaElement for FakeMedia {
    fn load(&mut self, source: &MediaSource) -> Result<(), AudioError> {
        let kind = match source {
            MediaSource::File(_) => "file",
            MediaSource::Bytes(_) => "bytes",
        };
        let name = self.name();
        self.world.borrow_mut().calls.push(format!("{name}.load:{kind}"));
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn set_looping(&mut self, _looping: bool) {}

    fn play(&mut self) -> Result<(), AudioError> {
        let name = self.name();
        let mut w = self.world.borrow_mut();
        w.calls.push(format!("{name}.play"));
        if self.embedded {
            w.embedded_playing = true;
            return Ok(());
        }
        if w.media_refusals > 0 {
            w.media_refusals -= 1;
            return Err(AudioError::Blocked("autoplay refused".into()));
        }
        w.media_paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        let name = self.name();
        let mut w = self.world.borrow_mut();
        w.calls.push(format!("{name}.pause"));
        if self.embedded {
            w.embedded_playing = false;
        } else {
            w.media_paused = true;
        }
        if w.pause_fails {
            return Err(AudioError::Device("pause exploded".into()));
        }
        Ok(())
    }

    fn rewind(&mut self) {
        let name = self.name();
        self.world.borrow_mut().calls.push(format!("{name}.rewind"));
    }

    fn is_paused(&self) -> bool {
        let w = self.world.borrow();
        if self.embedded {
            !w.embedded_playing
        } else {
            w.media_paused
        }
    }
}

struct FakeSynth {
    world: Shared,
}

impl ToneSynth for FakeSynth {
    fn state(&self) -> OutputState {
        self.world.borrow().synth_state
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let mut w = self.world.borrow_mut();
        w.calls.push("tone.resume".into());
        w.synth_state = OutputState::Running;
        Ok(())
    }

    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
        let mut w = self.world.borrow_mut();
        if w.synth_state == OutputState::Suspended {
            return Err(AudioError::Suspended);
        }
        if w.tone_fails {
            return Err(AudioError::Device("no output device".into()));
        }
        w.tones.push(tone.frequency_hz);
        Ok(())
    }

    fn close(&mut self) -> Result<(), AudioError> {
        let mut w = self.world.borrow_mut();
        w.calls.push("tone.close".into());
        w.synth_state = OutputState::Closed;
        Ok(())
    }
}

struct FakeDevices {
    world: Shared,
}

impl AudioDevices for FakeDevices {
    fn media_element(&mut self) -> Result<Box<dyn MediaElement>, AudioError> {
        if self.world.borrow().media_unavailable {
            return Err(AudioError::Unsupported("no media element".into()));
        }
        Ok(Box::new(FakeMedia {
            world: self.world.clone(),
            embedded: false,
        }))
    }

    fn tone_synth(&mut self) -> Result<Box<dyn ToneSynth>, AudioError> {
        let mut w = self.world.borrow_mut();
        if w.synth_unavailable {
            return Err(AudioError::Unsupported("no synthesizer".into()));
        }
        w.calls.push("tone.open".into());
        if w.synth_state == OutputState::Closed {
            w.synth_state = OutputState::Running;
        }
        Ok(Box::new(FakeSynth {
            world: self.world.clone(),
        }))
    }

    fn embedded_element(&mut self) -> Result<Box<dyn MediaElement>, AudioError> {
        Ok(Box::new(FakeMedia {
            world: self.world.clone(),
            embedded: true,
        }))
    }
}

struct FakeNotifier {
    world: Shared,
}

impl NotificationSink for FakeNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), CoreError> {
        let mut w = self.world.borrow_mut();
        if w.notify_fails {
            return Err(CoreError::Notification("permission denied".into()));
        }
        assert!(notification.require_interaction);
        w.calls.push(format!("notify:{}", notification.tag));
        Ok(())
    }

    fn close_by_prefix(&mut self, prefix: &str) -> Result<(), CoreError> {
        self.world.borrow_mut().calls.push(format!("close:{prefix}"));
        Ok(())
    }
}

struct FakeOverlay {
    world: Shared,
}

impl Overlay for FakeOverlay {
    fn show(&mut self, reminder: &Reminder) -> Result<(), CoreError> {
        self.world
            .borrow_mut()
            .calls
            .push(format!("overlay.show:{}", reminder.text));
        Ok(())
    }

    fn add_reminder(&mut self, reminder: &Reminder) -> Result<(), CoreError> {
        self.world
            .borrow_mut()
            .calls
            .push(format!("overlay.add:{}", reminder.text));
        Ok(())
    }

    fn hide(&mut self) -> Result<(), CoreError> {
        let mut w = self.world.borrow_mut();
        w.calls.push("overlay.hide".into());
        if w.hide_fails {
            return Err(CoreError::Custom("overlay already gone".into()));
        }
        Ok(())
    }
}

struct FakeHost {
    world: Shared,
}

impl Host for FakeHost {
    fn focus_app(&mut self) -> Result<(), CoreError> {
        self.world.borrow_mut().calls.push("focus".into());
        Ok(())
    }
}

pub fn collaborators(world: &Shared) -> Collaborators {
    Collaborators {
        devices: Box::new(FakeDevices {
            world: world.clone(),
        }),
        notifier: Box::new(FakeNotifier {
            world: world.clone(),
        }),
        overlay: Box::new(FakeOverlay {
            world: world.clone(),
        }),
        host: Box::new(FakeHost {
            world: world.clone(),
        }),
    }
}

/// Default configuration with an alert asset, so primary media is attempted.
pub fn config() -> Config {
    let mut config = Config::default();
    config.media.alert_asset = Some("alarm.mp3".into());
    config
}

pub fn engine_with(
    world: &Shared,
    config: Config,
    reminders: &[Reminder],
    watermark: DateTime<Utc>,
) -> AlarmEngine<MemoryKv> {
    let mut store = ReminderStore::new(MemoryKv::new());
    for reminder in reminders {
        store.append(reminder.clone()).unwrap();
    }
    AlarmEngine::new(config, store, collaborators(world), watermark)
}

pub fn engine(world: &Shared, reminders: &[Reminder], watermark: DateTime<Utc>) -> AlarmEngine<MemoryKv> {
    engine_with(world, config(), reminders, watermark)
}

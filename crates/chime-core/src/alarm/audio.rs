//! Audio output contracts.
//!
//! The core never builds audio hardware objects itself. It asks an
//! `AudioDevices` factory for them at alarm time; a construction error is how
//! a platform says "not available here", and the chain moves on.

use std::path::PathBuf;

use crate::error::AudioError;

#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    File(PathBuf),
    /// Encoded audio payload (WAV) held in memory.
    Bytes(Vec<u8>),
}

/// A media playback element (audio tag, external player, ...).
pub trait MediaElement {
    fn load(&mut self, source: &MediaSource) -> Result<(), AudioError>;
    fn set_volume(&mut self, volume: f32);
    fn set_looping(&mut self, looping: bool);
    /// Start or continue playback. An error means playback was refused.
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    /// Seek back to the start.
    fn rewind(&mut self);
    fn is_paused(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Running,
    /// The environment paused the output; `resume` may bring it back.
    Suspended,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Square,
    Sine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: u64,
    pub gain: f32,
    pub waveform: Waveform,
}

/// A tone synthesizer context.
pub trait ToneSynth {
    fn state(&self) -> OutputState;
    fn resume(&mut self) -> Result<(), AudioError>;
    /// Emit one tone without blocking.
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError>;
    fn close(&mut self) -> Result<(), AudioError>;
}

/// Capability probe and factory for the three alerting outputs.
pub trait AudioDevices {
    fn media_element(&mut self) -> Result<Box<dyn MediaElement>, AudioError>;
    fn tone_synth(&mut self) -> Result<Box<dyn ToneSynth>, AudioError>;
    /// The alternate element type used as the last resort.
    fn embedded_element(&mut self) -> Result<Box<dyn MediaElement>, AudioError>;
}

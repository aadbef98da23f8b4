//! Terminal-side implementations of the engine's collaborators.
//!
//! Media is played by spawning an external player; a player process that
//! has exited counts as paused, which is how the keep-alive timer turns a
//! one-shot player into a loop. Tones are the terminal bell. Notifications
//! and the overlay are printed.

use std::cell::RefCell;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use chime_core::alarm::{
    AudioDevices, Host, MediaElement, MediaSource, Notification, NotificationSink, OutputState,
    Overlay, Tone, ToneSynth,
};
use chime_core::{AudioError, Collaborators, CoreError, Reminder};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::{execute, queue};
use tracing::debug;

/// Print one line; `\r\n` keeps output aligned while the terminal is in raw mode.
pub fn say(line: &str) {
    let mut out = io::stdout();
    let _ = write!(out, "{line}\r\n");
    let _ = out.flush();
}

fn default_player() -> Vec<String> {
    let player = if cfg!(target_os = "macos") {
        "afplay"
    } else if cfg!(target_os = "windows") {
        return Vec::new();
    } else {
        "paplay"
    };
    vec![player.to_string()]
}

// ── Media ────────────────────────────────────────────────────────────

pub struct CommandPlayer {
    command: Vec<String>,
    path: Option<PathBuf>,
    // Interior mutability so `is_paused` can reap an exited player.
    child: RefCell<Option<Child>>,
}

impl CommandPlayer {
    fn new(command: Vec<String>) -> Self {
        Self {
            command,
            path: None,
            child: RefCell::new(None),
        }
    }

    fn running(&self) -> bool {
        let mut slot = self.child.borrow_mut();
        match slot.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => true,
            Some(_) => {
                *slot = None;
                false
            }
            None => false,
        }
    }
}

impl MediaElement for CommandPlayer {
    fn load(&mut self, source: &MediaSource) -> Result<(), AudioError> {
        let path = match source {
            MediaSource::File(path) => {
                if !path.exists() {
                    return Err(AudioError::Unsupported(format!(
                        "alert asset not found: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
            MediaSource::Bytes(bytes) => {
                let path = std::env::temp_dir().join(format!("chime-alarm-{}.wav", std::process::id()));
                std::fs::write(&path, bytes).map_err(|e| AudioError::Device(e.to_string()))?;
                path
            }
        };
        self.path = Some(path);
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn set_looping(&mut self, _looping: bool) {}

    fn play(&mut self) -> Result<(), AudioError> {
        if self.running() {
            return Ok(());
        }
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| AudioError::Device("nothing loaded".into()))?;
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| AudioError::Unsupported("no media player configured".into()))?;
        let child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AudioError::Unsupported(format!("{program}: {e}")))?;
        *self.child.borrow_mut() = Some(child);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        if let Some(mut child) = self.child.get_mut().take() {
            if matches!(child.try_wait(), Ok(None)) {
                child.kill().map_err(|e| AudioError::Device(e.to_string()))?;
            }
            let _ = child.wait();
        }
        Ok(())
    }

    fn rewind(&mut self) {}

    /// An exited player counts as paused.
    fn is_paused(&self) -> bool {
        !self.running()
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        let _ = self.pause();
    }
}

// ── Tones ────────────────────────────────────────────────────────────

/// The terminal bell. Pitch is not controllable, the rhythm is.
pub struct TerminalBell {
    state: OutputState,
}

impl ToneSynth for TerminalBell {
    fn state(&self) -> OutputState {
        self.state
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.state == OutputState::Closed {
            return Err(AudioError::Device("bell closed".into()));
        }
        self.state = OutputState::Running;
        Ok(())
    }

    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
        if self.state != OutputState::Running {
            return Err(AudioError::Suspended);
        }
        debug!(hz = tone.frequency_hz, "bell");
        let mut err = io::stderr();
        write!(err, "\x07")
            .and_then(|_| err.flush())
            .map_err(|e| AudioError::Device(e.to_string()))
    }

    fn close(&mut self) -> Result<(), AudioError> {
        self.state = OutputState::Closed;
        Ok(())
    }
}

pub struct TerminalDevices {
    player: Vec<String>,
}

impl TerminalDevices {
    pub fn new(player: Vec<String>) -> Self {
        let player = if player.is_empty() {
            default_player()
        } else {
            player
        };
        Self { player }
    }
}

impl AudioDevices for TerminalDevices {
    fn media_element(&mut self) -> Result<Box<dyn MediaElement>, AudioError> {
        if self.player.is_empty() {
            return Err(AudioError::Unsupported("no media player for this platform".into()));
        }
        Ok(Box::new(CommandPlayer::new(self.player.clone())))
    }

    fn tone_synth(&mut self) -> Result<Box<dyn ToneSynth>, AudioError> {
        if !io::stderr().is_terminal() {
            return Err(AudioError::Unsupported("stderr is not a terminal".into()));
        }
        Ok(Box::new(TerminalBell {
            state: OutputState::Running,
        }))
    }

    fn embedded_element(&mut self) -> Result<Box<dyn MediaElement>, AudioError> {
        self.media_element()
    }
}

// ── Notifications, overlay, host ─────────────────────────────────────

#[derive(Default)]
pub struct ConsoleNotifier {
    open: Vec<String>,
}

impl NotificationSink for ConsoleNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), CoreError> {
        say(&format!("[{}] {}  {}", notification.tag, notification.title, notification.body));
        self.open.push(notification.tag.clone());
        Ok(())
    }

    fn close_by_prefix(&mut self, prefix: &str) -> Result<(), CoreError> {
        let before = self.open.len();
        self.open.retain(|tag| !tag.starts_with(prefix));
        debug!(closed = before - self.open.len(), "notifications closed");
        Ok(())
    }
}

pub struct TerminalOverlay;

impl TerminalOverlay {
    fn banner(&self, text: &str) -> io::Result<()> {
        let mut out = io::stdout();
        queue!(
            out,
            SetForegroundColor(Color::Red),
            SetAttribute(Attribute::Bold),
            Print("⏰ ALARM  "),
            Print(text),
            ResetColor,
            SetAttribute(Attribute::Reset),
            Print("\r\n"),
        )?;
        execute!(
            out,
            SetForegroundColor(Color::DarkGrey),
            Print("   [space/enter/esc] stop  [d] dismiss  [q] quit\r\n"),
            ResetColor,
        )
    }
}

impl Overlay for TerminalOverlay {
    fn show(&mut self, reminder: &Reminder) -> Result<(), CoreError> {
        self.banner(&reminder.text)?;
        Ok(())
    }

    fn add_reminder(&mut self, reminder: &Reminder) -> Result<(), CoreError> {
        say(&format!("   + {}", reminder.text));
        Ok(())
    }

    fn hide(&mut self) -> Result<(), CoreError> {
        say("   alarm stopped");
        Ok(())
    }
}

pub struct TerminalHost;

impl Host for TerminalHost {}

pub fn collaborators(player: Vec<String>) -> Collaborators {
    Collaborators {
        devices: Box::new(TerminalDevices::new(player)),
        notifier: Box::new(ConsoleNotifier::default()),
        overlay: Box::new(TerminalOverlay),
        host: Box::new(TerminalHost),
    }
}

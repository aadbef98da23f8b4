//! `chime run`: the foreground scheduler.
//!
//! Drives `AlarmEngine::tick` from a 100 ms interval on a current-thread
//! runtime. Keyboard and terminal focus events are read without blocking
//! on every tick and forwarded to the engine. Only `q`, Ctrl-C or SIGINT end
//! the loop; input and output failures are logged and ticking continues.
//!
//! A terminal reports focus but not visibility, so the driver only ever
//! produces `Focused` and `Blurred`. Raw mode also swallows Ctrl-Z, so there
//! is no suspend signal to read `Hidden` from either, and the "still active"
//! background notice is not sent by this driver.

use std::io::{self, IsTerminal};
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use chime_core::storage::KvStore;
use chime_core::{AlarmEngine, Config, Database, EnvEvent, Event, Key, ReminderStore};
use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event as TermEvent, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{debug, info, warn};

use crate::adapters::{self, say};

const TICK: Duration = Duration::from_millis(100);
const MAX_LOOKBACK_SECS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Args)]
pub struct RunArgs {
    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,
    /// Print every engine event as a JSON line
    #[arg(long)]
    pub json: bool,
    /// Also ring for reminders that came due in the last N seconds
    #[arg(long, default_value = "0")]
    pub since_secs: u64,
}

/// Raw mode for the lifetime of the run; restored on drop.
struct RawTerminal;

impl RawTerminal {
    fn enter() -> io::Result<Option<Self>> {
        if !io::stdin().is_terminal() {
            return Ok(None);
        }
        enable_raw_mode()?;
        let _ = execute!(io::stdout(), EnableFocusChange);
        Ok(Some(Self))
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), DisableFocusChange);
        let _ = disable_raw_mode();
    }
}

#[derive(Debug)]
enum Input {
    Key(Key),
    Dismiss,
    Env(EnvEvent),
    Quit,
}

fn map_key(key: KeyEvent) -> Option<Input> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let input = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Input::Quit,
        KeyCode::Char('q') => Input::Quit,
        KeyCode::Char('d') => Input::Dismiss,
        KeyCode::Char(' ') => Input::Key(Key::Space),
        KeyCode::Enter => Input::Key(Key::Enter),
        KeyCode::Esc => Input::Key(Key::Escape),
        _ => Input::Key(Key::Other),
    };
    Some(input)
}

/// Everything the terminal has queued, without blocking.
fn drain_input() -> io::Result<Vec<Input>> {
    let mut inputs = Vec::new();
    while event::poll(Duration::ZERO)? {
        let input = match event::read()? {
            TermEvent::Key(key) => map_key(key),
            TermEvent::FocusGained => Some(Input::Env(EnvEvent::Focused)),
            TermEvent::FocusLost => Some(Input::Env(EnvEvent::Blurred)),
            _ => None,
        };
        inputs.extend(input);
    }
    Ok(inputs)
}

/// Where a tick's keyboard and focus input comes from.
trait InputSource {
    fn drain(&mut self) -> io::Result<Vec<Input>>;
}

struct TerminalInput;

impl InputSource for TerminalInput {
    fn drain(&mut self) -> io::Result<Vec<Input>> {
        drain_input()
    }
}

fn report(events: Vec<Event>, json: bool) {
    for event in events {
        if !json {
            debug!(?event, "engine event");
            continue;
        }
        match serde_json::to_string(&event) {
            Ok(line) => say(&line),
            Err(e) => warn!(error = %e, "could not encode engine event"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// One pass of the run loop: forward pending input, then fire due timers.
///
/// An input source that fails is dropped and the loop carries on without it.
fn step<S, I>(engine: &mut AlarmEngine<S>, input: &mut Option<I>, json: bool) -> Flow
where
    S: KvStore,
    I: InputSource,
{
    let inputs = match input.as_mut().map(|source| source.drain()) {
        Some(Ok(inputs)) => inputs,
        Some(Err(e)) => {
            warn!(error = %e, "terminal input failed, continuing without it");
            *input = None;
            Vec::new()
        }
        None => Vec::new(),
    };

    for item in inputs {
        let now = Utc::now();
        let events = match item {
            Input::Key(key) => engine.handle_key(key, now),
            Input::Dismiss => engine.dismiss(now),
            Input::Env(env) => engine.on_environment(env, now),
            Input::Quit => {
                report(engine.dismiss(now), json);
                info!("quit requested");
                return Flow::Quit;
            }
        };
        report(events, json);
    }
    report(engine.tick(Utc::now()), json);
    Flow::Continue
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = ReminderStore::new(Database::open()?);
    let io = adapters::collaborators(config.media.player.clone());
    let now = Utc::now();
    let lookback = chrono::Duration::seconds(args.since_secs.min(MAX_LOOKBACK_SECS) as i64);
    let watermark = now.checked_sub_signed(lookback).unwrap_or(now);
    let mut engine = AlarmEngine::new(config, store, io, now).with_watermark(watermark);

    if args.once {
        report(engine.start(now), args.json);
        report(engine.dismiss(Utc::now()), args.json);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(engine, args.json))
}

async fn watch(
    mut engine: AlarmEngine<Database>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let terminal = RawTerminal::enter()?;
    let mut input = terminal.as_ref().map(|_| TerminalInput);
    say("chime: watching for reminders (q to quit)");
    report(engine.start(Utc::now()), json);

    let mut interval = tokio::time::interval(TICK);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if step(&mut engine, &mut input, json) == Flow::Quit {
                    return Ok(());
                }
            }
            _ = &mut ctrl_c => {
                report(engine.dismiss(Utc::now()), json);
                info!("interrupted");
                return Ok(());
            }
        }
    }
}

//! # Chime Core Library
//!
//! This library provides the core logic for the chime reminder scheduler:
//! persisted reminders, due-reminder polling and an alarm that keeps trying
//! to make noise until someone dismisses it. The `chime` CLI is a thin
//! driver over the same library.
//!
//! ## Architecture
//!
//! - **Storage**: SQLite key-value persistence for reminders and session
//!   state, TOML-based configuration
//! - **Poller**: watermark-based detection of reminders that just became due
//! - **Alarm**: single active-alarm session, fallback audio chain (media,
//!   synthesized tones, embedded beep) and environment recovery
//! - **Timer**: cooperative timer queue; nothing here spawns threads, the
//!   caller drives `AlarmEngine::tick()`
//!
//! ## Key Components
//!
//! - [`AlarmEngine`]: owns everything above and turns ticks into [`Event`]s
//! - [`ReminderStore`]: reminder persistence over any [`storage::KvStore`]
//! - [`Config`]: application configuration management
//! - [`IntentClient`]: reminder extraction from the assistant backend

pub mod alarm;
pub mod engine;
pub mod error;
pub mod events;
pub mod intent;
pub mod poller;
pub mod reminder;
pub mod storage;
pub mod timer;
pub mod tone;

pub use alarm::{AlarmSession, AlarmState, Collaborators, EnvEvent, Key, StopReason};
pub use engine::AlarmEngine;
pub use error::{AudioError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use intent::{parse_reminder_response, IntentClient, IntentReply};
pub use poller::{DuePoller, PollReport};
pub use reminder::Reminder;
pub use storage::{Config, Database, MemoryKv, ReminderStore, SessionStore};

mod config;
pub mod database;
mod reminder_store;
mod session_state;

pub use config::{
    AlarmConfig, Config, IntentConfig, MediaConfig, NotificationsConfig, PollerConfig,
    RecoveryConfig, ToneConfig,
};
pub use database::Database;
pub use reminder_store::ReminderStore;
pub use session_state::SessionStore;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::DatabaseError;

/// Storage keys. Every value is JSON.
pub mod keys {
    pub const REMINDERS: &str = "chime_reminders";
    pub const MUTE_STATE: &str = "chime_mute_state";
    pub const SESSION_ID: &str = "chime_session_id";
}

/// Durable string key-value storage scoped to one client instance.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn remove(&mut self, key: &str) -> Result<(), DatabaseError>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    values: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DatabaseError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Returns `~/.config/chime[-dev]/` based on CHIME_ENV.
///
/// Set CHIME_ENV=dev to use the development data directory, or
/// CHIME_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("CHIME_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CHIME_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("chime-dev")
            } else {
                base_dir.join("chime")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

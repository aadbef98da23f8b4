//! TOML-based application configuration.
//!
//! Stores scheduler and alarm tuning:
//! - Poll cadence and the missed-reminder grace window
//! - Alarm auto-dismiss and tone backstop delays
//! - Primary media asset and player, tone sequence shape
//! - Notification wording and tag prefix
//! - Background recovery behavior
//! - Intent endpoint location
//!
//! Configuration is stored at `~/.config/chime/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Due-reminder poller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    /// Reminders detected later than this after their due time are dropped.
    /// Unset means every missed reminder still fires.
    #[serde(default)]
    pub missed_grace_secs: Option<u64>,
}

/// Alarm session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_auto_dismiss")]
    pub auto_dismiss_secs: u64,
    #[serde(default = "default_backstop_delay")]
    pub backstop_delay_ms: u64,
}

/// Primary media playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to the looping alert sound. Without one, the chain starts at the tone sequence.
    #[serde(default)]
    pub alert_asset: Option<String>,
    /// Player command used by the CLI (e.g. `["paplay"]`). Empty picks a platform default.
    #[serde(default)]
    pub player: Vec<String>,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_play_retries")]
    pub play_retry_ms: Vec<u64>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_ms: u64,
}

/// Synthesized tone sequence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneConfig {
    #[serde(default = "default_high_hz")]
    pub high_hz: f32,
    #[serde(default = "default_low_hz")]
    pub low_hz: f32,
    #[serde(default = "default_tone_duration")]
    pub duration_ms: u64,
    #[serde(default = "default_tone_gap")]
    pub gap_ms: u64,
    #[serde(default = "default_tone_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_tone_gain")]
    pub gain: f32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_still_active_title")]
    pub still_active_title: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Every alarm notification tag starts with this, so they can be closed in bulk.
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
}

/// Environment recovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Send a "still ringing" notification when the host is hidden mid-alarm.
    #[serde(default = "default_true")]
    pub background_notice: bool,
}

/// Intent endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    #[serde(default = "default_intent_url")]
    pub base_url: String,
    #[serde(default = "default_intent_timeout")]
    pub timeout_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/chime/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub tone: ToneConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub intent: IntentConfig,
}

// Default functions
fn default_poll_interval() -> u64 {
    10
}
fn default_auto_dismiss() -> u64 {
    10 * 60
}
fn default_backstop_delay() -> u64 {
    1000
}
fn default_volume() -> f32 {
    1.0
}
fn default_play_retries() -> Vec<u64> {
    vec![100, 500]
}
fn default_keep_alive() -> u64 {
    1000
}
fn default_high_hz() -> f32 {
    1200.0
}
fn default_low_hz() -> f32 {
    800.0
}
fn default_tone_duration() -> u64 {
    400
}
fn default_tone_gap() -> u64 {
    400
}
fn default_tone_interval() -> u64 {
    1200
}
fn default_tone_gain() -> f32 {
    0.5
}
fn default_sample_rate() -> u32 {
    22_050
}
fn default_true() -> bool {
    true
}
fn default_title() -> String {
    "⏰ Reminder alarm!".into()
}
fn default_still_active_title() -> String {
    "🚨 Alarm still active!".into()
}
fn default_icon() -> String {
    "chime".into()
}
fn default_tag_prefix() -> String {
    "alarm-".into()
}
fn default_intent_url() -> String {
    "http://localhost:8000/mcp".into()
}
fn default_intent_timeout() -> u64 {
    15
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            missed_grace_secs: None,
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_secs: default_auto_dismiss(),
            backstop_delay_ms: default_backstop_delay(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            alert_asset: None,
            player: Vec::new(),
            volume: default_volume(),
            play_retry_ms: default_play_retries(),
            keep_alive_ms: default_keep_alive(),
        }
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            high_hz: default_high_hz(),
            low_hz: default_low_hz(),
            duration_ms: default_tone_duration(),
            gap_ms: default_tone_gap(),
            interval_ms: default_tone_interval(),
            gain: default_tone_gain(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: default_title(),
            still_active_title: default_still_active_title(),
            icon: default_icon(),
            tag_prefix: default_tag_prefix(),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            background_notice: true,
        }
    }
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            base_url: default_intent_url(),
            timeout_secs: default_intent_timeout(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn parse_scalar(key: &str, value: &str) -> Result<serde_json::Value, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if let Ok(n) = value.parse::<u64>() {
            return Ok(serde_json::Value::Number(n.into()));
        }
        if let Ok(n) = value.parse::<f64>() {
            return serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")));
        }
        Ok(serde_json::Value::String(value.into()))
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => match Self::parse_scalar(key, value)? {
                        n @ serde_json::Value::Number(_) => n,
                        _ => return Err(invalid(format!("cannot parse '{value}' as number"))),
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Unset optional values take whatever the text looks like.
                    serde_json::Value::Null => Self::parse_scalar(key, value)?,
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Parse a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit its type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

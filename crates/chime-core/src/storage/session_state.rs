//! Per-bot mute flags and the generated session identifier.
//!
//! Same discipline as the reminder list: read, parse (defaulting to empty),
//! modify, write the whole value back.

use std::collections::BTreeMap;

use tracing::warn;

use super::{keys, KvStore};
use crate::error::CoreError;

pub struct SessionStore<S: KvStore> {
    kv: S,
}

impl<S: KvStore> SessionStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Current mute map, empty when missing or unreadable.
    pub fn mute_map(&self) -> BTreeMap<String, bool> {
        let raw = match self.kv.get(keys::MUTE_STATE) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "mute state unavailable");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "mute state unreadable, treating as empty");
            BTreeMap::new()
        })
    }

    pub fn is_muted(&self, bot: &str) -> bool {
        self.mute_map().get(bot).copied().unwrap_or(false)
    }

    pub fn set_muted(&mut self, bot: &str, muted: bool) -> Result<(), CoreError> {
        let mut map = self.mute_map();
        map.insert(bot.to_string(), muted);
        let json = serde_json::to_string(&map)?;
        self.kv.set(keys::MUTE_STATE, &json)?;
        Ok(())
    }

    /// Flip a bot's mute flag and return the new value.
    pub fn toggle_muted(&mut self, bot: &str) -> Result<bool, CoreError> {
        let muted = !self.is_muted(bot);
        self.set_muted(bot, muted)?;
        Ok(muted)
    }

    /// The persisted session id, generating and storing one on first use.
    pub fn session_id(&mut self) -> Result<String, CoreError> {
        if let Some(raw) = self.kv.get(keys::SESSION_ID)? {
            match serde_json::from_str::<String>(&raw) {
                Ok(id) if !id.is_empty() => return Ok(id),
                _ => warn!("stored session id unreadable, generating a new one"),
            }
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.kv.set(keys::SESSION_ID, &serde_json::to_string(&id)?)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKv;

    #[test]
    fn mute_defaults_to_false() {
        let store = SessionStore::new(MemoryKv::new());
        assert!(!store.is_muted("weather"));
        assert!(store.mute_map().is_empty());
    }

    #[test]
    fn toggle_flips_and_persists() {
        let mut store = SessionStore::new(MemoryKv::new());
        assert!(store.toggle_muted("weather").unwrap());
        assert!(store.is_muted("weather"));
        assert!(!store.is_muted("jokes"));
        assert!(!store.toggle_muted("weather").unwrap());
        assert_eq!(store.mute_map().get("weather"), Some(&false));
    }

    #[test]
    fn corrupt_mute_state_is_empty() {
        let mut kv = MemoryKv::new();
        kv.set(keys::MUTE_STATE, "[[[").unwrap();
        let mut store = SessionStore::new(kv);
        assert!(store.mute_map().is_empty());
        store.set_muted("jokes", true).unwrap();
        assert!(store.is_muted("jokes"));
    }

    #[test]
    fn session_id_is_stable() {
        let mut store = SessionStore::new(MemoryKv::new());
        let first = store.session_id().unwrap();
        let second = store.session_id().unwrap();
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }
}

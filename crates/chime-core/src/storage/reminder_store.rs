//! Durable reminder list.
//!
//! The whole list lives under one key as a JSON array. Every write is
//! read-modify-write of the full value, so a store assumes a single writer.

use tracing::warn;

use super::{keys, KvStore};
use crate::error::{CoreError, DatabaseError};
use crate::reminder::Reminder;

pub struct ReminderStore<S: KvStore> {
    kv: S,
}

impl<S: KvStore> ReminderStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// Read every reminder in insertion order.
    ///
    /// A missing key is an empty list.
    ///
    /// # Errors
    /// Returns an error if the backing store fails or the stored value is not
    /// a reminder list.
    pub fn try_read_all(&self) -> Result<Vec<Reminder>, CoreError> {
        let Some(raw) = self.kv.get(keys::REMINDERS)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| {
            CoreError::Database(DatabaseError::Corrupt {
                key: keys::REMINDERS.to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Read every reminder, treating an unreadable value as empty.
    pub fn read_all(&self) -> Vec<Reminder> {
        self.try_read_all().unwrap_or_else(|e| {
            warn!(error = %e, "reminder list unreadable, treating as empty");
            Vec::new()
        })
    }

    /// Append one reminder at the end of the list.
    pub fn append(&mut self, reminder: Reminder) -> Result<(), CoreError> {
        let mut reminders = self.read_all();
        reminders.push(reminder);
        self.write(&reminders)
    }

    /// Remove every reminder whose text and datetime both match exactly.
    ///
    /// Returns how many were removed.
    pub fn remove(&mut self, text: &str, datetime: &str) -> Result<usize, CoreError> {
        let mut reminders = self.read_all();
        let before = reminders.len();
        reminders.retain(|r| !(r.text == text && r.datetime == datetime));
        let removed = before - reminders.len();
        if removed > 0 {
            self.write(&reminders)?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<(), CoreError> {
        self.kv.remove(keys::REMINDERS)?;
        Ok(())
    }

    fn write(&mut self, reminders: &[Reminder]) -> Result<(), CoreError> {
        let json = serde_json::to_string(reminders)?;
        self.kv.set(keys::REMINDERS, &json)?;
        Ok(())
    }
}

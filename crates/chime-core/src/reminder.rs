//! Reminder records.
//!
//! A reminder is a `{text, datetime}` pair with structural identity: there is
//! no id, duplicates are legal, and each copy fires on its own.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Naive layouts accepted besides RFC 3339. Interpreted as local wall-clock time.
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reminder {
    pub text: String,
    /// Stored exactly as supplied so round trips are lossless.
    pub datetime: String,
}

impl Reminder {
    pub fn new(text: impl Into<String>, datetime: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            datetime: datetime.into(),
        }
    }

    /// Build a reminder from an absolute instant (stored as RFC 3339, UTC).
    pub fn at(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(text, at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// When this reminder becomes due, or `None` if the datetime is unparsable.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        parse_datetime(&self.datetime)
    }

    /// Check a reminder before it is accepted from a reminder source.
    ///
    /// The store itself accepts anything; this is applied at ingestion.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "text".into(),
                message: "reminder text is empty".into(),
            });
        }
        let at = self.due_at().ok_or_else(|| ValidationError::InvalidValue {
            field: "datetime".into(),
            message: format!(
                "cannot parse '{}'; use 'YYYY-MM-DD HH:MM:SS' or RFC 3339",
                self.datetime
            ),
        })?;
        if at < now {
            return Err(ValidationError::PastTime { at });
        }
        Ok(at)
    }
}

/// Parse a reminder timestamp.
///
/// RFC 3339 strings keep their offset; naive strings are local time.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

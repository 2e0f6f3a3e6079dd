//! Journal entries and their validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{ClockTime, TimeParseError};
use crate::day::DayZone;

/// Placeholder stored for empty details so the field never renders as collapsed.
pub const EMPTY_DETAILS: &str = " ";

/// Validation errors for entry input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The timestamp has no calendar representation.
    #[error("timestamp {timestamp} is outside the supported date range")]
    TimestampOutOfRange { timestamp: i64 },
}

/// A single logged food item.
///
/// Identity is `timestamp`: assigned once at creation and never changed.
/// `date` is always the calendar day of `timestamp`, never of `time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// What was eaten.
    pub food: String,
    /// Free-text annotation, `" "` when nothing was given.
    pub details: String,
    /// Time of day as entered, normally a canonical clock string.
    pub time: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Calendar day of `timestamp`, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

impl Entry {
    /// Builds an entry for a freshly assigned timestamp.
    pub fn new(draft: EntryDraft, timestamp: i64, zone: DayZone) -> Result<Self, ValidationError> {
        let date = zone
            .calendar_day(timestamp)
            .ok_or(ValidationError::TimestampOutOfRange { timestamp })?;
        Ok(Self {
            food: draft.food,
            details: draft.details,
            time: draft.time,
            timestamp,
            date,
        })
    }

    /// Returns a copy with the draft's fields and `date` recomputed from the
    /// unchanged timestamp.
    pub fn revised(&self, draft: EntryDraft, zone: DayZone) -> Result<Self, ValidationError> {
        Self::new(draft, self.timestamp, zone)
    }

    /// Decodes `time`.
    pub fn clock_time(&self) -> Result<ClockTime, TimeParseError> {
        ClockTime::parse(&self.time)
    }
}

/// User-supplied fields of an entry, validated and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    food: String,
    details: String,
    time: String,
}

impl EntryDraft {
    /// Validates `food` and normalizes empty `details` to [`EMPTY_DETAILS`].
    pub fn new(
        food: impl Into<String>,
        details: impl Into<String>,
        time: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let food = food.into();
        if food.trim().is_empty() {
            return Err(ValidationError::Empty { field: "food" });
        }
        let time = time.into();
        if time.trim().is_empty() {
            return Err(ValidationError::Empty { field: "time" });
        }
        let mut details = details.into();
        if details.is_empty() {
            details = EMPTY_DETAILS.to_string();
        }
        Ok(Self {
            food,
            details,
            time,
        })
    }
}

//! Calendar-day derivation for entry timestamps.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Offset, Utc};

/// The timezone used to decide which calendar day a timestamp falls on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayZone {
    /// The system's local timezone, DST included.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl DayZone {
    /// A fixed zone `minutes` east of UTC. `None` if the offset is out of range.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::Fixed)
    }

    /// UTC.
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Calendar day of a millisecond epoch timestamp.
    ///
    /// `None` when the timestamp is outside chrono's representable range.
    pub fn calendar_day(self, timestamp_ms: i64) -> Option<NaiveDate> {
        let instant = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)?;
        Some(self.day_of(instant))
    }

    /// Calendar day of an instant.
    pub fn day_of(self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Fixed(offset) => instant.with_timezone(&offset).date_naive(),
        }
    }

    /// Wall-clock time of an instant.
    pub fn time_of(self, instant: DateTime<Utc>) -> NaiveTime {
        match self {
            Self::Local => instant.with_timezone(&Local).time(),
            Self::Fixed(offset) => instant.with_timezone(&offset).time(),
        }
    }

    /// Today's date in this zone.
    pub fn today(self) -> NaiveDate {
        self.day_of(Utc::now())
    }
}

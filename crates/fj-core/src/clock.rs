//! Canonical 12-hour clock strings.
//!
//! Entries carry their time of day as a display string such as `"8:30 PM"`.
//! [`ClockTime`] is the parsed form: minutes since midnight, `0..=1439`.
//!
//! Decoding is lenient about whitespace and the case of the meridiem marker
//! (`" 8:30pm "`, `"8:30\u{202f}PM"`) but never clamps: an hour outside
//! `1..=12`, a minute outside `0..=59`, or a missing marker is an error.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Pre-compiled pattern for an uppercased, trimmed clock string.
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<hour>[^:\s]+):(?<minute>[^:\s]+?)\s*(?<meridiem>AM|PM)$").unwrap()
});

/// Errors from decoding a clock string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// No trailing `AM`/`PM` marker.
    #[error("missing AM/PM marker in {input:?}")]
    MissingMeridiem { input: String },

    /// Not of the shape `h:mm AM`.
    #[error("malformed time {input:?}, expected h:mm AM/PM")]
    Malformed { input: String },

    /// Hour or minute component is not a number.
    #[error("non-numeric {component} in {input:?}")]
    NonNumeric {
        component: &'static str,
        input: String,
    },

    /// Hour outside `1..=12`.
    #[error("hour {hour} out of range 1-12 in {input:?}")]
    HourOutOfRange { hour: u32, input: String },

    /// Minute outside `0..=59`.
    #[error("minute {minute} out of range 0-59 in {input:?}")]
    MinuteOutOfRange { minute: u32, input: String },

    /// Minutes-since-midnight value outside the day.
    #[error("{minutes} minutes is outside the day (max {max})", max = MINUTES_PER_DAY - 1)]
    OutOfDay { minutes: u32 },
}

/// A time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// Creates a time from minutes since midnight.
    pub fn from_minutes(minutes: u32) -> Result<Self, TimeParseError> {
        u16::try_from(minutes)
            .ok()
            .filter(|m| *m < MINUTES_PER_DAY)
            .map(Self)
            .ok_or(TimeParseError::OutOfDay { minutes })
    }

    /// Creates a time from a 24-hour clock hour and minute.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, TimeParseError> {
        if minute > 59 {
            return Err(TimeParseError::OutOfDay {
                minutes: hour.saturating_mul(60).saturating_add(minute),
            });
        }
        Self::from_minutes(hour.saturating_mul(60).saturating_add(minute))
    }

    /// Decodes a clock string such as `"1:30 PM"`.
    pub fn parse(input: &str) -> Result<Self, TimeParseError> {
        let normalized = input.trim().to_uppercase();
        if !(normalized.ends_with("AM") || normalized.ends_with("PM")) {
            return Err(TimeParseError::MissingMeridiem {
                input: input.to_string(),
            });
        }

        let Some(caps) = CLOCK_RE.captures(&normalized) else {
            return Err(TimeParseError::Malformed {
                input: input.to_string(),
            });
        };

        let hour = parse_component(&caps["hour"], "hour", input)?;
        let minute = parse_component(&caps["minute"], "minute", input)?;
        if !(1..=12).contains(&hour) {
            return Err(TimeParseError::HourOutOfRange {
                hour,
                input: input.to_string(),
            });
        }
        if minute > 59 {
            return Err(TimeParseError::MinuteOutOfRange {
                minute,
                input: input.to_string(),
            });
        }

        let hour = match (&caps["meridiem"], hour) {
            ("AM", 12) => 0,
            ("PM", h) if h != 12 => h + 12,
            (_, h) => h,
        };
        Self::from_hm(hour, minute)
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Hour on the 24-hour clock, `0..=23`.
    pub const fn hour(self) -> u16 {
        self.0 / 60
    }

    /// Minute within the hour.
    pub const fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Absolute distance in minutes. Does not wrap around midnight.
    pub const fn distance(self, other: Self) -> u16 {
        self.0.abs_diff(other.0)
    }
}

fn parse_component(
    raw: &str,
    component: &'static str,
    input: &str,
) -> Result<u32, TimeParseError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::NonNumeric {
            component,
            input: input.to_string(),
        });
    }
    raw.parse().map_err(|_| TimeParseError::NonNumeric {
        component,
        input: input.to_string(),
    })
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.hour();
        let meridiem = if hour < 12 { "AM" } else { "PM" };
        let display_hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{display_hour}:{:02} {meridiem}", self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

/// Re-encodes a clock string canonically, if it decodes.
pub fn canonicalize(input: &str) -> Result<String, TimeParseError> {
    ClockTime::parse(input).map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(s: &str) -> u16 {
        ClockTime::parse(s).unwrap().minutes()
    }

    #[test]
    fn decodes_reference_points() {
        assert_eq!(minutes("12:00 AM"), 0);
        assert_eq!(minutes("12:00 PM"), 720);
        assert_eq!(minutes("1:30 PM"), 810);
        assert_eq!(minutes("11:59 PM"), 1439);
        assert_eq!(minutes("12:59 AM"), 59);
        assert_eq!(minutes("9:05 AM"), 545);
    }

    #[test]
    fn decode_normalizes_whitespace_and_case() {
        assert_eq!(minutes("  8:30 pm "), 20 * 60 + 30);
        assert_eq!(minutes("8:30PM"), 20 * 60 + 30);
        assert_eq!(minutes("8:30\u{202f}PM"), 20 * 60 + 30);
        assert_eq!(minutes("08:30 am"), 8 * 60 + 30);
    }

    #[test]
    fn canonical_strings_round_trip() {
        for m in 0..u32::from(MINUTES_PER_DAY) {
            let time = ClockTime::from_minutes(m).unwrap();
            let encoded = time.to_string();
            assert_eq!(ClockTime::parse(&encoded).unwrap(), time, "{encoded}");
            assert_eq!(ClockTime::parse(&encoded).unwrap().to_string(), encoded);
        }
    }

    #[test]
    fn encodes_without_hour_padding() {
        assert_eq!(ClockTime::from_hm(0, 0).unwrap().to_string(), "12:00 AM");
        assert_eq!(ClockTime::from_hm(8, 5).unwrap().to_string(), "8:05 AM");
        assert_eq!(ClockTime::from_hm(12, 0).unwrap().to_string(), "12:00 PM");
        assert_eq!(ClockTime::from_hm(20, 30).unwrap().to_string(), "8:30 PM");
    }

    #[test]
    fn rejects_missing_meridiem() {
        assert!(matches!(
            ClockTime::parse("14:30"),
            Err(TimeParseError::MissingMeridiem { .. })
        ));
        assert!(matches!(
            ClockTime::parse(""),
            Err(TimeParseError::MissingMeridiem { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_components() {
        assert!(matches!(
            ClockTime::parse("ab:30 PM"),
            Err(TimeParseError::NonNumeric {
                component: "hour",
                ..
            })
        ));
        assert!(matches!(
            ClockTime::parse("8:x0 PM"),
            Err(TimeParseError::NonNumeric {
                component: "minute",
                ..
            })
        ));
        assert!(matches!(
            ClockTime::parse("830 PM"),
            Err(TimeParseError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_instead_of_clamping() {
        assert!(matches!(
            ClockTime::parse("13:00 PM"),
            Err(TimeParseError::HourOutOfRange { hour: 13, .. })
        ));
        assert!(matches!(
            ClockTime::parse("0:15 AM"),
            Err(TimeParseError::HourOutOfRange { hour: 0, .. })
        ));
        assert!(matches!(
            ClockTime::parse("8:75 AM"),
            Err(TimeParseError::MinuteOutOfRange { minute: 75, .. })
        ));
        assert!(ClockTime::from_minutes(1440).is_err());
    }

    #[test]
    fn serde_uses_canonical_string() {
        let time = ClockTime::parse("7:45 pm").unwrap();
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, r#""7:45 PM""#);
        let parsed: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, time);
        assert!(serde_json::from_str::<ClockTime>(r#""noon""#).is_err());
    }

    #[test]
    fn distance_is_symmetric() {
        let a = ClockTime::parse("8:00 AM").unwrap();
        let b = ClockTime::parse("8:50 AM").unwrap();
        assert_eq!(a.distance(b), 50);
        assert_eq!(b.distance(a), 50);
    }
}

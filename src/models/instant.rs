use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::TimestampFormatError;

// `YYYY-MM-DDTHH:MM:SS` with optional fractional seconds and UTC offset.
static API_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.\d{1,9})?(?:Z|[+-]\d{2}:\d{2})?$")
        .expect("static datetime pattern")
});
static BIRTH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("static date pattern"));
static BIRTH_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2}))?$").expect("static time pattern"));

/// Local wall-clock timestamp with whole-second resolution and no zone.
///
/// Field order matters: the derived `Ord` compares year, month, day, hour,
/// minute, second in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Instant {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Instant {
    pub const fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// The (year, month, day) triple used for birth/now ordering checks.
    pub fn date_key(&self) -> (i32, u32, u32) {
        (self.year, self.month, self.day)
    }

    /// Returns `None` for instants that are not real calendar moments.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)
    }

    /// Parses the leading timestamp of a time-service `datetime` field,
    /// e.g. `2025-05-24T18:30:00.123456-05:00`. The offset is checked for
    /// shape but discarded: the instant stays in the service's local time.
    pub fn parse_api_datetime(value: &str) -> Result<Self, TimestampFormatError> {
        let caps = API_DATETIME
            .captures(value.trim())
            .ok_or_else(|| TimestampFormatError::Pattern {
                field: "datetime",
                value: value.to_string(),
                expected: "YYYY-MM-DDTHH:MM:SS[.f][offset]",
            })?;

        let date = checked_date("datetime", value, &caps, 1)?;
        let time = checked_time(
            "datetime",
            value,
            number(&caps, 4, "datetime", value)?,
            number(&caps, 5, "datetime", value)?,
            number(&caps, 6, "datetime", value)?,
        )?;
        Ok(date.and_time(time).into())
    }

    /// Parses configured birth fields: `YYYY-MM-DD` plus `HH:MM` or
    /// `HH:MM:SS`. Seconds default to zero.
    pub fn parse_birth(date: &str, time: &str) -> Result<Self, TimestampFormatError> {
        let date_caps = BIRTH_DATE
            .captures(date.trim())
            .ok_or_else(|| TimestampFormatError::Pattern {
                field: "birth date",
                value: date.to_string(),
                expected: "YYYY-MM-DD",
            })?;
        let time_caps = BIRTH_TIME
            .captures(time.trim())
            .ok_or_else(|| TimestampFormatError::Pattern {
                field: "birth time",
                value: time.to_string(),
                expected: "HH:MM or HH:MM:SS",
            })?;

        let naive_date = checked_date("birth date", date, &date_caps, 1)?;
        let second = match time_caps.get(3) {
            Some(_) => number(&time_caps, 3, "birth time", time)?,
            None => 0,
        };
        let naive_time = checked_time(
            "birth time",
            time,
            number(&time_caps, 1, "birth time", time)?,
            number(&time_caps, 2, "birth time", time)?,
            second,
        )?;
        Ok(naive_date.and_time(naive_time).into())
    }
}

impl From<NaiveDateTime> for Instant {
    fn from(value: NaiveDateTime) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
        }
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn number(
    caps: &Captures<'_>,
    index: usize,
    field: &'static str,
    raw: &str,
) -> Result<u32, TimestampFormatError> {
    caps.get(index)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or_else(|| TimestampFormatError::Pattern {
            field,
            value: raw.to_string(),
            expected: "numeric fields",
        })
}

fn checked_date(
    field: &'static str,
    raw: &str,
    caps: &Captures<'_>,
    first: usize,
) -> Result<NaiveDate, TimestampFormatError> {
    let year = number(caps, first, field, raw)? as i32;
    let month = number(caps, first + 1, field, raw)?;
    let day = number(caps, first + 2, field, raw)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| TimestampFormatError::OutOfRange {
        field,
        value: raw.to_string(),
    })
}

fn checked_time(
    field: &'static str,
    raw: &str,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<NaiveTime, TimestampFormatError> {
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| TimestampFormatError::OutOfRange {
        field,
        value: raw.to_string(),
    })
}

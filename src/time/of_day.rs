//! Minute-resolution time of day.
//!
//! Schedule boundaries are stored as minutes since local midnight. Construction
//! always yields a value in `[0, 1440)`: out-of-range hours and minutes are
//! clamped, and only text that is not a time at all is rejected.

use anyhow::Result;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::constants::{MAXIMUM_HOUR, MAXIMUM_MINUTE, MINUTES_PER_DAY, MINUTES_PER_HOUR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

/// Result of building a [`TimeOfDay`] from possibly out-of-range parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamped {
    pub value: TimeOfDay,
    /// True when the hour or minute had to be moved into range.
    pub adjusted: bool,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { minutes: 0 };

    /// Wrap any minute count into a single day.
    pub fn from_minutes(minutes: u16) -> Self {
        Self {
            minutes: minutes % MINUTES_PER_DAY,
        }
    }

    /// Build from hour and minute, clamping hour to 0-23 and minute to 0-59.
    pub fn clamped(hour: i64, minute: i64) -> Clamped {
        let h = hour.clamp(0, MAXIMUM_HOUR);
        let m = minute.clamp(0, MAXIMUM_MINUTE);
        Clamped {
            value: Self {
                minutes: h as u16 * MINUTES_PER_HOUR + m as u16,
            },
            adjusted: h != hour || m != minute,
        }
    }

    /// Build from an hour-of-day integer (`7` is `07:00`).
    pub fn from_hour(hour: i64) -> Clamped {
        Self::clamped(hour, 0)
    }

    pub fn from_time(time: NaiveTime) -> Self {
        Self::from_minutes(time.hour() as u16 * MINUTES_PER_HOUR + time.minute() as u16)
    }

    /// Parse `"HH:MM"` or `"HH:MM:SS"`, clamping out-of-range fields.
    ///
    /// Seconds are accepted for compatibility and dropped.
    pub fn parse_clamped(text: &str) -> Result<Clamped> {
        let trimmed = text.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            anyhow::bail!("'{trimmed}' is not a time of day (expected HH:MM)");
        }
        let mut fields = Vec::with_capacity(parts.len());
        for part in &parts {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                anyhow::bail!("'{trimmed}' is not a time of day (expected HH:MM)");
            }
            // Digits only, so a failed parse is an overflow and clamps like any large value
            fields.push(part.parse::<i64>().unwrap_or(i64::MAX));
        }
        Ok(Self::clamped(fields[0], fields[1]))
    }

    pub fn minutes(&self) -> u16 {
        self.minutes
    }

    pub fn hour(&self) -> u16 {
        self.minutes / MINUTES_PER_HOUR
    }

    pub fn minute(&self) -> u16 {
        self.minutes % MINUTES_PER_HOUR
    }

    /// Minutes from `self` forward to `later`, wrapping past midnight.
    pub fn minutes_until(&self, later: TimeOfDay) -> u16 {
        (later.minutes + MINUTES_PER_DAY - self.minutes) % MINUTES_PER_DAY
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    /// Strict parse: out-of-range fields are an error here.
    fn from_str(s: &str) -> Result<Self> {
        let clamped = Self::parse_clamped(s)?;
        if clamped.adjusted {
            anyhow::bail!("'{}' is out of range (00:00-23:59)", s.trim());
        }
        Ok(clamped.value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

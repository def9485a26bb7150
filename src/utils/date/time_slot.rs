// Time-of-day slots
// Labels such as "9:00 AM" used by the week grid and the drop-target contract

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::DateError;

/// A time-of-day row in the calendar grid.
///
/// Stored as 24-hour components so slots order naturally; rendered and parsed
/// as 12-hour labels (`"10:00 AM"`), which is the form carried by drop targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    hour: u32,
    minute: u32,
}

impl TimeSlot {
    pub fn new(hour: u32, minute: u32) -> Result<Self, DateError> {
        if hour > 23 || minute > 59 {
            return Err(DateError::InvalidTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Parse a 12-hour label like `"9:00 AM"` or `"12:30 pm"`.
    pub fn parse(label: &str) -> Result<Self, DateError> {
        let invalid = || DateError::InvalidTimeLabel(label.to_string());

        let trimmed = label.trim();
        let (clock, meridiem) = trimmed.split_once(' ').ok_or_else(invalid)?;
        let (hours, minutes) = match clock.split_once(':') {
            Some((h, m)) => (h, m),
            None => (clock, "0"),
        };

        let hours: u32 = hours.parse().map_err(|_| invalid())?;
        let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&hours) || minutes > 59 {
            return Err(invalid());
        }

        let hour = match meridiem.trim().to_ascii_uppercase().as_str() {
            "AM" if hours == 12 => 0,
            "AM" => hours,
            "PM" if hours == 12 => 12,
            "PM" => hours + 12,
            _ => return Err(invalid()),
        };

        Ok(Self { hour, minute: minutes })
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Latest slot in `slots` that starts at or before `time`, falling back to
    /// the first slot when `time` is earlier than all of them.
    pub fn floor_in(slots: &[TimeSlot], time: NaiveTime) -> Option<TimeSlot> {
        slots
            .iter()
            .copied()
            .filter(|slot| slot.to_naive_time() <= time)
            .max()
            .or_else(|| slots.iter().copied().min())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (display_hour, meridiem) = match self.hour {
            0 => (12, "AM"),
            1..=11 => (self.hour, "AM"),
            12 => (12, "PM"),
            _ => (self.hour - 12, "PM"),
        };
        write!(f, "{}:{:02} {}", display_hour, self.minute, meridiem)
    }
}

impl FromStr for TimeSlot {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

/// Hourly slots from 9:00 AM through 6:00 PM.
pub fn default_slots() -> Vec<TimeSlot> {
    (9..=18).map(|hour| TimeSlot { hour, minute: 0 }).collect()
}

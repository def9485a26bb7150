// Date utility functions
// Calendar grid generation, slot keys and slot-to-timestamp conversion

mod time_slot;

pub use time_slot::{default_slots, TimeSlot};

use chrono::{
    DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, SecondsFormat,
    TimeZone, Utc, Weekday,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("unrecognized time label '{0}'")]
    InvalidTimeLabel(String),
    #[error("invalid time of day {hour}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
    #[error("invalid date key '{0}', expected YYYY-MM-DD")]
    InvalidDateKey(String),
}

/// One cell of a week or month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub short_day_name: String,
    pub day_number: u32,
    pub is_today: bool,
    /// False for the leading/trailing days a month grid borrows from its neighbours.
    pub in_month: bool,
}

impl CalendarDay {
    fn new(date: NaiveDate, today: NaiveDate, month: u32) -> Self {
        Self {
            date,
            day_name: date.format("%A").to_string(),
            short_day_name: date.format("%a").to_string(),
            day_number: date.day(),
            is_today: date == today,
            in_month: date.month() == month,
        }
    }

    pub fn key(&self) -> String {
        date_key(self.date)
    }
}

/// Canonical `YYYY-MM-DD` key for a calendar day.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Key for the calendar day `moment` falls on in its own timezone.
///
/// Never goes through UTC: 23:30 local on June 10 is keyed June 10 even when
/// the UTC instant is already June 11.
pub fn local_date_key<Tz: TimeZone>(moment: &DateTime<Tz>) -> String {
    date_key(moment.date_naive())
}

pub fn parse_date_key(key: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d")
        .map_err(|_| DateError::InvalidDateKey(key.to_string()))
}

pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday-through-Sunday week containing `reference`.
pub fn week_of(reference: NaiveDate, today: NaiveDate) -> Vec<CalendarDay> {
    let monday = start_of_week(reference);
    monday
        .iter_days()
        .take(7)
        .map(|date| CalendarDay::new(date, today, reference.month()))
        .collect()
}

/// Whole Monday-first weeks covering the month that contains `reference`.
pub fn month_of(reference: NaiveDate, today: NaiveDate) -> Vec<CalendarDay> {
    let first = reference.with_day(1).unwrap_or(reference);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);

    let grid_start = start_of_week(first);
    let trailing = 6 - last.weekday().num_days_from_monday() as i64;
    let grid_end = last + Duration::days(trailing);

    grid_start
        .iter_days()
        .take_while(|date| *date <= grid_end)
        .map(|date| CalendarDay::new(date, today, reference.month()))
        .collect()
}

pub fn previous_week(reference: NaiveDate) -> NaiveDate {
    reference - Duration::days(7)
}

pub fn next_week(reference: NaiveDate) -> NaiveDate {
    reference + Duration::days(7)
}

/// Same day one month earlier, clamped to the end of shorter months.
pub fn previous_month(reference: NaiveDate) -> NaiveDate {
    reference
        .checked_sub_months(Months::new(1))
        .unwrap_or(reference)
}

pub fn next_month(reference: NaiveDate) -> NaiveDate {
    reference
        .checked_add_months(Months::new(1))
        .unwrap_or(reference)
}

/// "June 10-16", or "May 27 - Jun 2" when the week straddles two months.
pub fn week_range_label(days: &[CalendarDay]) -> String {
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return String::new();
    };

    if first.date.month() == last.date.month() {
        format!(
            "{} {}-{}",
            first.date.format("%B"),
            first.day_number,
            last.day_number
        )
    } else {
        format!(
            "{} {} - {} {}",
            first.date.format("%b"),
            first.day_number,
            last.date.format("%b"),
            last.day_number
        )
    }
}

/// Absolute instant for `slot` on `date` in `tz`, seconds zeroed.
///
/// Ambiguous local times (clocks falling back) resolve to the earlier instant.
/// Local times inside a spring-forward gap move to the first minute after it.
pub fn slot_to_timestamp<Tz: TimeZone>(tz: &Tz, date: NaiveDate, slot: TimeSlot) -> DateTime<Tz> {
    let naive = date.and_time(slot.to_naive_time());
    if let Some(resolved) = tz.from_local_datetime(&naive).earliest() {
        return resolved;
    }

    let mut probe = naive;
    for _ in 0..(24 * 60) {
        probe += Duration::minutes(1);
        if let Some(resolved) = tz.from_local_datetime(&probe).earliest() {
            return resolved;
        }
    }

    tz.from_utc_datetime(&naive)
}

/// RFC 3339 UTC form the remote API accepts for a fixed due time.
pub fn to_remote_due<Tz: TimeZone>(moment: &DateTime<Tz>) -> String {
    moment
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Timezone the calendar grid is interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarZone {
    #[default]
    Local,
    Named(chrono_tz::Tz),
}

impl CalendarZone {
    /// Remote due string for `slot` on `date` in this zone.
    pub fn slot_due(&self, date: NaiveDate, slot: TimeSlot) -> String {
        match self {
            CalendarZone::Local => to_remote_due(&slot_to_timestamp(&Local, date, slot)),
            CalendarZone::Named(tz) => to_remote_due(&slot_to_timestamp(tz, date, slot)),
        }
    }

    /// Wall-clock time of `instant` in this zone.
    pub fn local_naive(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            CalendarZone::Local => instant.with_timezone(&Local).naive_local(),
            CalendarZone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.local_naive(Utc::now()).date()
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

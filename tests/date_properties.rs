// Property-based tests for calendar grids, slot keys and due timestamps

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Timelike};
use chrono_tz::America::New_York;
use proptest::prelude::*;

use task_calendar::services::scheduling::SlotKey;
use task_calendar::utils::date::{
    date_key, default_slots, local_date_key, month_of, parse_date_key, slot_to_timestamp,
    start_of_week, to_remote_due, week_of, TimeSlot,
};

fn any_date() -> impl Strategy<Value = NaiveDate> {
    // 2000-01-01 through roughly 2060
    (0i64..22_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn any_slot() -> impl Strategy<Value = TimeSlot> {
    (0u32..24, 0u32..60).prop_map(|(hour, minute)| TimeSlot::new(hour, minute).unwrap())
}

proptest! {
    /// A week grid is always Monday through Sunday and contains its reference day
    #[test]
    fn prop_week_contains_reference(date in any_date()) {
        let week = week_of(date, date);
        prop_assert_eq!(week.len(), 7);
        prop_assert_eq!(week[0].date.weekday(), chrono::Weekday::Mon);
        prop_assert!(week.iter().any(|day| day.date == date && day.is_today));
    }

    /// A month grid is made of whole weeks and holds every day of the month
    #[test]
    fn prop_month_grid_whole_weeks(date in any_date()) {
        let month = month_of(date, date);
        prop_assert_eq!(month.len() % 7, 0);
        prop_assert!(month.len() >= 28 && month.len() <= 42);
        prop_assert_eq!(month[0].date, start_of_week(date.with_day(1).unwrap()));

        let in_month: Vec<_> = month.iter().filter(|day| day.in_month).collect();
        prop_assert_eq!(in_month[0].date.day(), 1);
        prop_assert!(in_month.iter().all(|day| day.date.month() == date.month()));
        let next = in_month.last().unwrap().date + Duration::days(1);
        prop_assert_ne!(next.month(), date.month());
    }

    /// Slot keys read back to the same cell
    #[test]
    fn prop_slot_key_round_trip(date in any_date(), slot in any_slot()) {
        let key = SlotKey::new(date, slot);
        let parsed: SlotKey = key.to_string().parse().unwrap();
        prop_assert_eq!(parsed, key);
    }

    /// Slot labels read back to the same time of day
    #[test]
    fn prop_time_label_round_trip(slot in any_slot()) {
        prop_assert_eq!(TimeSlot::parse(&slot.label()).unwrap(), slot);
    }
}

#[test]
fn test_every_day_of_2024_keys_back_to_itself_in_new_york() {
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    while date < end {
        let key = date_key(date);
        assert_eq!(parse_date_key(&key).unwrap(), date);

        // Late evening local is already the next day in UTC.
        let late = New_York
            .with_ymd_and_hms(date.year(), date.month(), date.day(), 23, 0, 0)
            .unwrap();
        assert_eq!(local_date_key(&late), key);

        for slot in default_slots() {
            let due = slot_to_timestamp(&New_York, date, slot);
            assert_eq!(local_date_key(&due), key, "{} on {}", slot, key);
            assert_eq!(due.hour(), slot.hour());
            assert_eq!(due.second(), 0);
        }

        date += Duration::days(1);
    }
}

#[test]
fn test_due_strings_follow_daylight_saving() {
    let ten = TimeSlot::new(10, 0).unwrap();
    let cases = [
        ((2024, 3, 9), "2024-03-09T15:00:00Z"),
        ((2024, 3, 10), "2024-03-10T14:00:00Z"),
        ((2024, 11, 2), "2024-11-02T14:00:00Z"),
        ((2024, 11, 3), "2024-11-03T15:00:00Z"),
    ];

    for ((y, m, d), expected) in cases {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(to_remote_due(&slot_to_timestamp(&New_York, date, ten)), expected);
    }
}

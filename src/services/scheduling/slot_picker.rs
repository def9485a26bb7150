use chrono::NaiveDate;

use crate::utils::date::TimeSlot;

use super::placement::{PlacementIndex, SlotKey};

/// Time for a date-grained drop: the least occupied slot on `date`.
///
/// Ties go to the earliest slot, so an empty slot wins whenever there is one.
/// Returns `None` only when `slots` is empty.
pub fn pick_slot(index: &PlacementIndex, date: NaiveDate, slots: &[TimeSlot]) -> Option<TimeSlot> {
    slots
        .iter()
        .copied()
        .min_by_key(|slot| (index.count(&SlotKey::new(date, *slot)), *slot))
}

// Conversion between remote items and local tasks

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::task::{normalize_labels, Priority, Task};
use crate::utils::date::CalendarZone;

use super::protocol::{RemoteDue, RemoteItem};

/// A due date as the calendar grid sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallDue {
    /// A specific wall-clock time in the calendar's zone.
    Timed(NaiveDateTime),
    /// A day with no time of day.
    AllDay(NaiveDate),
}

impl WallDue {
    pub fn date(&self) -> NaiveDate {
        match self {
            WallDue::Timed(at) => at.date(),
            WallDue::AllDay(date) => *date,
        }
    }
}

/// Interpret a remote due date.
///
/// The server sends one of three shapes: a UTC instant (`...Z`), a floating
/// local time (`YYYY-MM-DDTHH:MM:SS`), or a bare date. Instants are converted
/// into `zone`; floating times are already wall-clock.
pub fn parse_due(due: &RemoteDue, zone: &CalendarZone) -> Option<WallDue> {
    let raw = due.date.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(WallDue::Timed(zone.local_naive(instant.with_timezone(&Utc))));
    }

    if let Ok(floating) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(WallDue::Timed(floating));
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(WallDue::AllDay(day));
    }

    log::warn!("Ignoring unrecognized due date '{}'", raw);
    None
}

pub fn item_to_task(item: &RemoteItem) -> Task {
    Task {
        id: item.id.clone(),
        title: item.content.clone(),
        description: item.description.clone(),
        priority: Priority::from_remote(item.priority),
        labels: normalize_labels(&item.labels),
        project_id: item.project_id.clone(),
    }
}

/// Refresh content fields of `task` from an authoritative echo, keeping the id.
pub fn merge_item_content(task: &Task, item: &RemoteItem) -> Task {
    Task {
        id: task.id.clone(),
        ..item_to_task(item)
    }
}

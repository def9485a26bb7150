use chrono::NaiveDate;

use crate::services::scheduling::placement::SlotKey;
use crate::utils::date::{parse_date_key, TimeSlot};

use super::DragError;

/// Role an element plays in the drop-target contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A cell in a week column.
    TimeSlot,
    /// The row header of the week grid. Styled like a slot, never a target.
    TimeLabel,
    /// A day cell in the month grid.
    MonthDay,
    /// The list of unscheduled tasks.
    UnscheduledTray,
    /// Anything else: task cards, text, decorations.
    Other,
}

/// One element of the hit path under a pointer, with its raw attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            date: None,
            time: None,
        }
    }

    pub fn time_slot(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self::new(ElementKind::TimeSlot).with_date(date).with_time(time)
    }

    pub fn time_label(time: impl Into<String>) -> Self {
        Self::new(ElementKind::TimeLabel).with_time(time)
    }

    pub fn month_day(date: impl Into<String>) -> Self {
        Self::new(ElementKind::MonthDay).with_date(date)
    }

    pub fn tray() -> Self {
        Self::new(ElementKind::UnscheduledTray)
    }

    pub fn other() -> Self {
        Self::new(ElementKind::Other)
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

/// Where a drop lands once the zone has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropTarget {
    /// Time-grained: a week-view cell.
    Slot(SlotKey),
    /// Date-grained: a month-view day. The time is picked later.
    Day(NaiveDate),
    /// Back to the unscheduled list.
    Unplaced,
}

/// Find the drop zone for a hit path ordered innermost element first.
///
/// The first slot, day cell or tray found wins; nested task cards are
/// skipped. A row label ends the search with no target. A zone with missing
/// or malformed attributes is an error.
pub fn resolve_drop_target(path: &[Element]) -> Result<Option<DropTarget>, DragError> {
    for element in path {
        match element.kind {
            ElementKind::TimeSlot => {
                let date = required(element.date.as_deref(), "date")?;
                let time = required(element.time.as_deref(), "time")?;
                let key = SlotKey::new(parse_date(date)?, parse_time(time)?);
                return Ok(Some(DropTarget::Slot(key)));
            }
            ElementKind::TimeLabel => return Ok(None),
            ElementKind::MonthDay => {
                let date = required(element.date.as_deref(), "date")?;
                return Ok(Some(DropTarget::Day(parse_date(date)?)));
            }
            ElementKind::UnscheduledTray => return Ok(Some(DropTarget::Unplaced)),
            ElementKind::Other => continue,
        }
    }
    Ok(None)
}

fn required<'a>(value: Option<&'a str>, attribute: &'static str) -> Result<&'a str, DragError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(DragError::MissingAttribute(attribute))
}

fn parse_date(value: &str) -> Result<NaiveDate, DragError> {
    parse_date_key(value).map_err(|_| DragError::InvalidAttribute {
        attribute: "date",
        value: value.to_string(),
    })
}

fn parse_time(value: &str) -> Result<TimeSlot, DragError> {
    TimeSlot::parse(value).map_err(|_| DragError::InvalidAttribute {
        attribute: "time",
        value: value.to_string(),
    })
}

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::models::task::Task;
use crate::utils::date::{date_key, parse_date_key, DateError, TimeSlot};

/// A calendar cell: one day plus one time-of-day row.
///
/// Renders as `2024-06-10-10:00 AM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub time: TimeSlot,
}

impl SlotKey {
    pub fn new(date: NaiveDate, time: TimeSlot) -> Self {
        Self { date, time }
    }

    /// Build from the raw `date`/`time` attributes of a drop target.
    pub fn from_attributes(date: &str, time: &str) -> Result<Self, DateError> {
        Ok(Self::new(parse_date_key(date)?, TimeSlot::parse(time)?))
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", date_key(self.date), self.time)
    }
}

impl FromStr for SlotKey {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The date part is fixed width; the label follows the separating dash.
        let (date, time) = match (s.get(..10), s.get(10..11), s.get(11..)) {
            (Some(date), Some("-"), Some(time)) => (date, time),
            _ => return Err(DateError::InvalidDateKey(s.to_string())),
        };
        Self::from_attributes(date, time)
    }
}

/// Scheduled tasks grouped by cell, each bucket in insertion order.
///
/// Buckets never stay empty: removing the last task drops the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementIndex {
    buckets: BTreeMap<SlotKey, Vec<Task>>,
}

impl PlacementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks_at(&self, key: &SlotKey) -> &[Task] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, key: &SlotKey) -> usize {
        self.buckets.get(key).map_or(0, Vec::len)
    }

    pub fn contains_key(&self, key: &SlotKey) -> bool {
        self.buckets.contains_key(key)
    }

    pub fn push(&mut self, key: SlotKey, task: Task) {
        self.buckets.entry(key).or_default().push(task);
    }

    /// Insert at `index`, clamped to the bucket length.
    pub fn insert_at(&mut self, key: SlotKey, index: usize, task: Task) {
        let bucket = self.buckets.entry(key).or_default();
        let index = index.min(bucket.len());
        bucket.insert(index, task);
    }

    pub fn locate(&self, task_id: &str) -> Option<(SlotKey, usize)> {
        self.buckets.iter().find_map(|(key, tasks)| {
            tasks
                .iter()
                .position(|task| task.id == task_id)
                .map(|index| (*key, index))
        })
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.buckets
            .values()
            .flat_map(|tasks| tasks.iter())
            .find(|task| task.id == task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.buckets
            .values_mut()
            .flat_map(|tasks| tasks.iter_mut())
            .find(|task| task.id == task_id)
    }

    /// Remove a task by id, wherever it sits.
    pub fn remove(&mut self, task_id: &str) -> Option<(SlotKey, usize, Task)> {
        let (key, index) = self.locate(task_id)?;
        let bucket = self.buckets.get_mut(&key)?;
        let task = bucket.remove(index);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        Some((key, index, task))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &[Task])> {
        self.buckets
            .iter()
            .map(|(key, tasks)| (key, tasks.as_slice()))
    }

    pub fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = (&SlotKey, &[Task])> {
        self.iter().filter(move |(key, _)| key.date == date)
    }

    /// Number of placed tasks, not buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(day: u32, hour: u32) -> SlotKey {
        SlotKey::new(
            NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            TimeSlot::new(hour, 0).unwrap(),
        )
    }

    fn task(id: &str) -> Task {
        Task::new(id, format!("Task {}", id)).unwrap()
    }

    #[test]
    fn test_slot_key_display_and_parse() {
        let slot = key(10, 10);
        assert_eq!(slot.to_string(), "2024-06-10-10:00 AM");
        assert_eq!("2024-06-10-10:00 AM".parse::<SlotKey>().unwrap(), slot);
        assert_eq!("2024-06-10-3:00 PM".parse::<SlotKey>().unwrap(), key(10, 15));
        assert!("2024-06-10".parse::<SlotKey>().is_err());
        assert!("2024-06-10 10:00 AM".parse::<SlotKey>().is_err());
    }

    #[test]
    fn test_remove_drops_empty_buckets() {
        let mut index = PlacementIndex::new();
        index.push(key(10, 9), task("1"));
        index.push(key(10, 9), task("2"));

        let (slot, position, removed) = index.remove("1").unwrap();
        assert_eq!(slot, key(10, 9));
        assert_eq!(position, 0);
        assert_eq!(removed.id, "1");
        assert!(index.contains_key(&key(10, 9)));

        index.remove("2");
        assert!(!index.contains_key(&key(10, 9)));
        assert!(index.is_empty());
        assert!(index.remove("2").is_none());
    }

    #[test]
    fn test_insert_at_clamps() {
        let mut index = PlacementIndex::new();
        index.push(key(10, 9), task("1"));
        index.insert_at(key(10, 9), 7, task("2"));
        index.insert_at(key(10, 9), 0, task("3"));

        let ids: Vec<&str> = index
            .tasks_at(&key(10, 9))
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_on_date_filters_by_day() {
        let mut index = PlacementIndex::new();
        index.push(key(10, 9), task("1"));
        index.push(key(10, 11), task("2"));
        index.push(key(11, 9), task("3"));

        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(index.on_date(date).count(), 2);
        assert_eq!(index.locate("3"), Some((key(11, 9), 0)));
    }
}

// Schedule board
// The local view of every known task: unscheduled, or in exactly one slot

use std::collections::HashSet;

use crate::models::task::{Task, TaskEdit};
use crate::services::todoist::{item_to_task, merge_item_content, parse_due, RemoteItem, WallDue};
use crate::utils::date::{CalendarZone, TimeSlot};

use super::error::ScheduleError;
use super::placement::{PlacementIndex, SlotKey};
use super::slot_picker::pick_slot;

/// Where a task currently sits, with its position in that list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Unplaced { index: usize },
    Placed { key: SlotKey, index: usize },
}

impl Location {
    pub fn slot(&self) -> Option<SlotKey> {
        match self {
            Location::Unplaced { .. } => None,
            Location::Placed { key, .. } => Some(*key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Unplaced,
    Slot(SlotKey),
}

/// An applied move awaiting the server's answer.
///
/// Hand it back to [`ScheduleBoard::commit`] or [`ScheduleBoard::rollback`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PendingMove {
    original: Task,
    from: Location,
    to: Destination,
}

impl PendingMove {
    pub fn task_id(&self) -> &str {
        &self.original.id
    }

    pub fn original(&self) -> &Task {
        &self.original
    }

    pub fn from(&self) -> Location {
        self.from
    }

    pub fn to(&self) -> Destination {
        self.to
    }
}

/// An applied content edit awaiting the server's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PendingEdit {
    original: Task,
    edited: Task,
}

impl PendingEdit {
    pub fn task_id(&self) -> &str {
        &self.original.id
    }

    pub fn edited(&self) -> &Task {
        &self.edited
    }
}

/// Any applied change that still waits for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum PendingChange {
    Move(PendingMove),
    Edit(PendingEdit),
    /// Reservation held while a deletion is confirmed; the board is untouched.
    Delete(String),
}

impl PendingChange {
    pub fn task_id(&self) -> &str {
        match self {
            PendingChange::Move(pending) => pending.task_id(),
            PendingChange::Edit(pending) => pending.task_id(),
            PendingChange::Delete(task_id) => task_id,
        }
    }
}

/// Unscheduled list plus placement index.
///
/// Every task id lives in exactly one of the two. Each task has at most one
/// change in flight; moves of different tasks may interleave freely because
/// settling always finds the task by id.
#[derive(Debug, Clone, Default)]
pub struct ScheduleBoard {
    unplaced: Vec<Task>,
    placements: PlacementIndex,
    in_flight: HashSet<String>,
}

impl ScheduleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the board from a full snapshot.
    ///
    /// Items without a usable due date are unplaced. Deleted and completed
    /// items are skipped.
    pub fn seed(items: &[RemoteItem], zone: &CalendarZone, slots: &[TimeSlot]) -> Self {
        let mut board = Self::new();

        for item in items.iter().filter(|item| item.is_active()) {
            if board.contains(&item.id) {
                log::warn!("Skipping duplicate item {} in snapshot", item.id);
                continue;
            }

            let due = item.due.as_ref().and_then(|due| parse_due(due, zone));
            let destination = board.destination_for(due, slots);
            board.attach(item_to_task(item), destination);
        }

        log::info!(
            "Board seeded with {} scheduled and {} unscheduled tasks",
            board.placements.len(),
            board.unplaced.len()
        );
        board
    }

    /// Replace the board with a full snapshot.
    ///
    /// Tasks with a change in flight keep their local value and position so
    /// the change can still be settled or rolled back.
    pub fn reseed(&mut self, items: &[RemoteItem], zone: &CalendarZone, slots: &[TimeSlot]) {
        let mut fresh = Self::seed(items, zone, slots);

        for task_id in &self.in_flight {
            let (Some(location), Some(task)) = (self.locate(task_id), self.task(task_id)) else {
                continue;
            };
            fresh.detach(task_id);
            match location {
                Location::Unplaced { index } => {
                    let index = index.min(fresh.unplaced.len());
                    fresh.unplaced.insert(index, task.clone());
                }
                Location::Placed { key, index } => {
                    fresh.placements.insert_at(key, index, task.clone())
                }
            }
        }

        fresh.in_flight = std::mem::take(&mut self.in_flight);
        *self = fresh;
    }

    /// Fold an incremental snapshot into the board.
    ///
    /// Deleted and completed items leave the board. Changed items are updated
    /// in place when their due date still maps to where they sit, and moved
    /// otherwise. Items with a change in flight are left to that change.
    pub fn apply_delta(&mut self, items: &[RemoteItem], zone: &CalendarZone, slots: &[TimeSlot]) {
        for item in items {
            if self.is_in_flight(&item.id) {
                log::debug!("Task {} has a change in flight; skipping its update", item.id);
                continue;
            }

            if !item.is_active() {
                if self.detach(&item.id).is_some() {
                    log::info!("Task {} was completed or deleted remotely", item.id);
                }
                continue;
            }

            let task = item_to_task(item);
            let due = item.due.as_ref().and_then(|due| parse_due(due, zone));
            let stays = match (self.locate(&item.id), due) {
                (Some(Location::Unplaced { .. }), None) => true,
                (Some(Location::Placed { key, .. }), Some(WallDue::AllDay(date))) => key.date == date,
                (Some(Location::Placed { key, .. }), Some(WallDue::Timed(_))) => {
                    self.destination_for(due, slots) == Destination::Slot(key)
                }
                _ => false,
            };

            if stays {
                self.replace(&item.id, task);
                continue;
            }

            self.detach(&item.id);
            let destination = self.destination_for(due, slots);
            self.attach(task, destination);
        }
    }

    pub fn unplaced(&self) -> &[Task] {
        &self.unplaced
    }

    pub fn placements(&self) -> &PlacementIndex {
        &self.placements
    }

    pub fn unplaced_in_project<'a>(&'a self, project_id: &'a str) -> impl Iterator<Item = &'a Task> {
        self.unplaced
            .iter()
            .filter(move |task| task.project_id.as_deref() == Some(project_id))
    }

    pub fn locate(&self, task_id: &str) -> Option<Location> {
        if let Some(index) = self.unplaced.iter().position(|task| task.id == task_id) {
            return Some(Location::Unplaced { index });
        }
        self.placements
            .locate(task_id)
            .map(|(key, index)| Location::Placed { key, index })
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.unplaced
            .iter()
            .find(|task| task.id == task_id)
            .or_else(|| self.placements.get(task_id))
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.locate(task_id).is_some()
    }

    pub fn is_in_flight(&self, task_id: &str) -> bool {
        self.in_flight.contains(task_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Total number of known tasks.
    pub fn len(&self) -> usize {
        self.unplaced.len() + self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a task that is new to the board.
    pub fn insert_unplaced(&mut self, task: Task) -> Result<(), ScheduleError> {
        if self.contains(&task.id) {
            return Err(ScheduleError::precondition(format!(
                "task {} is already on the board",
                task.id
            )));
        }
        self.unplaced.push(task);
        Ok(())
    }

    /// Move a task right away and remember how to undo it.
    pub fn begin_move(&mut self, task_id: &str, to: Destination) -> Result<PendingMove, ScheduleError> {
        self.ensure_settled(task_id)?;
        let from = self
            .locate(task_id)
            .ok_or_else(|| ScheduleError::UnknownTask(task_id.to_string()))?;

        match (from, to) {
            (Location::Unplaced { .. }, Destination::Unplaced) => {
                return Err(ScheduleError::precondition(format!(
                    "task {} is not scheduled",
                    task_id
                )));
            }
            (Location::Placed { key, .. }, Destination::Slot(target)) if key == target => {
                return Err(ScheduleError::precondition(format!(
                    "task {} is already in {}",
                    task_id, key
                )));
            }
            _ => {}
        }

        let original = self
            .detach(task_id)
            .ok_or_else(|| ScheduleError::UnknownTask(task_id.to_string()))?;
        self.attach(original.clone(), to);
        self.in_flight.insert(task_id.to_string());

        Ok(PendingMove { original, from, to })
    }

    /// The server accepted the move. Content from an echoed item is merged in
    /// where the task now sits; its placement is left alone.
    pub fn commit(&mut self, pending: PendingMove, echoed: Option<&RemoteItem>) {
        self.in_flight.remove(pending.task_id());
        if let Some(item) = echoed {
            self.merge_echo(pending.task_id(), item);
        }
    }

    /// Undo a move: the task goes back to its old list and position with the
    /// exact value it had before the move.
    pub fn rollback(&mut self, pending: PendingMove) {
        let PendingMove { original, from, .. } = pending;
        self.in_flight.remove(&original.id);

        if self.detach(&original.id).is_none() {
            log::warn!("Task {} vanished before rollback; restoring it", original.id);
        }

        log::info!("Rolling task {} back to {:?}", original.id, from);
        match from {
            Location::Unplaced { index } => {
                let index = index.min(self.unplaced.len());
                self.unplaced.insert(index, original);
            }
            Location::Placed { key, index } => self.placements.insert_at(key, index, original),
        }
    }

    /// Apply a content edit in place. The task never changes location.
    pub fn begin_edit(&mut self, task_id: &str, edit: &TaskEdit) -> Result<PendingEdit, ScheduleError> {
        self.ensure_settled(task_id)?;
        let original = self
            .task(task_id)
            .cloned()
            .ok_or_else(|| ScheduleError::UnknownTask(task_id.to_string()))?;

        let edited = edit.apply_to(&original);
        self.replace(task_id, edited.clone());
        self.in_flight.insert(task_id.to_string());

        Ok(PendingEdit { original, edited })
    }

    pub fn commit_edit(&mut self, pending: PendingEdit, echoed: Option<&RemoteItem>) {
        self.in_flight.remove(pending.task_id());
        if let Some(item) = echoed {
            self.merge_echo(pending.task_id(), item);
        }
    }

    pub fn rollback_edit(&mut self, pending: PendingEdit) {
        let PendingEdit { original, .. } = pending;
        self.in_flight.remove(&original.id);
        let id = original.id.clone();
        if !self.replace(&id, original) {
            log::warn!("Task {} vanished before its edit was rolled back", id);
        }
    }

    /// Undo whichever kind of change `change` is.
    pub fn abandon(&mut self, change: PendingChange) {
        match change {
            PendingChange::Move(pending) => self.rollback(pending),
            PendingChange::Edit(pending) => self.rollback_edit(pending),
            PendingChange::Delete(task_id) => self.release(&task_id),
        }
    }

    /// Hold a task while a non-optimistic change (deletion) is in flight.
    pub fn reserve(&mut self, task_id: &str) -> Result<(), ScheduleError> {
        self.ensure_settled(task_id)?;
        if !self.contains(task_id) {
            return Err(ScheduleError::UnknownTask(task_id.to_string()));
        }
        self.in_flight.insert(task_id.to_string());
        Ok(())
    }

    pub fn release(&mut self, task_id: &str) {
        self.in_flight.remove(task_id);
    }

    /// Drop a task from the board entirely.
    pub fn remove(&mut self, task_id: &str) -> Option<Task> {
        self.in_flight.remove(task_id);
        self.detach(task_id)
    }

    fn ensure_settled(&self, task_id: &str) -> Result<(), ScheduleError> {
        if self.is_in_flight(task_id) {
            return Err(ScheduleError::precondition(format!(
                "task {} already has a change in flight",
                task_id
            )));
        }
        Ok(())
    }

    /// Timed dues go to the slot at or before their wall-clock time, date-only
    /// dues to the least busy slot of that day.
    fn destination_for(&self, due: Option<WallDue>, slots: &[TimeSlot]) -> Destination {
        let key = match due {
            Some(WallDue::Timed(at)) => {
                TimeSlot::floor_in(slots, at.time()).map(|time| SlotKey::new(at.date(), time))
            }
            Some(WallDue::AllDay(date)) => {
                pick_slot(&self.placements, date, slots).map(|time| SlotKey::new(date, time))
            }
            None => None,
        };
        key.map_or(Destination::Unplaced, Destination::Slot)
    }

    fn detach(&mut self, task_id: &str) -> Option<Task> {
        if let Some(index) = self.unplaced.iter().position(|task| task.id == task_id) {
            return Some(self.unplaced.remove(index));
        }
        self.placements.remove(task_id).map(|(_, _, task)| task)
    }

    fn attach(&mut self, task: Task, to: Destination) {
        match to {
            Destination::Unplaced => self.unplaced.push(task),
            Destination::Slot(key) => self.placements.push(key, task),
        }
    }

    fn replace(&mut self, task_id: &str, value: Task) -> bool {
        let slot = match self.unplaced.iter_mut().find(|task| task.id == task_id) {
            Some(task) => Some(task),
            None => self.placements.get_mut(task_id),
        };
        match slot {
            Some(task) => {
                *task = value;
                true
            }
            None => false,
        }
    }

    fn merge_echo(&mut self, task_id: &str, item: &RemoteItem) {
        if let Some(current) = self.task(task_id) {
            let merged = merge_item_content(current, item);
            self.replace(task_id, merged);
        }
    }
}

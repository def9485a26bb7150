// Scheduling service
// Optimistic scheduling against the remote task service

use std::rc::Rc;

use chrono::NaiveDate;

use crate::models::label::Label;
use crate::models::project::Project;
use crate::models::settings::Settings;
use crate::models::task::{NewTask, Task, TaskEdit};
use crate::services::drag::{DragTracker, DropIntent, DropTarget};
use crate::services::notice::{Notice, NoticeLog};
use crate::services::todoist::{
    item_to_task, Command, CommandReport, ResourceKind, SyncError, TaskBackend,
};
use crate::utils::date::{CalendarZone, TimeSlot};

use super::board::{Destination, PendingChange, ScheduleBoard};
use super::error::ScheduleError;
use super::placement::SlotKey;
use super::slot_picker::pick_slot;

/// What a scheduling action ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Scheduled(SlotKey),
    Unscheduled,
    /// Malformed gesture or stale target; nothing changed.
    Ignored,
}

/// A change already applied to the board, paired with the command that
/// confirms it.
///
/// Send [`Submission::commands`] through the backend, then hand the result to
/// [`Scheduler::settle`]. If the request is given up, pass it to
/// [`Scheduler::abandon`] so the board is restored.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Submission {
    change: PendingChange,
    command: Command,
}

impl Submission {
    pub fn task_id(&self) -> &str {
        self.change.task_id()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn commands(&self) -> &[Command] {
        std::slice::from_ref(&self.command)
    }
}

/// A confirmed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Scheduled(SlotKey),
    Unscheduled,
    Edited(Task),
    Deleted(Task),
}

impl Settled {
    pub fn outcome(&self) -> DropOutcome {
        match self {
            Settled::Scheduled(key) => DropOutcome::Scheduled(*key),
            Settled::Unscheduled => DropOutcome::Unscheduled,
            Settled::Edited(_) | Settled::Deleted(_) => DropOutcome::Ignored,
        }
    }

    pub fn into_task(self) -> Option<Task> {
        match self {
            Settled::Edited(task) | Settled::Deleted(task) => Some(task),
            Settled::Scheduled(_) | Settled::Unscheduled => None,
        }
    }
}

/// Owns the board, the drag tracker, and the catalog of projects and labels.
///
/// Every mutating call changes the board before its request is sent. A failed
/// request restores the board and records an error notice.
///
/// The async operations below run one change start to finish. Callers that
/// want several requests in flight use the `begin_*` methods, await the
/// submissions on [`Scheduler::backend_handle`] themselves, and settle each
/// one in whatever order the answers arrive.
pub struct Scheduler<B: TaskBackend> {
    backend: Rc<B>,
    board: ScheduleBoard,
    drag: DragTracker,
    zone: CalendarZone,
    slots: Vec<TimeSlot>,
    projects: Vec<Project>,
    labels: Vec<Label>,
    notices: NoticeLog,
}

impl<B: TaskBackend> Scheduler<B> {
    pub fn new(backend: B, settings: &Settings) -> Result<Self, ScheduleError> {
        settings.validate().map_err(ScheduleError::Validation)?;
        let zone = settings.zone().map_err(ScheduleError::Validation)?;

        Ok(Self {
            backend: Rc::new(backend),
            board: ScheduleBoard::new(),
            drag: DragTracker::new(settings.touch_drag_threshold_px),
            zone,
            slots: settings.sorted_slots(),
            projects: Vec::new(),
            labels: Vec::new(),
            notices: NoticeLog::new(),
        })
    }

    pub fn board(&self) -> &ScheduleBoard {
        &self.board
    }

    pub fn drag(&self) -> &DragTracker {
        &self.drag
    }

    /// The drag tracker, for feeding it pointer and touch events.
    pub fn drag_mut(&mut self) -> &mut DragTracker {
        &mut self.drag
    }

    pub fn zone(&self) -> &CalendarZone {
        &self.zone
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shared handle to the backend that outlives a borrow of the scheduler.
    pub fn backend_handle(&self) -> Rc<B> {
        Rc::clone(&self.backend)
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn unplaced_in_project<'a>(&'a self, project_id: &'a str) -> Vec<&'a Task> {
        self.board.unplaced_in_project(project_id).collect()
    }

    /// Fetch from the server and fold the result into the board and catalog.
    ///
    /// A full snapshot replaces everything; an incremental one only touches
    /// the items, projects and labels it names.
    pub async fn load(&mut self) -> Result<(), ScheduleError> {
        let snapshot = match self.backend.fetch_all(&ResourceKind::ALL).await {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(self.remote_failure("Failed to load tasks", err)),
        };

        if snapshot.full_sync {
            self.board.reseed(&snapshot.items, &self.zone, &self.slots);
            self.projects = snapshot.projects;
            self.labels = snapshot.labels;
        } else {
            log::debug!(
                "Merging incremental sync: {} items, {} projects, {} labels",
                snapshot.items.len(),
                snapshot.projects.len(),
                snapshot.labels.len()
            );
            self.board.apply_delta(&snapshot.items, &self.zone, &self.slots);
            upsert(&mut self.projects, snapshot.projects, |project| &project.id);
            upsert(&mut self.labels, snapshot.labels, |label| &label.id);
        }
        Ok(())
    }

    /// Settle a finished drag from either input modality.
    ///
    /// Malformed drops are logged and reported as `Ignored`; remote failures
    /// are rolled back and returned.
    pub async fn handle_drop(&mut self, intent: DropIntent) -> Result<DropOutcome, ScheduleError> {
        match self.begin_drop(intent)? {
            Some(submission) => Ok(self.run(submission).await?.outcome()),
            None => Ok(DropOutcome::Ignored),
        }
    }

    /// Apply a drop to the board. `None` means the drop was ignored.
    pub fn begin_drop(&mut self, intent: DropIntent) -> Result<Option<Submission>, ScheduleError> {
        let task_id = intent.source.task_id().to_string();

        let Some(target) = intent.target else {
            log::debug!("Drop of task {} landed outside any drop zone", task_id);
            return Ok(None);
        };

        if let (Some(origin), Some(current)) = (
            intent.source.origin(),
            self.board.locate(&task_id).and_then(|at| at.slot()),
        ) {
            if origin != current {
                log::warn!(
                    "Task {} was dragged from {} but sits in {}; using the board",
                    task_id,
                    origin,
                    current
                );
            }
        }

        let destination = match target {
            DropTarget::Slot(key) => Destination::Slot(key),
            DropTarget::Day(date) => match self.pick_slot_for(date) {
                Some(key) => Destination::Slot(key),
                None => {
                    log::warn!("No time slots configured; ignoring drop on {}", date);
                    return Ok(None);
                }
            },
            DropTarget::Unplaced => Destination::Unplaced,
        };

        match self.begin_move(&task_id, destination) {
            Ok(submission) => Ok(Some(submission)),
            Err(err) if err.is_precondition() => {
                log::warn!("Ignoring drop of task {}: {}", task_id, err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn schedule(&mut self, task_id: &str, key: SlotKey) -> Result<DropOutcome, ScheduleError> {
        let submission = self.begin_schedule(task_id, key)?;
        Ok(self.run(submission).await?.outcome())
    }

    pub fn begin_schedule(&mut self, task_id: &str, key: SlotKey) -> Result<Submission, ScheduleError> {
        self.begin_move(task_id, Destination::Slot(key))
    }

    /// Schedule on a day without a chosen time, like a month-view drop.
    pub async fn schedule_on_day(
        &mut self,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<DropOutcome, ScheduleError> {
        let submission = self.begin_schedule_on_day(task_id, date)?;
        Ok(self.run(submission).await?.outcome())
    }

    pub fn begin_schedule_on_day(
        &mut self,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<Submission, ScheduleError> {
        let key = self
            .pick_slot_for(date)
            .ok_or_else(|| ScheduleError::precondition("no time slots configured"))?;
        self.begin_move(task_id, Destination::Slot(key))
    }

    pub async fn unschedule(&mut self, task_id: &str) -> Result<DropOutcome, ScheduleError> {
        let submission = self.begin_unschedule(task_id)?;
        Ok(self.run(submission).await?.outcome())
    }

    pub fn begin_unschedule(&mut self, task_id: &str) -> Result<Submission, ScheduleError> {
        self.begin_move(task_id, Destination::Unplaced)
    }

    /// Change a task's content without moving it.
    pub async fn edit_task(&mut self, task_id: &str, edit: TaskEdit) -> Result<Task, ScheduleError> {
        edit.validate().map_err(ScheduleError::Validation)?;

        let current = self
            .board
            .task(task_id)
            .cloned()
            .ok_or_else(|| ScheduleError::UnknownTask(task_id.to_string()))?;
        if edit.is_empty() {
            return Ok(current);
        }

        let submission = self.begin_edit(task_id, &edit)?;
        self.run(submission)
            .await?
            .into_task()
            .ok_or_else(|| ScheduleError::UnknownTask(task_id.to_string()))
    }

    pub fn begin_edit(&mut self, task_id: &str, edit: &TaskEdit) -> Result<Submission, ScheduleError> {
        edit.validate().map_err(ScheduleError::Validation)?;
        if edit.is_empty() {
            return Err(ScheduleError::precondition(format!(
                "edit of task {} changes nothing",
                task_id
            )));
        }

        let pending = self.board.begin_edit(task_id, edit)?;
        let command = Command::item_update_content(pending.edited());
        Ok(Submission {
            change: PendingChange::Edit(pending),
            command,
        })
    }

    /// Create a task on the server and add it to the unscheduled list.
    pub async fn create_task(&mut self, draft: NewTask) -> Result<Task, ScheduleError> {
        let draft = draft.normalized().map_err(ScheduleError::Validation)?;
        let command = Command::item_add(&draft);

        let report = match self.send(&command).await {
            Ok(report) => report,
            Err(err) => return Err(self.remote_failure("Failed to create task", err)),
        };
        let id = self.assigned_id(&command, &report, "task")?;

        let task = match report.echoed_item(&id) {
            Some(item) => item_to_task(item),
            None => draft.into_task(id),
        };
        self.board.insert_unplaced(task.clone())?;
        self.notices.success(format!("Created task '{}'", task.title));
        Ok(task)
    }

    pub async fn create_project(&mut self, name: &str) -> Result<Project, ScheduleError> {
        let name = Project::validate_name(name).map_err(ScheduleError::Validation)?;
        let command = Command::project_add(&name);

        let report = match self.send(&command).await {
            Ok(report) => report,
            Err(err) => return Err(self.remote_failure("Failed to create project", err)),
        };
        let id = self.assigned_id(&command, &report, "project")?;

        let project = report
            .projects
            .iter()
            .find(|project| project.id == id)
            .cloned()
            .unwrap_or(Project {
                id,
                name,
                color: None,
                is_inbox_project: false,
            });
        self.projects.push(project.clone());
        self.notices.success(format!("Created project '{}'", project.name));
        Ok(project)
    }

    pub async fn create_label(&mut self, name: &str) -> Result<Label, ScheduleError> {
        let name = Label::validate_name(name, &self.labels).map_err(ScheduleError::Validation)?;
        let command = Command::label_add(&name);

        let report = match self.send(&command).await {
            Ok(report) => report,
            Err(err) => return Err(self.remote_failure("Failed to create label", err)),
        };
        let id = self.assigned_id(&command, &report, "label")?;

        let label = report
            .labels
            .iter()
            .find(|label| label.id == id)
            .cloned()
            .unwrap_or(Label {
                id,
                name,
                color: None,
            });
        self.labels.push(label.clone());
        self.notices.success(format!("Created label '{}'", label.name));
        Ok(label)
    }

    /// Delete a task. The board only changes once the server has agreed.
    pub async fn delete_task(&mut self, task_id: &str) -> Result<Task, ScheduleError> {
        let submission = self.begin_delete(task_id)?;
        self.run(submission)
            .await?
            .into_task()
            .ok_or_else(|| ScheduleError::UnknownTask(task_id.to_string()))
    }

    pub fn begin_delete(&mut self, task_id: &str) -> Result<Submission, ScheduleError> {
        self.board.reserve(task_id)?;
        Ok(Submission {
            change: PendingChange::Delete(task_id.to_string()),
            command: Command::item_delete(task_id),
        })
    }

    /// Finish a submission with the backend's answer.
    ///
    /// Success commits the change and merges any echoed content. A transport
    /// error or a rejected command restores the board and records a notice.
    pub fn settle(
        &mut self,
        submission: Submission,
        answer: Result<CommandReport, SyncError>,
    ) -> Result<Settled, ScheduleError> {
        let Submission { change, command } = submission;
        let report = match answer.and_then(|report| report.check(&command).map(|()| report)) {
            Ok(report) => report,
            Err(err) => {
                let context = failure_context(&change);
                self.board.abandon(change);
                return Err(self.remote_failure(context, err));
            }
        };

        match change {
            PendingChange::Move(pending) => {
                let to = pending.to();
                let task_id = pending.task_id().to_string();
                self.board.commit(pending, report.echoed_item(&task_id));
                Ok(match to {
                    Destination::Slot(key) => {
                        log::info!("Scheduled task {} in {}", task_id, key);
                        Settled::Scheduled(key)
                    }
                    Destination::Unplaced => {
                        log::info!("Unscheduled task {}", task_id);
                        Settled::Unscheduled
                    }
                })
            }
            PendingChange::Edit(pending) => {
                let task_id = pending.task_id().to_string();
                self.board.commit_edit(pending, report.echoed_item(&task_id));
                self.notices.success("Task updated");
                self.board
                    .task(&task_id)
                    .cloned()
                    .map(Settled::Edited)
                    .ok_or(ScheduleError::UnknownTask(task_id))
            }
            PendingChange::Delete(task_id) => {
                let removed = self
                    .board
                    .remove(&task_id)
                    .ok_or_else(|| ScheduleError::UnknownTask(task_id.clone()))?;
                self.notices.success(format!("Deleted task '{}'", removed.title));
                Ok(Settled::Deleted(removed))
            }
        }
    }

    /// Give up on a submission without an answer and restore the board.
    pub fn abandon(&mut self, submission: Submission) {
        log::warn!(
            "Abandoning change to task {} without an answer",
            submission.task_id()
        );
        self.board.abandon(submission.change);
    }

    fn pick_slot_for(&self, date: NaiveDate) -> Option<SlotKey> {
        pick_slot(self.board.placements(), date, &self.slots).map(|time| SlotKey::new(date, time))
    }

    fn begin_move(&mut self, task_id: &str, destination: Destination) -> Result<Submission, ScheduleError> {
        let pending = self.board.begin_move(task_id, destination)?;

        let command = match destination {
            Destination::Slot(key) => {
                Command::item_schedule(task_id, &self.zone.slot_due(key.date, key.time))
            }
            Destination::Unplaced => Command::item_clear_due(task_id),
        };

        Ok(Submission {
            change: PendingChange::Move(pending),
            command,
        })
    }

    /// Submit and settle one change. Dropping the returned future before it
    /// finishes rolls the change back.
    async fn run(&mut self, submission: Submission) -> Result<Settled, ScheduleError> {
        let backend = Rc::clone(&self.backend);
        let command = submission.command.clone();
        let guard = AbandonOnDrop {
            board: &mut self.board,
            submission: Some(submission),
        };

        let answer = backend.submit(std::slice::from_ref(&command)).await;

        match guard.disarm() {
            Some(submission) => self.settle(submission, answer),
            None => Err(ScheduleError::precondition(format!(
                "command {} was already settled",
                command.uuid
            ))),
        }
    }

    /// Submit one command and fold its per-command status into the result.
    async fn send(&self, command: &Command) -> Result<CommandReport, SyncError> {
        let report = self.backend.submit(std::slice::from_ref(command)).await?;
        report.check(command)?;
        Ok(report)
    }

    fn assigned_id(
        &mut self,
        command: &Command,
        report: &CommandReport,
        what: &str,
    ) -> Result<String, ScheduleError> {
        match report.created_id(command) {
            Some(id) => Ok(id.to_string()),
            None => {
                let err = SyncError::Command {
                    uuid: command.uuid.clone(),
                    code: None,
                    message: format!("the server did not assign an id to the new {}", what),
                };
                Err(self.remote_failure(&format!("Failed to create {}", what), err))
            }
        }
    }

    fn remote_failure(&mut self, context: &str, err: SyncError) -> ScheduleError {
        self.notices.error(format!("{}: {}", context, err));
        if err.requires_reauth() {
            self.notices
                .warning("Your session has expired. Sign in again to keep syncing.");
        }
        ScheduleError::Remote(err)
    }
}

/// Rolls a submission back unless it is disarmed first.
struct AbandonOnDrop<'a> {
    board: &'a mut ScheduleBoard,
    submission: Option<Submission>,
}

impl AbandonOnDrop<'_> {
    fn disarm(mut self) -> Option<Submission> {
        self.submission.take()
    }
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(submission) = self.submission.take() {
            log::warn!(
                "Request for task {} was dropped before it finished; rolling back",
                submission.task_id()
            );
            self.board.abandon(submission.change);
        }
    }
}

fn failure_context(change: &PendingChange) -> &'static str {
    match change {
        PendingChange::Move(pending) => match pending.to() {
            Destination::Slot(_) => "Failed to schedule task",
            Destination::Unplaced => "Failed to unschedule task",
        },
        PendingChange::Edit(_) => "Failed to update task",
        PendingChange::Delete(_) => "Failed to delete task",
    }
}

/// Replace entries with a matching id and append the rest.
fn upsert<T>(current: &mut Vec<T>, incoming: Vec<T>, id: impl Fn(&T) -> &String) {
    for value in incoming {
        match current.iter_mut().find(|existing| id(existing) == id(&value)) {
            Some(existing) => *existing = value,
            None => current.push(value),
        }
    }
}

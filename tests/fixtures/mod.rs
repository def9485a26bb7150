// Test fixtures - reusable test data
// Provides a scripted backend and consistent sample data across test files

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::NaiveDate;

use task_calendar::models::settings::Settings;
use task_calendar::services::scheduling::{Scheduler, SlotKey};
use task_calendar::services::todoist::{
    Command, CommandReport, CommandStatus, RemoteDue, RemoteItem, ResourceKind, SyncError,
    SyncSnapshot, TaskBackend,
};
use task_calendar::utils::date::TimeSlot;

/// Sample dates for testing
pub mod dates {
    use super::*;

    /// Monday, June 10 2024
    pub fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    pub fn at(hour: u32) -> TimeSlot {
        TimeSlot::new(hour, 0).unwrap()
    }

    pub fn slot(day: u32, hour: u32) -> SlotKey {
        SlotKey::new(june(day), at(hour))
    }
}

/// Sample remote items
pub mod items {
    use super::*;

    pub fn item(id: &str, content: &str) -> RemoteItem {
        RemoteItem {
            id: id.to_string(),
            content: content.to_string(),
            description: String::new(),
            priority: 1,
            labels: Vec::new(),
            project_id: None,
            due: None,
            is_deleted: false,
            checked: false,
        }
    }

    pub fn due_at(mut item: RemoteItem, date: &str) -> RemoteItem {
        item.due = Some(RemoteDue {
            date: date.to_string(),
            timezone: None,
            string: None,
        });
        item
    }

    pub fn in_project(mut item: RemoteItem, project_id: &str) -> RemoteItem {
        item.project_id = Some(project_id.to_string());
        item
    }
}

/// How the fake answers the next submitted batch.
#[derive(Debug, Clone)]
pub enum Reply {
    Accept,
    /// Batch accepted, every command rejected with this message.
    Reject(String),
    /// Non-success HTTP status.
    HttpFailure(u16),
    Unauthorized,
    /// Accept and map each creation's temp id to this server id.
    Create(String),
    /// Accept and echo this item back.
    Echo(RemoteItem),
    /// Never answer.
    Hang,
}

/// In-memory stand-in for the sync endpoint.
///
/// Calls take `&self`, so several submissions can be outstanding at once.
#[derive(Default)]
pub struct FakeBackend {
    pub snapshot: SyncSnapshot,
    later: RefCell<VecDeque<SyncSnapshot>>,
    submitted: RefCell<Vec<Vec<Command>>>,
    fetches: Cell<usize>,
    replies: RefCell<VecDeque<Reply>>,
}

impl FakeBackend {
    pub fn with_items(items: Vec<RemoteItem>) -> Self {
        Self {
            snapshot: SyncSnapshot {
                full_sync: true,
                items,
                ..SyncSnapshot::default()
            },
            ..Self::default()
        }
    }

    pub fn reply(&mut self, reply: Reply) -> &mut Self {
        self.replies.get_mut().push_back(reply);
        self
    }

    /// Serve `snapshot` on the next fetch after those already queued. Once
    /// the queue is empty, fetches fall back to the base snapshot.
    pub fn then_fetch(&mut self, snapshot: SyncSnapshot) -> &mut Self {
        self.later.get_mut().push_back(snapshot);
        self
    }

    /// Every command sent so far, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.submitted.borrow().iter().flatten().cloned().collect()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

#[async_trait(?Send)]
impl TaskBackend for FakeBackend {
    async fn fetch_all(&self, _kinds: &[ResourceKind]) -> Result<SyncSnapshot, SyncError> {
        let served = self.fetches.get();
        self.fetches.set(served + 1);
        // The first fetch is the base snapshot; later ones drain the queue.
        if served == 0 {
            return Ok(self.snapshot.clone());
        }
        let queued = self.later.borrow_mut().pop_front();
        Ok(queued.unwrap_or_else(|| self.snapshot.clone()))
    }

    async fn submit(&self, commands: &[Command]) -> Result<CommandReport, SyncError> {
        self.submitted.borrow_mut().push(commands.to_vec());

        let reply = self.replies.borrow_mut().pop_front().unwrap_or(Reply::Accept);
        let mut report = CommandReport::default();
        match reply {
            Reply::Accept => {}
            Reply::Reject(message) => {
                for command in commands {
                    report.statuses.insert(
                        command.uuid.clone(),
                        CommandStatus::Error {
                            code: Some(20),
                            message: message.clone(),
                        },
                    );
                }
            }
            Reply::HttpFailure(status) => {
                return Err(SyncError::Http {
                    status,
                    body: String::new(),
                })
            }
            Reply::Unauthorized => return Err(SyncError::Unauthorized { status: 401 }),
            Reply::Create(id) => {
                for command in commands {
                    if let Some(temp) = &command.temp_id {
                        report.temp_id_mapping.insert(temp.clone(), id.clone());
                    }
                }
            }
            Reply::Echo(item) => report.items.push(item),
            Reply::Hang => std::future::pending::<()>().await,
        }
        Ok(report)
    }
}

/// Settings pinned to New York so due timestamps are predictable.
pub fn new_york_settings() -> Settings {
    Settings {
        timezone: Some("America/New_York".to_string()),
        ..Settings::default()
    }
}

/// A scheduler already seeded from `backend`'s snapshot.
pub async fn loaded_scheduler(backend: FakeBackend) -> Scheduler<FakeBackend> {
    let mut scheduler = Scheduler::new(backend, &new_york_settings()).unwrap();
    scheduler.load().await.unwrap();
    scheduler
}

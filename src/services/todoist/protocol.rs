// Wire types for the incremental sync endpoint
// Requests carry a cursor plus either resource types or a command batch

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::label::Label;
use crate::models::project::Project;
use crate::models::task::{NewTask, Task};

use super::error::SyncError;

/// Cursor value that asks the server for a complete snapshot.
pub const FULL_SYNC_TOKEN: &str = "*";

/// Opaque "everything seen so far" token returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCursor(String);

impl SyncCursor {
    pub fn full() -> Self {
        Self(FULL_SYNC_TOKEN.to_string())
    }

    pub fn is_full(&self) -> bool {
        self.0 == FULL_SYNC_TOKEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replace with the server's token; blank tokens are ignored.
    pub fn advance(&mut self, token: &str) {
        if !token.trim().is_empty() {
            self.0 = token.to_string();
        }
    }

    pub fn reset(&mut self) {
        self.0 = FULL_SYNC_TOKEN.to_string();
    }
}

impl Default for SyncCursor {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for SyncCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Items,
    Projects,
    Labels,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Items,
        ResourceKind::Projects,
        ResourceKind::Labels,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    ItemAdd,
    ItemUpdate,
    ItemDelete,
    LabelAdd,
    ProjectAdd,
}

impl CommandKind {
    fn creates(&self) -> bool {
        matches!(
            self,
            CommandKind::ItemAdd | CommandKind::LabelAdd | CommandKind::ProjectAdd
        )
    }
}

/// One mutation in a batch. `uuid` only correlates the response entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    pub args: Value,
}

impl Command {
    pub fn new(kind: CommandKind, args: Value) -> Self {
        Self {
            kind,
            uuid: Uuid::new_v4().to_string(),
            temp_id: kind.creates().then(|| Uuid::new_v4().to_string()),
            args,
        }
    }

    /// Copy for a retry. The server gives no guarantee about a reused uuid, so
    /// every identifier is minted afresh.
    pub fn reissue(&self) -> Self {
        Self::new(self.kind, self.args.clone())
    }

    pub fn item_add(task: &NewTask) -> Self {
        let mut args = json!({
            "content": task.title,
            "description": task.description,
            "priority": task.priority.to_remote(),
            "labels": task.labels,
        });
        if let Some(project_id) = &task.project_id {
            args["project_id"] = json!(project_id);
        }
        Self::new(CommandKind::ItemAdd, args)
    }

    /// Fixed due time, `due` being an RFC 3339 UTC timestamp.
    pub fn item_schedule(task_id: &str, due: &str) -> Self {
        Self::new(
            CommandKind::ItemUpdate,
            json!({ "id": task_id, "due": { "date": due } }),
        )
    }

    pub fn item_clear_due(task_id: &str) -> Self {
        Self::new(
            CommandKind::ItemUpdate,
            json!({ "id": task_id, "due": null }),
        )
    }

    pub fn item_update_content(task: &Task) -> Self {
        Self::new(
            CommandKind::ItemUpdate,
            json!({
                "id": task.id,
                "content": task.title,
                "description": task.description,
                "priority": task.priority.to_remote(),
                "labels": task.labels,
            }),
        )
    }

    pub fn item_delete(task_id: &str) -> Self {
        Self::new(CommandKind::ItemDelete, json!({ "id": task_id }))
    }

    pub fn label_add(name: &str) -> Self {
        Self::new(CommandKind::LabelAdd, json!({ "name": name }))
    }

    pub fn project_add(name: &str) -> Self {
        Self::new(CommandKind::ProjectAdd, json!({ "name": name }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDue {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "lowest_remote_priority")]
    pub priority: u8,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub due: Option<RemoteDue>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub checked: bool,
}

fn lowest_remote_priority() -> u8 {
    1
}

impl RemoteItem {
    /// Deleted and completed items never appear on the board.
    pub fn is_active(&self) -> bool {
        !self.is_deleted && !self.checked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawCommandStatus {
    Text(String),
    Failure {
        #[serde(default)]
        error_code: Option<i64>,
        #[serde(default)]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncResponse {
    pub sync_token: String,
    #[serde(default)]
    pub full_sync: bool,
    #[serde(default)]
    pub items: Vec<RemoteItem>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub sync_status: HashMap<String, RawCommandStatus>,
    #[serde(default)]
    pub temp_id_mapping: HashMap<String, String>,
}

/// Resources returned by a read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub full_sync: bool,
    pub items: Vec<RemoteItem>,
    pub projects: Vec<Project>,
    pub labels: Vec<Label>,
}

impl From<SyncResponse> for SyncSnapshot {
    fn from(response: SyncResponse) -> Self {
        Self {
            full_sync: response.full_sync,
            items: response.items,
            projects: response.projects,
            labels: response.labels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    Error { code: Option<i64>, message: String },
}

/// Per-command outcome of a write batch.
///
/// A uuid missing from `sync_status` is presumed accepted. Echoed resources are
/// optional: an incremental response may leave out the object just mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandReport {
    pub statuses: HashMap<String, CommandStatus>,
    pub temp_id_mapping: HashMap<String, String>,
    pub items: Vec<RemoteItem>,
    pub projects: Vec<Project>,
    pub labels: Vec<Label>,
}

impl CommandReport {
    pub fn status(&self, uuid: &str) -> CommandStatus {
        self.statuses
            .get(uuid)
            .cloned()
            .unwrap_or(CommandStatus::Ok)
    }

    pub fn check(&self, command: &Command) -> Result<(), SyncError> {
        match self.status(&command.uuid) {
            CommandStatus::Ok => Ok(()),
            CommandStatus::Error { code, message } => Err(SyncError::Command {
                uuid: command.uuid.clone(),
                code,
                message,
            }),
        }
    }

    /// Server-assigned id for a creation command.
    pub fn created_id(&self, command: &Command) -> Option<&str> {
        command
            .temp_id
            .as_deref()
            .and_then(|temp| self.temp_id_mapping.get(temp))
            .map(String::as_str)
    }

    pub fn echoed_item(&self, id: &str) -> Option<&RemoteItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl From<SyncResponse> for CommandReport {
    fn from(response: SyncResponse) -> Self {
        let statuses = response
            .sync_status
            .into_iter()
            .map(|(uuid, raw)| {
                let status = match raw {
                    RawCommandStatus::Text(text) if text.eq_ignore_ascii_case("ok") => {
                        CommandStatus::Ok
                    }
                    RawCommandStatus::Text(text) => CommandStatus::Error {
                        code: None,
                        message: text,
                    },
                    RawCommandStatus::Failure { error_code, error } => CommandStatus::Error {
                        code: error_code,
                        message: error.unwrap_or_else(|| "Unknown error".to_string()),
                    },
                };
                (uuid, status)
            })
            .collect();

        Self {
            statuses,
            temp_id_mapping: response.temp_id_mapping,
            items: response.items,
            projects: response.projects,
            labels: response.labels,
        }
    }
}

// Remote task service module
// Sync endpoint client, wire protocol, and item mapping

pub mod client;
pub mod error;
pub mod mapping;
pub mod protocol;

use async_trait::async_trait;

pub use client::SyncClient;
pub use error::SyncError;
pub use mapping::{item_to_task, merge_item_content, parse_due, WallDue};
pub use protocol::{
    Command, CommandKind, CommandReport, CommandStatus, RemoteDue, RemoteItem, ResourceKind,
    SyncCursor, SyncSnapshot,
};

/// The two calls the scheduler makes against the task service.
///
/// A transport or HTTP failure means the whole batch is unapplied; a
/// successful report can still reject individual commands. Calls take `&self`
/// so independent submissions can be awaited side by side.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait TaskBackend {
    async fn fetch_all(&self, kinds: &[ResourceKind]) -> Result<SyncSnapshot, SyncError>;
    async fn submit(&self, commands: &[Command]) -> Result<CommandReport, SyncError>;
}

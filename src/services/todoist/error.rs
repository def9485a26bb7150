use thiserror::Error;

/// Failure talking to the remote task service.
///
/// `Command` is the only variant where the batch itself was accepted; every
/// other variant means nothing in the batch can be assumed applied.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no API token is stored; sign in first")]
    NotAuthenticated,

    #[error("the task service rejected the stored API token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("sync request failed with HTTP status {status}")]
    Http { status: u16, body: String },

    #[error("network error during sync: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode sync response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("the task service rejected the change: {message}")]
    Command {
        uuid: String,
        code: Option<i64>,
        message: String,
    },
}

impl SyncError {
    /// Missing token and 401/403 both send the user back through sign-in.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            SyncError::NotAuthenticated | SyncError::Unauthorized { .. }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Unauthorized { status } | SyncError::Http { status, .. } => Some(*status),
            SyncError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_command_error(&self) -> bool {
        matches!(self, SyncError::Command { .. })
    }
}

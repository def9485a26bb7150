use thiserror::Error;

use crate::services::drag::DragError;
use crate::services::todoist::SyncError;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The remote call failed or rejected the command. Local state has been
    /// restored and a notice recorded.
    #[error(transparent)]
    Remote(#[from] SyncError),

    /// A local invariant did not hold; nothing was changed.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// User input rejected before anything was changed.
    #[error("{0}")]
    Validation(String),

    #[error("unknown task '{0}'")]
    UnknownTask(String),
}

impl ScheduleError {
    pub fn precondition(message: impl Into<String>) -> Self {
        ScheduleError::Precondition(message.into())
    }

    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ScheduleError::Precondition(_) | ScheduleError::UnknownTask(_)
        )
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, ScheduleError::Remote(err) if err.requires_reauth())
    }
}

impl From<DragError> for ScheduleError {
    fn from(err: DragError) -> Self {
        ScheduleError::Precondition(err.to_string())
    }
}

// Drag session module
// One tracker for native pointer drags and emulated touch drags

pub mod session;
pub mod target;

use thiserror::Error;

pub use session::{
    DragHost, DragPhase, DragSession, DragSource, DragTracker, DropIntent, Modality, Point,
    TouchOutcome,
};
pub use target::{resolve_drop_target, DropTarget, Element, ElementKind};

/// Malformed gestures. Logged and dropped, never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("a drag session is already active")]
    SessionActive,
    #[error("no drag session is active")]
    NoActiveSession,
    #[error("drop zone is missing its '{0}' attribute")]
    MissingAttribute(&'static str),
    #[error("drop zone has an invalid '{attribute}' attribute: '{value}'")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
    },
}

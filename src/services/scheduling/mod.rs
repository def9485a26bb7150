// Scheduling module
// Placement index, slot heuristic, board, and the optimistic scheduler

pub mod board;
pub mod error;
pub mod placement;
pub mod service;
pub mod slot_picker;

pub use board::{Destination, Location, PendingChange, PendingEdit, PendingMove, ScheduleBoard};
pub use error::ScheduleError;
pub use placement::{PlacementIndex, SlotKey};
pub use service::{DropOutcome, Scheduler, Settled, Submission};
pub use slot_picker::pick_slot;

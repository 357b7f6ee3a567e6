//! Workflow module: the room lifecycle state machine and its results.

mod outcome;
mod refresh;
mod room_workflow;

pub use outcome::{
    EditOutcome, FinishOutcome, PerspectiveSwitch, RefreshHandle, SecondaryOutcome, SyncHandle,
    SyncReport,
};
pub use refresh::RefreshTracker;
pub use room_workflow::{RefineTarget, RoomWorkflow};

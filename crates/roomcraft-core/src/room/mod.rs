//! Room domain module.
//!
//! # Module Structure
//!
//! - `model`: the `Room` entity, its status, activity and interactive mode
//! - `project`: `ProjectState`, project stages and the set-once master style
//! - `perspective`: camera perspectives rendered per room
//! - `message`: chat history entries
//! - `lifecycle`: which actions are legal in which state

mod lifecycle;
mod message;
mod model;
mod perspective;
mod project;

pub use lifecycle::{RoomAction, ensure_allowed};
pub use message::{ChatMessage, MessageRole};
pub use model::{
    DesignPreferences, FocusState, Room, RoomActivity, RoomDetailsUpdate, RoomMode, RoomStatus,
    StructuralAction,
};
pub use perspective::Perspective;
pub use project::{MasterStyle, ProjectStage, ProjectState};

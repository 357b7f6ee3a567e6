//! Action legality for the room lifecycle state machine.
//!
//! Every caller-invoked operation maps to a `RoomAction`; `ensure_allowed`
//! checks it against the room's status, hero approval and interactive mode
//! before any generation call is made.

use super::model::{Room, RoomMode, RoomStatus};
use crate::error::{Result, RoomcraftError};
use std::fmt;

/// Operations a caller may request on a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomAction {
    EditDetails,
    GenerateSketch,
    OpenStructuralMenu,
    ModifyStructure,
    RefineSketch,
    ApproveSketch,
    GenerateHero,
    RefineView,
    ApproveHero,
    SwitchPerspective,
    EnterFocus,
    RefineFocus,
    ExitFocus,
    MergeFocus,
    RunAudit,
    FinishRoom,
}

impl RoomAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomAction::EditDetails => "edit_details",
            RoomAction::GenerateSketch => "generate_sketch",
            RoomAction::OpenStructuralMenu => "open_structural_menu",
            RoomAction::ModifyStructure => "modify_structure",
            RoomAction::RefineSketch => "refine_sketch",
            RoomAction::ApproveSketch => "approve_sketch",
            RoomAction::GenerateHero => "generate_hero",
            RoomAction::RefineView => "refine_view",
            RoomAction::ApproveHero => "approve_hero",
            RoomAction::SwitchPerspective => "switch_perspective",
            RoomAction::EnterFocus => "enter_focus",
            RoomAction::RefineFocus => "refine_focus",
            RoomAction::ExitFocus => "exit_focus",
            RoomAction::MergeFocus => "merge_focus",
            RoomAction::RunAudit => "run_audit",
            RoomAction::FinishRoom => "finish_room",
        }
    }

    /// Whether the action is legal for the room as it is right now, ignoring busyness.
    pub fn permitted_by(&self, room: &Room) -> bool {
        let status = room.status;
        let focus = matches!(room.mode, RoomMode::FocusEdit(_));
        let has_hero = room.hero().is_some();

        match self {
            RoomAction::EditDetails | RoomAction::GenerateSketch => status == RoomStatus::Pending,
            RoomAction::OpenStructuralMenu
            | RoomAction::ModifyStructure
            | RoomAction::RefineSketch
            | RoomAction::ApproveSketch => {
                status == RoomStatus::ReviewingSketch && room.sketch_image.is_some()
            }
            RoomAction::GenerateHero => status == RoomStatus::Designing,
            RoomAction::RefineView | RoomAction::SwitchPerspective | RoomAction::EnterFocus => {
                status == RoomStatus::Reviewing && has_hero && !focus
            }
            RoomAction::ApproveHero => {
                status == RoomStatus::Reviewing && has_hero && !room.is_hero_approved && !focus
            }
            RoomAction::RefineFocus | RoomAction::ExitFocus | RoomAction::MergeFocus => {
                status == RoomStatus::Reviewing && focus
            }
            RoomAction::RunAudit => {
                matches!(status, RoomStatus::Reviewing | RoomStatus::Completed) && has_hero
            }
            RoomAction::FinishRoom => {
                status == RoomStatus::Reviewing && room.is_hero_approved && !focus
            }
        }
    }
}

impl fmt::Display for RoomAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejects `action` if the room is busy or the action is illegal in its state.
pub fn ensure_allowed(room: &Room, action: RoomAction) -> Result<()> {
    if room.is_busy() {
        return Err(RoomcraftError::room_busy(&room.id));
    }
    if !action.permitted_by(room) {
        return Err(RoomcraftError::invalid_transition(
            &room.id,
            room.status,
            action.as_str(),
        ));
    }
    Ok(())
}

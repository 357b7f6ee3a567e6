//! Room domain model.
//!
//! A `Room` is one space being designed. Its `status` is the single source of
//! truth for which workflow actions are legal; `mode` carries the interactive
//! sub-mode (structural editing or a focus-crop edit) as a tagged variant so
//! the two hotspot systems can never be active at the same time.

use super::message::ChatMessage;
use super::perspective::Perspective;
use crate::analysis::{ComplianceReport, DesignAudit, Hotspot, RoomDescriptor};
use crate::error::{Result, RoomcraftError};
use crate::geometry::CropRegion;
use crate::media::ImageHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a room.
///
/// ```text
/// pending -> generating_sketch -> reviewing_sketch -> designing -> generating_hero
///   -> reviewing (hero not approved) -> generating_secondary
///   -> reviewing (hero approved) -> completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Pending,
    GeneratingSketch,
    ReviewingSketch,
    Designing,
    GeneratingHero,
    Reviewing,
    GeneratingSecondary,
    Completed,
}

impl RoomStatus {
    /// True while a generation call owned by the status itself is outstanding.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            RoomStatus::GeneratingSketch | RoomStatus::GeneratingHero | RoomStatus::GeneratingSecondary
        )
    }

    /// The stable status a failed generation reverts to.
    pub fn revert_target(&self) -> Option<RoomStatus> {
        match self {
            RoomStatus::GeneratingSketch => Some(RoomStatus::Pending),
            RoomStatus::GeneratingHero => Some(RoomStatus::Designing),
            RoomStatus::GeneratingSecondary => Some(RoomStatus::Reviewing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Pending => "pending",
            RoomStatus::GeneratingSketch => "generating_sketch",
            RoomStatus::ReviewingSketch => "reviewing_sketch",
            RoomStatus::Designing => "designing",
            RoomStatus::GeneratingHero => "generating_hero",
            RoomStatus::Reviewing => "reviewing",
            RoomStatus::GeneratingSecondary => "generating_secondary",
            RoomStatus::Completed => "completed",
        }
    }
}

impl Default for RoomStatus {
    fn default() -> Self {
        RoomStatus::Pending
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Same-status long-running work that makes a room busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomActivity {
    Refining,
    ModifyingStructure,
    Auditing,
    Compositing,
    Syncing,
}

/// An in-progress localized zoom edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    /// Click position in percent of the image size.
    pub x: f64,
    pub y: f64,
    pub label: String,
    /// Perspective whose image the crop was taken from.
    pub perspective: Perspective,
    pub region: CropRegion,
    pub original_crop: ImageHandle,
    pub current_crop: ImageHandle,
}

impl FocusState {
    pub fn is_modified(&self) -> bool {
        self.original_crop != self.current_crop
    }
}

/// Interactive sub-mode of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RoomMode {
    /// No interactive editing in progress.
    Normal,
    /// Sketch review: structural hotspots are live, at most one action menu open.
    StructuralEdit {
        #[serde(default)]
        open_menu: Option<String>,
    },
    /// A focus crop is being edited; chat refinement targets the crop.
    FocusEdit(FocusState),
}

impl Default for RoomMode {
    fn default() -> Self {
        RoomMode::Normal
    }
}

/// Geometry edit offered by a structural hotspot's action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralAction {
    MoveLeft,
    MoveRight,
    Rotate90,
    Delete,
}

impl StructuralAction {
    pub const ALL: [StructuralAction; 4] = [
        StructuralAction::MoveLeft,
        StructuralAction::MoveRight,
        StructuralAction::Rotate90,
        StructuralAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralAction::MoveLeft => "move_left",
            StructuralAction::MoveRight => "move_right",
            StructuralAction::Rotate90 => "rotate_90",
            StructuralAction::Delete => "delete",
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            StructuralAction::MoveLeft => "Move left",
            StructuralAction::MoveRight => "Move right",
            StructuralAction::Rotate90 => "Rotate 90°",
            StructuralAction::Delete => "Delete",
        }
    }
}

impl std::str::FromStr for StructuralAction {
    type Err = RoomcraftError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RoomcraftError::invalid_input(format!("Unknown structural action: {s}")))
    }
}

/// Structured design choices applied at hero generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignPreferences {
    pub style: String,
    pub palette: String,
    pub lighting: String,
    pub flooring: String,
}

impl Default for DesignPreferences {
    fn default() -> Self {
        Self {
            style: "Modern Minimalist".to_string(),
            palette: "Warm Neutrals".to_string(),
            lighting: "Natural Daylight".to_string(),
            flooring: "Light Oak Wood".to_string(),
        }
    }
}

/// Partial edit of a room's analysed details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetailsUpdate {
    pub name: Option<String>,
    pub dimensions: Option<String>,
    pub details: Option<String>,
    pub structural_constraints: Option<String>,
}

/// One space being designed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub dimensions: String,
    pub details: String,
    /// Immutable-fixture description; editable until structural generation starts.
    pub structural_constraints: String,
    pub status: RoomStatus,
    #[serde(default)]
    pub activity: Option<RoomActivity>,
    #[serde(default)]
    pub mode: RoomMode,
    #[serde(default)]
    pub preferences: Option<DesignPreferences>,
    /// Room-local style reference supplied by the user.
    #[serde(default)]
    pub style_reference: Option<ImageHandle>,
    /// Free-text notes passed along with generation requests.
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub sketch_image: Option<ImageHandle>,
    #[serde(default)]
    pub structural_hotspots: Vec<Hotspot>,
    #[serde(default)]
    pub generated_views: BTreeMap<Perspective, ImageHandle>,
    #[serde(default)]
    pub active_perspective: Perspective,
    #[serde(default)]
    pub is_hero_approved: bool,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub design_audit: Option<DesignAudit>,
    #[serde(default)]
    pub compliance_report: Option<ComplianceReport>,
    #[serde(default)]
    final_image: Option<ImageHandle>,
}

impl Room {
    /// Creates a pending room from a floorplan analysis entry.
    pub fn from_descriptor(id: impl Into<String>, descriptor: RoomDescriptor) -> Self {
        Self {
            id: id.into(),
            name: descriptor.name,
            dimensions: descriptor.dimensions,
            details: descriptor.details,
            structural_constraints: descriptor.structural_constraints,
            status: RoomStatus::Pending,
            activity: None,
            mode: RoomMode::Normal,
            preferences: None,
            style_reference: None,
            notes: String::new(),
            sketch_image: None,
            structural_hotspots: Vec::new(),
            generated_views: BTreeMap::new(),
            active_perspective: Perspective::Hero,
            is_hero_approved: false,
            hotspots: Vec::new(),
            chat_history: Vec::new(),
            design_audit: None,
            compliance_report: None,
            final_image: None,
        }
    }

    pub fn hero(&self) -> Option<&ImageHandle> {
        self.generated_views.get(&Perspective::Hero)
    }

    pub fn view(&self, perspective: Perspective) -> Option<&ImageHandle> {
        self.generated_views.get(&perspective)
    }

    pub fn active_image(&self) -> Option<&ImageHandle> {
        self.view(self.active_perspective)
    }

    /// Busy rooms reject every state-mutating action.
    pub fn is_busy(&self) -> bool {
        self.status.is_generating() || self.activity.is_some()
    }

    pub fn focus_state(&self) -> Option<&FocusState> {
        match &self.mode {
            RoomMode::FocusEdit(focus) => Some(focus),
            _ => None,
        }
    }

    pub fn open_structural_menu(&self) -> Option<&str> {
        match &self.mode {
            RoomMode::StructuralEdit { open_menu } => open_menu.as_deref(),
            _ => None,
        }
    }

    pub fn final_image(&self) -> Option<&ImageHandle> {
        self.final_image.as_ref()
    }

    /// Image a completed room would keep: the hero, else the first available view.
    pub fn preferred_final_view(&self) -> Option<&ImageHandle> {
        self.hero().or_else(|| self.generated_views.values().next())
    }

    /// Fixes `final_image` from the preferred view. Set exactly once.
    pub fn seal_final_image(&mut self) -> Result<ImageHandle> {
        if self.final_image.is_some() {
            return Err(RoomcraftError::invalid_transition(
                &self.id,
                self.status,
                "seal_final_image",
            ));
        }
        let image = self
            .preferred_final_view()
            .cloned()
            .ok_or_else(|| RoomcraftError::not_found("GeneratedView", &self.id))?;
        self.final_image = Some(image.clone());
        Ok(image)
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.chat_history.push(message);
    }

    /// Applies a details edit.
    ///
    /// Structural constraints can only change while the room is `pending`.
    pub fn apply_details(&mut self, update: RoomDetailsUpdate) -> Result<()> {
        if update.structural_constraints.is_some() && self.status != RoomStatus::Pending {
            return Err(RoomcraftError::invalid_transition(
                &self.id,
                self.status,
                "edit_structural_constraints",
            ));
        }
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(RoomcraftError::invalid_input("Room name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(dimensions) = update.dimensions {
            self.dimensions = dimensions;
        }
        if let Some(details) = update.details {
            self.details = details;
        }
        if let Some(constraints) = update.structural_constraints {
            self.structural_constraints = constraints;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::from_descriptor("room-0", RoomDescriptor::default())
    }

    #[test]
    fn test_new_room_is_pending_and_idle() {
        let room = room();
        assert_eq!(room.status, RoomStatus::Pending);
        assert_eq!(room.active_perspective, Perspective::Hero);
        assert!(!room.is_busy());
        assert!(room.final_image().is_none());
    }

    #[test]
    fn test_revert_targets() {
        assert_eq!(
            RoomStatus::GeneratingSketch.revert_target(),
            Some(RoomStatus::Pending)
        );
        assert_eq!(
            RoomStatus::GeneratingHero.revert_target(),
            Some(RoomStatus::Designing)
        );
        assert_eq!(
            RoomStatus::GeneratingSecondary.revert_target(),
            Some(RoomStatus::Reviewing)
        );
        assert_eq!(RoomStatus::Reviewing.revert_target(), None);
    }

    #[test]
    fn test_final_image_prefers_hero_and_is_set_once() {
        let mut room = room();
        let wide = ImageHandle::png(vec![2u8]);
        let hero = ImageHandle::png(vec![1u8]);
        room.generated_views.insert(Perspective::Wide, wide.clone());
        assert_eq!(room.preferred_final_view(), Some(&wide));

        room.generated_views.insert(Perspective::Hero, hero.clone());
        assert_eq!(room.seal_final_image().unwrap(), hero);
        assert!(room.seal_final_image().is_err());
        assert_eq!(room.final_image(), Some(&hero));
    }

    #[test]
    fn test_seal_without_views_fails() {
        let mut room = room();
        assert!(room.seal_final_image().unwrap_err().is_not_found());
    }

    #[test]
    fn test_constraints_locked_after_pending() {
        let mut room = room();
        room.apply_details(RoomDetailsUpdate {
            structural_constraints: Some("Keep the bay window".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(room.structural_constraints, "Keep the bay window");

        room.status = RoomStatus::Designing;
        let err = room
            .apply_details(RoomDetailsUpdate {
                structural_constraints: Some("Move the wall".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_rejection());

        room.apply_details(RoomDetailsUpdate {
            dimensions: Some("12' x 14'".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(room.dimensions, "12' x 14'");
    }

    #[test]
    fn test_mode_accessors() {
        let mut room = room();
        room.mode = RoomMode::StructuralEdit {
            open_menu: Some("Door".into()),
        };
        assert_eq!(room.open_structural_menu(), Some("Door"));
        assert!(room.focus_state().is_none());
    }
}

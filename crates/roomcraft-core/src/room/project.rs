//! Project state: the single design session that owns every room.

use super::model::{DesignPreferences, Room};
use crate::error::{Result, RoomcraftError};
use crate::media::ImageHandle;
use serde::{Deserialize, Serialize};

/// Top-level stage of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStage {
    /// Waiting for a floorplan to be analysed.
    Upload,
    /// Rooms detected; user reviews names, dimensions and constraints.
    ConfirmRooms,
    /// Per-room design loop.
    DesignLoop,
    /// Every room in sequence has been completed.
    Export,
}

impl ProjectStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStage::Upload => "upload",
            ProjectStage::ConfirmRooms => "confirm_rooms",
            ProjectStage::DesignLoop => "design_loop",
            ProjectStage::Export => "export",
        }
    }
}

impl Default for ProjectStage {
    fn default() -> Self {
        ProjectStage::Upload
    }
}

impl std::fmt::Display for ProjectStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The project-wide style image, writable exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasterStyle(Option<ImageHandle>);

impl MasterStyle {
    pub fn get(&self) -> Option<&ImageHandle> {
        self.0.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.0.is_some()
    }

    /// Locks `image` as the master style if none is set yet.
    ///
    /// Returns `true` when this call performed the lock.
    pub fn lock(&mut self, image: &ImageHandle) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(image.clone());
        true
    }
}

/// One active design session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub id: String,
    pub stage: ProjectStage,
    /// Incremented on every committed mutation.
    pub version: u64,
    pub floorplan: Option<ImageHandle>,
    /// Ordered by design sequence.
    pub rooms: Vec<Room>,
    pub current_room_id: Option<String>,
    /// Optional user-uploaded style applied when a room has no local reference.
    pub global_style: Option<ImageHandle>,
    pub master_style: MasterStyle,
    /// Preferences carried forward as defaults for the next room.
    pub last_preferences: DesignPreferences,
    /// Set while a propagation sync runs; blocks new edits project-wide.
    pub syncing: bool,
}

impl ProjectState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn room(&self, room_id: &str) -> Result<&Room> {
        self.rooms
            .iter()
            .find(|r| r.id == room_id)
            .ok_or_else(|| RoomcraftError::not_found("Room", room_id))
    }

    pub fn room_mut(&mut self, room_id: &str) -> Result<&mut Room> {
        self.rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or_else(|| RoomcraftError::not_found("Room", room_id))
    }

    pub fn room_index(&self, room_id: &str) -> Option<usize> {
        self.rooms.iter().position(|r| r.id == room_id)
    }

    pub fn current_room(&self) -> Option<&Room> {
        let id = self.current_room_id.as_deref()?;
        self.rooms.iter().find(|r| r.id == id)
    }

    /// The room after `room_id` in design order.
    pub fn next_room_id(&self, room_id: &str) -> Option<String> {
        let index = self.room_index(room_id)?;
        self.rooms.get(index + 1).map(|r| r.id.clone())
    }

    pub fn touch(&mut self) {
        self.version += 1;
    }

    /// `(room name, final image)` for every completed room, in design order.
    pub fn export_summary(&self) -> Vec<(String, ImageHandle)> {
        self.rooms
            .iter()
            .filter_map(|r| r.final_image().map(|img| (r.name.clone(), img.clone())))
            .collect()
    }
}

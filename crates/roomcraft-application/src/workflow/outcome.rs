//! Results returned by workflow operations.

use roomcraft_core::error::Result;
use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::{Perspective, ProjectStage};
use tokio::task::JoinHandle;

/// A background propagation sync; resolves once `generatedViews` is written.
pub type SyncHandle = JoinHandle<Result<SyncReport>>;

/// A background hotspot refresh.
pub type RefreshHandle = JoinHandle<()>;

/// What a propagation sync changed.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub room_id: String,
    /// The edited perspective every other one was regenerated from.
    pub source: Perspective,
    pub updated: Vec<Perspective>,
    /// Perspectives that kept their previous image.
    pub failed: Vec<Perspective>,
}

/// Result of an edit to the sketch, a view or a focus crop.
#[derive(Debug)]
pub struct EditOutcome {
    pub image: ImageHandle,
    /// Present when the edit hit an approved room's view.
    pub sync: Option<SyncHandle>,
    pub refresh: Option<RefreshHandle>,
}

/// Result of hero approval and the secondary-view fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryOutcome {
    /// True when this approval set the project master style.
    pub master_style_locked: bool,
    pub generated: Vec<Perspective>,
    pub failed: Vec<Perspective>,
}

#[derive(Debug)]
pub struct PerspectiveSwitch {
    pub perspective: Perspective,
    /// False when the perspective has not been generated yet.
    pub available: bool,
    pub refresh: Option<RefreshHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinishOutcome {
    pub final_image: ImageHandle,
    pub next_room_id: Option<String>,
    pub stage: ProjectStage,
}

//! Generation Client boundary.
//!
//! The image-generation service is an external collaborator: single-shot,
//! stateless and fallible, with no retry of its own. Everything the workflow
//! needs from it is expressed as a `GenerationRequest` (zero or more images,
//! an instruction and output options) answered either by one image or by
//! free text that the caller parses into a typed result.

use crate::error::Result;
use crate::media::ImageHandle;
use crate::room::{Perspective, StructuralAction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a request is for. Used for logging, timeouts and by test doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GenerationTask {
    AnalyzeFloorplan,
    StructuralSketch,
    Hero,
    View(Perspective),
    Refine,
    DetectHotspots,
    DetectStructuralHotspots,
    ModifyStructure(StructuralAction),
    ComplianceAudit,
    DesignAudit,
    CompositeCrop,
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationTask::AnalyzeFloorplan => f.write_str("analyze_floorplan"),
            GenerationTask::StructuralSketch => f.write_str("structural_sketch"),
            GenerationTask::Hero => f.write_str("hero"),
            GenerationTask::View(p) => write!(f, "view:{p:?}"),
            GenerationTask::Refine => f.write_str("refine"),
            GenerationTask::DetectHotspots => f.write_str("detect_hotspots"),
            GenerationTask::DetectStructuralHotspots => f.write_str("detect_structural_hotspots"),
            GenerationTask::ModifyStructure(a) => write!(f, "modify_structure:{}", a.as_str()),
            GenerationTask::ComplianceAudit => f.write_str("compliance_audit"),
            GenerationTask::DesignAudit => f.write_str("design_audit"),
            GenerationTask::CompositeCrop => f.write_str("composite_crop"),
        }
    }
}

/// Output configuration for image requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

/// A labelled image input. Labels are referenced from the instruction text.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub label: String,
    pub image: ImageHandle,
}

/// A single request to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub task: GenerationTask,
    pub system_instruction: Option<String>,
    pub images: Vec<ImageInput>,
    pub instruction: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(task: GenerationTask, instruction: impl Into<String>) -> Self {
        Self {
            task,
            system_instruction: None,
            images: Vec::new(),
            instruction: instruction.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_image(mut self, label: impl Into<String>, image: &ImageHandle) -> Self {
        self.images.push(ImageInput {
            label: label.into(),
            image: image.clone(),
        });
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// The image attached under `label`, if any.
    pub fn image(&self, label: &str) -> Option<&ImageHandle> {
        self.images
            .iter()
            .find(|input| input.label == label)
            .map(|input| &input.image)
    }
}

/// Capability offered by the external generation service.
///
/// Implementations must hold a credential; one without a usable credential
/// fails every call with `RoomcraftError::CredentialMissing`.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Returns exactly one image or fails.
    async fn generate_image(&self, request: GenerationRequest) -> Result<ImageHandle>;

    /// Returns the raw text answer; callers parse it with a typed fallback.
    async fn generate_text(&self, request: GenerationRequest) -> Result<String>;
}

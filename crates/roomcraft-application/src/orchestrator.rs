//! Generation Orchestrator.
//!
//! Turns room-level intents into calls on a [`GenerationClient`]. Each public
//! operation is one call, except the secondary-view fan-out, which issues one
//! call per perspective concurrently and joins them before returning.
//!
//! Dependency rules enforced here:
//! - secondary views need an [`ApprovedView`], which can only be built from a
//!   room whose hero exists and has been approved;
//! - [`GenerationOrchestrator::modify_structure_and_redetect`] always pairs a
//!   structural edit with hotspot re-detection.

use crate::prompts::{self, RoomSpec};
use crate::style_propagation::StyleInputs;
use futures::future::join_all;
use roomcraft_core::analysis::{
    self, ComplianceReport, DesignAudit, Hotspot, RoomDescriptor,
};
use roomcraft_core::config::GenerationSettings;
use roomcraft_core::error::{Result, RoomcraftError};
use roomcraft_core::generation::{
    GenerationClient, GenerationOptions, GenerationRequest, GenerationTask,
};
use roomcraft_core::geometry::CropRegion;
use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::{DesignPreferences, Perspective, Room, StructuralAction};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A view of a room whose hero has been explicitly approved.
///
/// Secondary-view generation accepts only this type, so it can never be
/// requested before approval.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedView {
    perspective: Perspective,
    image: ImageHandle,
}

impl ApprovedView {
    /// The approved hero of `room`.
    pub fn hero(room: &Room) -> Result<Self> {
        Self::of(room, Perspective::Hero)
    }

    /// Any present view of an approved room, used as a sync source.
    pub fn of(room: &Room, perspective: Perspective) -> Result<Self> {
        if !room.is_hero_approved || room.hero().is_none() {
            return Err(RoomcraftError::invalid_transition(
                &room.id,
                room.status,
                "generate_secondary_views",
            ));
        }
        let image = room
            .view(perspective)
            .cloned()
            .ok_or_else(|| RoomcraftError::not_found("GeneratedView", perspective.label()))?;
        Ok(Self { perspective, image })
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }
}

/// Everything a hero request is built from.
#[derive(Debug, Clone)]
pub struct HeroInputs<'a> {
    pub floorplan: &'a ImageHandle,
    pub sketch: Option<&'a ImageHandle>,
    pub room: RoomSpec<'a>,
    pub preferences: &'a DesignPreferences,
    pub style: StyleInputs,
    pub notes: &'a str,
}

/// Fan-in result of a secondary-view fan-out.
#[derive(Debug, Clone, Default)]
pub struct SecondaryViews {
    pub views: BTreeMap<Perspective, ImageHandle>,
    pub failures: Vec<(Perspective, RoomcraftError)>,
}

impl SecondaryViews {
    /// True when perspectives were requested and none succeeded.
    pub fn is_total_failure(&self) -> bool {
        self.views.is_empty() && !self.failures.is_empty()
    }

    pub fn failed_perspectives(&self) -> Vec<Perspective> {
        self.failures.iter().map(|(p, _)| *p).collect()
    }
}

/// Issues ordered and parallel requests to the generation service.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    client: Arc<dyn GenerationClient>,
    hero_options: GenerationOptions,
}

impl GenerationOrchestrator {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self::with_settings(client, &GenerationSettings::default())
    }

    pub fn with_settings(client: Arc<dyn GenerationClient>, settings: &GenerationSettings) -> Self {
        Self {
            client,
            hero_options: GenerationOptions {
                aspect_ratio: Some(settings.hero_aspect_ratio.clone()),
                image_size: Some(settings.image_size.clone()),
            },
        }
    }

    /// Reads the floorplan into room descriptors. Unparsable answers yield
    /// a single default room.
    pub async fn analyze_floorplan(&self, floorplan: &ImageHandle) -> Result<Vec<RoomDescriptor>> {
        let request = GenerationRequest::new(
            GenerationTask::AnalyzeFloorplan,
            prompts::analyze_floorplan(),
        )
        .with_system_instruction(prompts::analyze_floorplan_system())
        .with_image(prompts::FLOORPLAN, floorplan);

        let text = self.client.generate_text(request).await?;
        let rooms = analysis::parse_room_descriptors(&text);
        tracing::info!("[Orchestrator] Floorplan analysis found {} room(s)", rooms.len());
        Ok(rooms)
    }

    pub async fn generate_structural_sketch(
        &self,
        floorplan: &ImageHandle,
        room: RoomSpec<'_>,
        constraints: &str,
        notes: &str,
    ) -> Result<ImageHandle> {
        let request = GenerationRequest::new(
            GenerationTask::StructuralSketch,
            prompts::structural_sketch(room, constraints, notes),
        )
        .with_system_instruction(prompts::structural_sketch_system())
        .with_image(prompts::FLOORPLAN, floorplan);

        self.client.generate_image(request).await
    }

    /// Renders the hero view. The master style, when present, is attached
    /// ahead of the room's style reference and the instruction gives it priority.
    pub async fn generate_hero(&self, inputs: HeroInputs<'_>) -> Result<ImageHandle> {
        let instruction = prompts::hero(
            inputs.room,
            inputs.sketch.is_some(),
            inputs.style.master.is_some(),
            inputs.style.reference.is_some(),
            inputs.notes,
        );

        let mut request = GenerationRequest::new(GenerationTask::Hero, instruction)
            .with_system_instruction(prompts::hero_system(inputs.room, inputs.preferences))
            .with_image(prompts::FLOORPLAN, inputs.floorplan)
            .with_options(self.hero_options.clone());
        if let Some(master) = &inputs.style.master {
            request = request.with_image(prompts::MASTER_STYLE, master);
        }
        if let Some(reference) = &inputs.style.reference {
            request = request.with_image(prompts::STYLE_REFERENCE, reference);
        }
        if let Some(sketch) = inputs.sketch {
            request = request.with_image(prompts::SKETCH, sketch);
        }

        self.client.generate_image(request).await
    }

    /// Generates every perspective in `targets` from `source`, concurrently.
    ///
    /// Individual failures are logged and left out of the result.
    pub async fn generate_secondary_views(
        &self,
        floorplan: &ImageHandle,
        source: &ApprovedView,
        room_name: &str,
        targets: &[Perspective],
    ) -> SecondaryViews {
        let calls = targets
            .iter()
            .copied()
            .filter(|p| *p != source.perspective)
            .map(|perspective| {
                let request = GenerationRequest::new(
                    GenerationTask::View(perspective),
                    prompts::secondary_view(room_name, perspective),
                )
                .with_system_instruction(prompts::secondary_view_system(perspective))
                .with_image(prompts::FLOORPLAN, floorplan)
                .with_image(prompts::SOURCE_VIEW, &source.image);
                let client = Arc::clone(&self.client);
                async move { (perspective, client.generate_image(request).await) }
            });

        let mut result = SecondaryViews::default();
        for (perspective, outcome) in join_all(calls).await {
            match outcome {
                Ok(image) => {
                    result.views.insert(perspective, image);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "roomcraft::fanout",
                        "[Orchestrator] {} view for {} failed: {}",
                        perspective.label(),
                        room_name,
                        e
                    );
                    result.failures.push((perspective, e));
                }
            }
        }

        tracing::info!(
            target: "roomcraft::fanout",
            "[Orchestrator] Fan-out for {} from {}: {} ok, {} failed",
            room_name,
            source.perspective.label(),
            result.views.len(),
            result.failures.len()
        );
        result
    }

    pub async fn refine(
        &self,
        image: &ImageHandle,
        instruction: &str,
        reference: Option<&ImageHandle>,
    ) -> Result<ImageHandle> {
        let mut request = GenerationRequest::new(
            GenerationTask::Refine,
            prompts::refine(instruction, reference.is_some()),
        )
        .with_system_instruction(prompts::refine_system())
        .with_image(prompts::CURRENT_IMAGE, image);
        if let Some(reference) = reference {
            request = request.with_image(prompts::EDIT_REFERENCE, reference);
        }

        self.client.generate_image(request).await
    }

    /// Best-effort; an unparsable answer is an empty list.
    pub async fn detect_hotspots(&self, image: &ImageHandle) -> Result<Vec<Hotspot>> {
        let request = GenerationRequest::new(GenerationTask::DetectHotspots, prompts::detect_hotspots())
            .with_image(prompts::RENDER, image);
        let text = self.client.generate_text(request).await?;
        Ok(analysis::parse_hotspots(&text))
    }

    /// Best-effort; an unparsable answer is an empty list.
    pub async fn detect_structural_hotspots(&self, sketch: &ImageHandle) -> Result<Vec<Hotspot>> {
        let request = GenerationRequest::new(
            GenerationTask::DetectStructuralHotspots,
            prompts::detect_structural_hotspots(),
        )
        .with_image(prompts::SKETCH, sketch);
        let text = self.client.generate_text(request).await?;
        Ok(analysis::parse_hotspots(&text))
    }

    pub async fn modify_structure(
        &self,
        sketch: &ImageHandle,
        action: StructuralAction,
        target_label: &str,
    ) -> Result<ImageHandle> {
        let request = GenerationRequest::new(
            GenerationTask::ModifyStructure(action),
            prompts::modify_structure(action, target_label),
        )
        .with_system_instruction(prompts::structural_sketch_system())
        .with_image(prompts::SKETCH, sketch);

        self.client.generate_image(request).await
    }

    /// Applies a structural edit and re-detects structural hotspots on the result.
    ///
    /// A failed detection leaves the sketch edit in place with no hotspots.
    pub async fn modify_structure_and_redetect(
        &self,
        sketch: &ImageHandle,
        action: StructuralAction,
        target_label: &str,
    ) -> Result<(ImageHandle, Vec<Hotspot>)> {
        let edited = self.modify_structure(sketch, action, target_label).await?;
        let hotspots = self.structural_hotspots_or_empty(&edited).await;
        Ok((edited, hotspots))
    }

    pub(crate) async fn structural_hotspots_or_empty(&self, sketch: &ImageHandle) -> Vec<Hotspot> {
        self.detect_structural_hotspots(sketch)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("[Orchestrator] Structural hotspot detection failed: {}", e);
                Vec::new()
            })
    }

    pub async fn run_compliance_audit(
        &self,
        floorplan: &ImageHandle,
        rendered: &ImageHandle,
        room_name: &str,
    ) -> Result<ComplianceReport> {
        let request = GenerationRequest::new(
            GenerationTask::ComplianceAudit,
            prompts::compliance_audit(room_name),
        )
        .with_image(prompts::FLOORPLAN, floorplan)
        .with_image(prompts::RENDER, rendered);
        let text = self.client.generate_text(request).await?;
        Ok(analysis::parse_compliance_report(&text))
    }

    pub async fn run_design_audit(
        &self,
        rendered: &ImageHandle,
        room_name: &str,
    ) -> Result<DesignAudit> {
        let request =
            GenerationRequest::new(GenerationTask::DesignAudit, prompts::design_audit(room_name))
                .with_image(prompts::RENDER, rendered);
        let text = self.client.generate_text(request).await?;
        Ok(analysis::parse_design_audit(&text))
    }

    /// Reintegrates an edited crop into `full` at `region`.
    pub async fn composite_crop(
        &self,
        full: &ImageHandle,
        edited_crop: &ImageHandle,
        region: CropRegion,
    ) -> Result<ImageHandle> {
        let (width, height) = full.dimensions()?;
        let request = GenerationRequest::new(
            GenerationTask::CompositeCrop,
            prompts::composite_crop(width, height, region.x, region.y, region.size),
        )
        .with_image(prompts::FULL_IMAGE, full)
        .with_image(prompts::EDITED_CROP, edited_crop);

        self.client.generate_image(request).await
    }
}

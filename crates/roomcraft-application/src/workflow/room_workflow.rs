//! Room Lifecycle State Machine.
//!
//! `RoomWorkflow` owns the project state and exposes every operation a
//! caller may invoke. Each operation follows the same shape:
//!
//! 1. take the write lock, validate the action against the room's status,
//!    mode and busyness, and mark the room busy;
//! 2. release the lock and await the generation call(s);
//! 3. retake the lock and write the result into the room it was issued
//!    for, looked up by id.
//!
//! A failed call reverts the room to its last stable status and leaves a
//! system message in its chat history.

use super::outcome::{
    EditOutcome, FinishOutcome, PerspectiveSwitch, RefreshHandle, SecondaryOutcome, SyncHandle,
    SyncReport,
};
use super::refresh::RefreshTracker;
use crate::orchestrator::{ApprovedView, GenerationOrchestrator, HeroInputs};
use crate::prompts::RoomSpec;
use crate::region_editor;
use crate::style_propagation;
use roomcraft_core::analysis::{ComplianceReport, DesignAudit, RoomDescriptor};
use roomcraft_core::error::{Result, RoomcraftError};
use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::{
    ChatMessage, DesignPreferences, FocusState, Perspective, ProjectStage, ProjectState, Room,
    RoomAction, RoomActivity, RoomDetailsUpdate, RoomMode, RoomStatus, StructuralAction,
    ensure_allowed,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// What a chat message is applied to, derived from the room's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineTarget {
    Sketch,
    ActiveView,
    FocusCrop,
}

#[derive(Clone)]
pub struct RoomWorkflow {
    state: Arc<RwLock<ProjectState>>,
    orchestrator: GenerationOrchestrator,
    refresh: Arc<RefreshTracker>,
}

impl RoomWorkflow {
    pub fn new(orchestrator: GenerationOrchestrator) -> Self {
        Self::with_state(
            orchestrator,
            ProjectState::new(uuid::Uuid::new_v4().to_string()),
        )
    }

    pub fn with_state(orchestrator: GenerationOrchestrator, state: ProjectState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            orchestrator,
            refresh: Arc::new(RefreshTracker::new()),
        }
    }

    /// A copy of the current project state.
    pub async fn snapshot(&self) -> ProjectState {
        self.state.read().await.clone()
    }

    pub async fn room(&self, room_id: &str) -> Result<Room> {
        self.state.read().await.room(room_id).cloned()
    }

    pub async fn export_summary(&self) -> Vec<(String, ImageHandle)> {
        self.state.read().await.export_summary()
    }

    // ============================================================================
    // Project stages
    // ============================================================================

    /// Analyses the floorplan and seeds the room list. Runs once per project.
    pub async fn analyze_floorplan(&self, floorplan: ImageHandle) -> Result<Vec<Room>> {
        {
            let mut project = self.state.write().await;
            if project.stage != ProjectStage::Upload || project.floorplan.is_some() {
                return Err(RoomcraftError::invalid_transition(
                    &project.id,
                    project.stage,
                    "analyze_floorplan",
                ));
            }
            project.floorplan = Some(floorplan.clone());
            project.touch();
        }

        let descriptors = match self.orchestrator.analyze_floorplan(&floorplan).await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                let mut project = self.state.write().await;
                project.floorplan = None;
                project.touch();
                tracing::warn!("[RoomWorkflow] Floorplan analysis failed: {}", e);
                return Err(e);
            }
        };

        let mut project = self.state.write().await;
        project.rooms = descriptors
            .into_iter()
            .map(|descriptor: RoomDescriptor| {
                Room::from_descriptor(format!("room-{}", uuid::Uuid::new_v4()), descriptor)
            })
            .collect();
        project.current_room_id = project.rooms.first().map(|r| r.id.clone());
        project.stage = ProjectStage::ConfirmRooms;
        project.touch();
        tracing::info!(
            "[RoomWorkflow] Project {} has {} room(s) to confirm",
            project.id,
            project.rooms.len()
        );
        Ok(project.rooms.clone())
    }

    /// Edits a room's analysed details. Constraints only change while pending.
    pub async fn update_room_details(&self, room_id: &str, update: RoomDetailsUpdate) -> Result<()> {
        let mut project = self.state.write().await;
        ensure_project_editable(&project, "update_room_details")?;
        let room = project.room_mut(room_id)?;
        if update.structural_constraints.is_some() {
            ensure_allowed(room, RoomAction::EditDetails)?;
        } else if room.is_busy() {
            return Err(RoomcraftError::room_busy(room_id));
        }
        room.apply_details(update)?;
        project.touch();
        Ok(())
    }

    /// Leaves room confirmation and starts designing `room_id` (or the first room).
    pub async fn start_design(&self, room_id: Option<&str>) -> Result<String> {
        let mut project = self.state.write().await;
        if project.stage != ProjectStage::ConfirmRooms {
            return Err(RoomcraftError::invalid_transition(
                &project.id,
                project.stage,
                "start_design",
            ));
        }
        let id = match room_id {
            Some(id) => project.room(id)?.id.clone(),
            None => project
                .rooms
                .first()
                .map(|r| r.id.clone())
                .ok_or_else(|| RoomcraftError::not_found("Room", "first"))?,
        };
        project.stage = ProjectStage::DesignLoop;
        project.current_room_id = Some(id.clone());
        project.touch();
        Ok(id)
    }

    /// Makes `room_id` the current room. In-flight work on other rooms continues.
    pub async fn select_room(&self, room_id: &str) -> Result<()> {
        let mut project = self.state.write().await;
        ensure_design_stage(&project, "select_room")?;
        project.room(room_id)?;
        project.current_room_id = Some(room_id.to_string());
        project.touch();
        Ok(())
    }

    /// Sets the project-wide user style, used by rooms without a local reference.
    pub async fn set_global_style(&self, style: Option<ImageHandle>) -> Result<()> {
        let mut project = self.state.write().await;
        if project.syncing {
            return Err(RoomcraftError::SyncInProgress);
        }
        project.global_style = style;
        project.touch();
        Ok(())
    }

    pub async fn set_style_reference(
        &self,
        room_id: &str,
        reference: Option<ImageHandle>,
    ) -> Result<()> {
        self.update_idle_room(room_id, |room| room.style_reference = reference)
            .await
    }

    pub async fn set_notes(&self, room_id: &str, notes: impl Into<String>) -> Result<()> {
        let notes = notes.into();
        self.update_idle_room(room_id, |room| room.notes = notes).await
    }

    pub async fn set_preferences(&self, room_id: &str, preferences: DesignPreferences) -> Result<()> {
        self.update_idle_room(room_id, |room| room.preferences = Some(preferences))
            .await
    }

    async fn update_idle_room(&self, room_id: &str, apply: impl FnOnce(&mut Room)) -> Result<()> {
        let mut project = self.state.write().await;
        ensure_project_editable(&project, "update_room")?;
        let room = project.room_mut(room_id)?;
        if room.is_busy() {
            return Err(RoomcraftError::room_busy(room_id));
        }
        apply(room);
        project.touch();
        Ok(())
    }

    // ============================================================================
    // Structural phase
    // ============================================================================

    /// `pending -> generating_sketch -> reviewing_sketch`.
    pub async fn generate_sketch(&self, room_id: &str) -> Result<ImageHandle> {
        let (floorplan, room) = {
            let mut project = self.state.write().await;
            let floorplan = begin(&project, room_id, RoomAction::GenerateSketch)?;
            let room = project.room_mut(room_id)?;
            if room.structural_constraints.trim().is_empty() {
                return Err(RoomcraftError::invalid_input(
                    "Structural constraints are required before generating a sketch",
                ));
            }
            room.status = RoomStatus::GeneratingSketch;
            let room = room.clone();
            project.touch();
            (floorplan, room)
        };

        tracing::info!("[RoomWorkflow] Generating structural sketch for {}", room.name);
        let sketch = match self
            .orchestrator
            .generate_structural_sketch(
                &floorplan,
                spec_of(&room),
                &room.structural_constraints,
                &room.notes,
            )
            .await
        {
            Ok(sketch) => sketch,
            Err(e) => return Err(self.fail(room_id, e).await),
        };
        let hotspots = self.orchestrator.structural_hotspots_or_empty(&sketch).await;

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.sketch_image = Some(sketch.clone());
        room.structural_hotspots = hotspots;
        room.status = RoomStatus::ReviewingSketch;
        room.mode = RoomMode::StructuralEdit { open_menu: None };
        room.push_message(ChatMessage::assistant(
            "Clay model ready. Adjust structural elements or approve the layout to start styling.",
        ));
        project.touch();
        Ok(sketch)
    }

    /// Opens the action menu for a structural hotspot (closing any other), or
    /// closes it with `None`.
    pub async fn open_structural_menu(&self, room_id: &str, label: Option<&str>) -> Result<()> {
        let mut project = self.state.write().await;
        begin_without_floorplan(&project, room_id, RoomAction::OpenStructuralMenu)?;
        let room = project.room_mut(room_id)?;
        region_editor::set_structural_menu(room, label)?;
        project.touch();
        Ok(())
    }

    /// Applies a structural edit to the sketch and re-detects its hotspots.
    pub async fn modify_structure(
        &self,
        room_id: &str,
        action: StructuralAction,
        target_label: &str,
    ) -> Result<ImageHandle> {
        let sketch = {
            let mut project = self.state.write().await;
            begin_without_floorplan(&project, room_id, RoomAction::ModifyStructure)?;
            let room = project.room_mut(room_id)?;
            region_editor::ensure_structural_hotspot(room, target_label)?;
            let sketch = current_sketch(room)?;
            room.activity = Some(RoomActivity::ModifyingStructure);
            room.push_message(ChatMessage::system(format!(
                "{} {}",
                action.label(),
                target_label
            )));
            project.touch();
            sketch
        };

        let (edited, hotspots) = match self
            .orchestrator
            .modify_structure_and_redetect(&sketch, action, target_label)
            .await
        {
            Ok(result) => result,
            Err(e) => return Err(self.fail(room_id, e).await),
        };

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.sketch_image = Some(edited.clone());
        room.structural_hotspots = hotspots;
        room.mode = RoomMode::StructuralEdit { open_menu: None };
        room.activity = None;
        project.touch();
        Ok(edited)
    }

    /// Chat-refines the sketch; structural hotspots are re-detected on the result.
    pub async fn refine_sketch(
        &self,
        room_id: &str,
        instruction: &str,
        attachment: Option<ImageHandle>,
    ) -> Result<EditOutcome> {
        let sketch = {
            let mut project = self.state.write().await;
            begin_without_floorplan(&project, room_id, RoomAction::RefineSketch)?;
            let room = project.room_mut(room_id)?;
            let sketch = current_sketch(room)?;
            room.push_message(ChatMessage::user(instruction, attachment.clone()));
            room.activity = Some(RoomActivity::Refining);
            project.touch();
            sketch
        };

        let refined = match self
            .orchestrator
            .refine(&sketch, instruction, attachment.as_ref())
            .await
        {
            Ok(image) => image,
            Err(e) => return Err(self.fail(room_id, e).await),
        };
        let hotspots = self.orchestrator.structural_hotspots_or_empty(&refined).await;

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.sketch_image = Some(refined.clone());
        room.structural_hotspots = hotspots;
        room.mode = RoomMode::StructuralEdit { open_menu: None };
        room.activity = None;
        room.push_message(ChatMessage::assistant("Clay model updated."));
        project.touch();
        Ok(EditOutcome {
            image: refined,
            sync: None,
            refresh: None,
        })
    }

    /// `reviewing_sketch -> designing`. No generation call.
    pub async fn approve_sketch(&self, room_id: &str) -> Result<()> {
        let mut project = self.state.write().await;
        begin_without_floorplan(&project, room_id, RoomAction::ApproveSketch)?;
        let room = project.room_mut(room_id)?;
        room.status = RoomStatus::Designing;
        room.mode = RoomMode::Normal;
        room.push_message(ChatMessage::system(
            "Layout approved. Choose design preferences to render the hero view.",
        ));
        project.touch();
        Ok(())
    }

    // ============================================================================
    // Hero and secondary views
    // ============================================================================

    /// `designing -> generating_hero -> reviewing`.
    ///
    /// `preferences` falls back to the room's stored preferences, then to
    /// the ones used by the previous room. After the hero lands, the design
    /// audit and hotspot detection run in parallel.
    pub async fn generate_hero(
        &self,
        room_id: &str,
        preferences: Option<DesignPreferences>,
    ) -> Result<ImageHandle> {
        let (floorplan, room, style, preferences) = {
            let mut project = self.state.write().await;
            let floorplan = begin(&project, room_id, RoomAction::GenerateHero)?;
            let preferences = preferences
                .or_else(|| project.room(room_id).ok().and_then(|r| r.preferences.clone()))
                .unwrap_or_else(|| project.last_preferences.clone());
            let style = {
                let current: &ProjectState = &project;
                style_propagation::resolve_style_inputs(current, current.room(room_id)?)
            };
            project.last_preferences = preferences.clone();

            let room = project.room_mut(room_id)?;
            room.preferences = Some(preferences.clone());
            room.is_hero_approved = false;
            room.status = RoomStatus::GeneratingHero;
            let room = room.clone();
            project.touch();
            (floorplan, room, style, preferences)
        };

        tracing::info!(
            "[RoomWorkflow] Generating hero for {} (master style: {})",
            room.name,
            style.master.is_some()
        );
        let hero = match self
            .orchestrator
            .generate_hero(HeroInputs {
                floorplan: &floorplan,
                sketch: room.sketch_image.as_ref(),
                room: spec_of(&room),
                preferences: &preferences,
                style,
                notes: &room.notes,
            })
            .await
        {
            Ok(hero) => hero,
            Err(e) => return Err(self.fail(room_id, e).await),
        };

        {
            let mut project = self.state.write().await;
            let room = project.room_mut(room_id)?;
            room.generated_views.insert(Perspective::Hero, hero.clone());
            room.active_perspective = Perspective::Hero;
            room.hotspots.clear();
            room.design_audit = None;
            room.compliance_report = None;
            room.mode = RoomMode::Normal;
            room.status = RoomStatus::Reviewing;
            room.activity = Some(RoomActivity::Auditing);
            room.push_message(ChatMessage::assistant(
                "Hero view ready. Refine it in chat or approve it to render the other perspectives.",
            ));
            project.touch();
        }

        let ticket = self.refresh.issue(room_id, Perspective::Hero);
        let (audit, hotspots) = tokio::join!(
            self.orchestrator.run_design_audit(&hero, &room.name),
            self.orchestrator.detect_hotspots(&hero),
        );

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.activity = None;
        room.design_audit = Some(audit.unwrap_or_else(|e| {
            tracing::warn!("[RoomWorkflow] Design audit for {} failed: {}", room_id, e);
            DesignAudit::default()
        }));
        if self.refresh.is_current(room_id, Perspective::Hero, ticket)
            && room.active_perspective == Perspective::Hero
            && room.hero() == Some(&hero)
        {
            room.hotspots = hotspots.unwrap_or_else(|e| {
                tracing::warn!("[RoomWorkflow] Hotspot detection for {} failed: {}", room_id, e);
                Vec::new()
            });
        }
        project.touch();
        Ok(hero)
    }

    /// Approves the hero, locks the master style if unset, and fans out the
    /// secondary perspectives.
    ///
    /// Returns an error only when every perspective failed; the room is
    /// back in `reviewing` with the hero approved either way.
    pub async fn approve_hero(&self, room_id: &str) -> Result<SecondaryOutcome> {
        let (floorplan, source, room_name, master_style_locked) = {
            let mut project = self.state.write().await;
            let floorplan = begin(&project, room_id, RoomAction::ApproveHero)?;
            let hero = project
                .room(room_id)?
                .hero()
                .cloned()
                .ok_or_else(|| RoomcraftError::not_found("GeneratedView", Perspective::Hero.label()))?;
            let locked = style_propagation::lock_on_approval(&mut project, room_id, &hero);

            let room = project.room_mut(room_id)?;
            room.is_hero_approved = true;
            room.status = RoomStatus::GeneratingSecondary;
            room.push_message(ChatMessage::system(
                "Hero approved. Rendering the remaining perspectives.",
            ));
            let source = ApprovedView::hero(room)?;
            let room_name = room.name.clone();
            project.touch();
            (floorplan, source, room_name, locked)
        };

        let result = self
            .orchestrator
            .generate_secondary_views(&floorplan, &source, &room_name, &Perspective::SECONDARY)
            .await;

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        for (perspective, image) in &result.views {
            room.generated_views.insert(*perspective, image.clone());
        }
        room.status = RoomStatus::Reviewing;
        let failed = result.failed_perspectives();
        room.push_message(if result.is_total_failure() {
            ChatMessage::system("No additional perspectives could be generated.")
        } else {
            ChatMessage::assistant(format!(
                "Generated {} additional perspective(s).",
                result.views.len()
            ))
        });
        project.touch();

        if result.is_total_failure() {
            return Err(RoomcraftError::generation(
                "generate_secondary_views",
                "Every secondary perspective failed",
            ));
        }
        Ok(SecondaryOutcome {
            master_style_locked,
            generated: result.views.keys().copied().collect(),
            failed,
        })
    }

    /// Changes the active perspective and refreshes its hotspots in the background.
    pub async fn switch_perspective(
        &self,
        room_id: &str,
        perspective: Perspective,
    ) -> Result<PerspectiveSwitch> {
        let mut project = self.state.write().await;
        begin_without_floorplan(&project, room_id, RoomAction::SwitchPerspective)?;
        let room = project.room_mut(room_id)?;
        room.active_perspective = perspective;
        room.hotspots.clear();
        let image = room.view(perspective).cloned();
        project.touch();
        drop(project);

        let refresh = image.map(|image| self.spawn_hotspot_refresh(room_id, perspective, image));
        Ok(PerspectiveSwitch {
            perspective,
            available: refresh.is_some(),
            refresh,
        })
    }

    /// Chat-refines the active view. After approval the edit triggers a sync.
    pub async fn refine_view(
        &self,
        room_id: &str,
        instruction: &str,
        attachment: Option<ImageHandle>,
    ) -> Result<EditOutcome> {
        let (perspective, image) = {
            let mut project = self.state.write().await;
            begin_without_floorplan(&project, room_id, RoomAction::RefineView)?;
            let room = project.room_mut(room_id)?;
            let perspective = room.active_perspective;
            let image = room
                .view(perspective)
                .cloned()
                .ok_or_else(|| RoomcraftError::not_found("GeneratedView", perspective.label()))?;
            room.push_message(ChatMessage::user(instruction, attachment.clone()));
            room.activity = Some(RoomActivity::Refining);
            project.touch();
            (perspective, image)
        };

        let refined = match self
            .orchestrator
            .refine(&image, instruction, attachment.as_ref())
            .await
        {
            Ok(image) => image,
            Err(e) => return Err(self.fail(room_id, e).await),
        };

        self.commit_view_edit(room_id, perspective, refined, "Update applied.")
            .await
    }

    /// Routes a chat message to the sketch, the active view or the focus crop.
    pub async fn send_message(
        &self,
        room_id: &str,
        text: &str,
        attachment: Option<ImageHandle>,
    ) -> Result<EditOutcome> {
        let target = {
            let project = self.state.read().await;
            let room = project.room(room_id)?;
            match (room.status, &room.mode) {
                (RoomStatus::ReviewingSketch, _) => RefineTarget::Sketch,
                (RoomStatus::Reviewing, RoomMode::FocusEdit(_)) => RefineTarget::FocusCrop,
                (RoomStatus::Reviewing, _) => RefineTarget::ActiveView,
                (status, _) => {
                    return Err(if room.is_busy() {
                        RoomcraftError::room_busy(room_id)
                    } else {
                        RoomcraftError::invalid_transition(room_id, status, "send_message")
                    });
                }
            }
        };

        match target {
            RefineTarget::Sketch => self.refine_sketch(room_id, text, attachment).await,
            RefineTarget::FocusCrop => self.refine_focus(room_id, text, attachment).await,
            RefineTarget::ActiveView => self.refine_view(room_id, text, attachment).await,
        }
    }

    // ============================================================================
    // Focus crops
    // ============================================================================

    /// Starts a focus edit around a click at `(x, y)` percent on the active view.
    ///
    /// Without a label the nearest hotspot's label is used.
    pub async fn enter_focus(
        &self,
        room_id: &str,
        x: f64,
        y: f64,
        label: Option<String>,
    ) -> Result<FocusState> {
        let mut project = self.state.write().await;
        begin_without_floorplan(&project, room_id, RoomAction::EnterFocus)?;
        let room = project.room_mut(room_id)?;
        let perspective = room.active_perspective;
        let image = room
            .view(perspective)
            .cloned()
            .ok_or_else(|| RoomcraftError::not_found("GeneratedView", perspective.label()))?;
        let label = label.unwrap_or_else(|| region_editor::label_for_click(&room.hotspots, x, y));

        let focus = region_editor::focus_at(&image, perspective, x, y, label)?;
        room.push_message(ChatMessage::system(format!("Focusing on {}", focus.label)));
        room.mode = RoomMode::FocusEdit(focus.clone());
        project.touch();
        Ok(focus)
    }

    /// Chat-refines the focus crop; the full view is untouched until merge.
    pub async fn refine_focus(
        &self,
        room_id: &str,
        instruction: &str,
        attachment: Option<ImageHandle>,
    ) -> Result<EditOutcome> {
        let crop = {
            let mut project = self.state.write().await;
            begin_without_floorplan(&project, room_id, RoomAction::RefineFocus)?;
            let room = project.room_mut(room_id)?;
            let crop = room
                .focus_state()
                .map(|f| f.current_crop.clone())
                .ok_or_else(|| {
                    RoomcraftError::invalid_transition(room_id, RoomStatus::Reviewing, "refine_focus")
                })?;
            room.push_message(ChatMessage::user(instruction, attachment.clone()));
            room.activity = Some(RoomActivity::Refining);
            project.touch();
            crop
        };

        let refined = match self
            .orchestrator
            .refine(&crop, instruction, attachment.as_ref())
            .await
        {
            Ok(image) => image,
            Err(e) => return Err(self.fail(room_id, e).await),
        };

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.activity = None;
        if let RoomMode::FocusEdit(focus) = &mut room.mode {
            focus.current_crop = refined.clone();
        }
        room.push_message(ChatMessage::assistant("Focus area updated. Merge it when ready."));
        project.touch();
        Ok(EditOutcome {
            image: refined,
            sync: None,
            refresh: None,
        })
    }

    /// Leaves focus mode, discarding the crop.
    pub async fn exit_focus(&self, room_id: &str) -> Result<()> {
        let mut project = self.state.write().await;
        begin_without_floorplan(&project, room_id, RoomAction::ExitFocus)?;
        let room = project.room_mut(room_id)?;
        room.mode = RoomMode::Normal;
        project.touch();
        Ok(())
    }

    /// Composites the edited crop back into its view and leaves focus mode.
    ///
    /// An unmodified crop just exits. After approval the merge triggers a sync.
    pub async fn merge_focus(&self, room_id: &str) -> Result<EditOutcome> {
        let (focus, full) = {
            let mut project = self.state.write().await;
            begin_without_floorplan(&project, room_id, RoomAction::MergeFocus)?;
            let room = project.room_mut(room_id)?;
            let focus = room
                .focus_state()
                .cloned()
                .ok_or_else(|| {
                    RoomcraftError::invalid_transition(room_id, RoomStatus::Reviewing, "merge_focus")
                })?;
            let full = room
                .view(focus.perspective)
                .cloned()
                .ok_or_else(|| RoomcraftError::not_found("GeneratedView", focus.perspective.label()))?;

            if !focus.is_modified() {
                room.mode = RoomMode::Normal;
                project.touch();
                return Ok(EditOutcome {
                    image: full,
                    sync: None,
                    refresh: None,
                });
            }

            room.activity = Some(RoomActivity::Compositing);
            project.touch();
            (focus, full)
        };

        let merged = match self
            .orchestrator
            .composite_crop(&full, &focus.current_crop, focus.region)
            .await
        {
            Ok(image) => image,
            Err(e) => return Err(self.fail(room_id, e).await),
        };

        self.commit_view_edit(
            room_id,
            focus.perspective,
            merged,
            &format!("Merged the edited {} back into the view.", focus.label),
        )
        .await
    }

    // ============================================================================
    // Audits and completion
    // ============================================================================

    pub async fn run_design_audit(&self, room_id: &str) -> Result<DesignAudit> {
        let (hero, name, _) = self.begin_audit(room_id, false).await?;
        let audit = match self.orchestrator.run_design_audit(&hero, &name).await {
            Ok(audit) => audit,
            Err(e) => return Err(self.fail(room_id, e).await),
        };

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.design_audit = Some(audit.clone());
        room.activity = None;
        project.touch();
        Ok(audit)
    }

    pub async fn run_compliance_audit(&self, room_id: &str) -> Result<ComplianceReport> {
        let (hero, name, floorplan) = self.begin_audit(room_id, true).await?;
        let floorplan =
            floorplan.ok_or_else(|| RoomcraftError::internal("Floorplan missing after validation"))?;
        let report = match self
            .orchestrator
            .run_compliance_audit(&floorplan, &hero, &name)
            .await
        {
            Ok(report) => report,
            Err(e) => return Err(self.fail(room_id, e).await),
        };

        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.compliance_report = Some(report.clone());
        room.activity = None;
        project.touch();
        Ok(report)
    }

    /// Validates an audit request, marks the room busy and returns the hero,
    /// the room name and, if asked for, the floorplan.
    async fn begin_audit(
        &self,
        room_id: &str,
        with_floorplan: bool,
    ) -> Result<(ImageHandle, String, Option<ImageHandle>)> {
        let mut project = self.state.write().await;
        let floorplan = if with_floorplan {
            Some(begin(&project, room_id, RoomAction::RunAudit)?)
        } else {
            begin_without_floorplan(&project, room_id, RoomAction::RunAudit)?;
            None
        };
        let room = project.room_mut(room_id)?;
        let hero = room
            .hero()
            .cloned()
            .ok_or_else(|| RoomcraftError::not_found("GeneratedView", Perspective::Hero.label()))?;
        room.activity = Some(RoomActivity::Auditing);
        let name = room.name.clone();
        project.touch();
        Ok((hero, name, floorplan))
    }

    /// `reviewing (approved) -> completed`; moves on to the next room or to export.
    pub async fn finish_room(&self, room_id: &str) -> Result<FinishOutcome> {
        let mut project = self.state.write().await;
        begin_without_floorplan(&project, room_id, RoomAction::FinishRoom)?;
        let room = project.room_mut(room_id)?;
        let final_image = room.seal_final_image()?;
        room.status = RoomStatus::Completed;
        room.mode = RoomMode::Normal;
        room.push_message(ChatMessage::system("Room completed."));
        let room_name = room.name.clone();

        let next_room_id = project.next_room_id(room_id);
        match &next_room_id {
            Some(next) => project.current_room_id = Some(next.clone()),
            None => project.stage = ProjectStage::Export,
        }
        project.touch();
        tracing::info!(
            "[RoomWorkflow] Completed {}; next: {}",
            room_name,
            next_room_id.as_deref().unwrap_or("export")
        );

        Ok(FinishOutcome {
            final_image,
            next_room_id,
            stage: project.stage,
        })
    }

    // ============================================================================
    // Internals
    // ============================================================================

    /// Writes an edited view, clears its hotspots and starts the follow-up work:
    /// a hotspot refresh, and a sync when the hero is approved.
    async fn commit_view_edit(
        &self,
        room_id: &str,
        perspective: Perspective,
        image: ImageHandle,
        message: &str,
    ) -> Result<EditOutcome> {
        let mut project = self.state.write().await;
        let room = project.room_mut(room_id)?;
        room.generated_views.insert(perspective, image.clone());
        room.mode = RoomMode::Normal;
        room.activity = None;
        room.hotspots.clear();
        room.push_message(ChatMessage::assistant(message));
        let approved = room.is_hero_approved;
        let active = room.active_perspective == perspective;
        project.touch();

        let sync = if approved {
            Some(self.start_sync(&mut project, room_id, perspective)?)
        } else {
            None
        };
        drop(project);

        let refresh = active.then(|| self.spawn_hotspot_refresh(room_id, perspective, image.clone()));
        Ok(EditOutcome {
            image,
            sync,
            refresh,
        })
    }

    /// Marks the project as syncing and regenerates every other perspective
    /// of the room from `edited` in the background.
    fn start_sync(
        &self,
        project: &mut ProjectState,
        room_id: &str,
        edited: Perspective,
    ) -> Result<SyncHandle> {
        let floorplan = project
            .floorplan
            .clone()
            .ok_or_else(|| RoomcraftError::invalid_input("No floorplan uploaded"))?;
        let room = project.room_mut(room_id)?;
        let source = ApprovedView::of(room, edited)?;
        let room_name = room.name.clone();
        room.activity = Some(RoomActivity::Syncing);
        project.syncing = true;
        project.touch();
        tracing::info!(
            "[RoomWorkflow] Syncing {} to its edited {} view",
            room_name,
            edited.label()
        );

        let this = self.clone();
        let room_id = room_id.to_string();
        Ok(tokio::spawn(async move {
            this.run_sync(room_id, floorplan, source, room_name).await
        }))
    }

    async fn run_sync(
        self,
        room_id: String,
        floorplan: ImageHandle,
        source: ApprovedView,
        room_name: String,
    ) -> Result<SyncReport> {
        let targets = style_propagation::sync_targets(source.perspective());
        let result = self
            .orchestrator
            .generate_secondary_views(&floorplan, &source, &room_name, &targets)
            .await;

        let mut project = self.state.write().await;
        project.syncing = false;
        let room = project.room_mut(&room_id)?;
        room.activity = None;
        for (perspective, image) in &result.views {
            room.generated_views.insert(*perspective, image.clone());
        }
        let active = room.active_perspective;
        let active_image = result.views.get(&active).cloned();
        if active_image.is_some() {
            room.hotspots.clear();
        }
        room.push_message(ChatMessage::system(format!(
            "Synced {} perspective(s) to the edited {} view.",
            result.views.len(),
            source.perspective().label()
        )));
        project.touch();
        drop(project);

        if let Some(image) = active_image {
            self.spawn_hotspot_refresh(&room_id, active, image);
        }

        if result.is_total_failure() {
            return Err(RoomcraftError::generation("sync", "Every perspective failed to sync"));
        }
        Ok(SyncReport {
            room_id,
            source: source.perspective(),
            updated: result.views.keys().copied().collect(),
            failed: result.failed_perspectives(),
        })
    }

    /// Recomputes hotspots for `image` without blocking the room.
    ///
    /// The result is dropped if a newer refresh for the same room and
    /// perspective was started, or if the view has changed since.
    fn spawn_hotspot_refresh(
        &self,
        room_id: &str,
        perspective: Perspective,
        image: ImageHandle,
    ) -> RefreshHandle {
        let ticket = self.refresh.issue(room_id, perspective);
        let this = self.clone();
        let room_id = room_id.to_string();

        tokio::spawn(async move {
            let hotspots = match this.orchestrator.detect_hotspots(&image).await {
                Ok(hotspots) => hotspots,
                Err(e) => {
                    tracing::warn!("[RoomWorkflow] Hotspot refresh for {} failed: {}", room_id, e);
                    Vec::new()
                }
            };

            let mut project = this.state.write().await;
            if !this.refresh.is_current(&room_id, perspective, ticket) {
                tracing::debug!("[RoomWorkflow] Dropping stale hotspot refresh for {}", room_id);
                return;
            }
            let mut applied = false;
            if let Ok(room) = project.room_mut(&room_id) {
                if room.active_perspective == perspective && room.view(perspective) == Some(&image) {
                    room.hotspots = hotspots;
                    applied = true;
                }
            }
            if applied {
                project.touch();
            }
        })
    }

    /// Reverts the room after a failed call and returns the error.
    async fn fail(&self, room_id: &str, error: RoomcraftError) -> RoomcraftError {
        tracing::warn!("[RoomWorkflow] Generation for {} failed: {}", room_id, error);
        let mut project = self.state.write().await;
        if let Ok(room) = project.room_mut(room_id) {
            if let Some(target) = room.status.revert_target() {
                room.status = target;
            }
            room.activity = None;
            room.push_message(ChatMessage::system(format!("Generation failed: {error}")));
        }
        project.touch();
        error
    }
}

fn spec_of(room: &Room) -> RoomSpec<'_> {
    RoomSpec {
        name: &room.name,
        dimensions: &room.dimensions,
        details: &room.details,
    }
}

fn current_sketch(room: &Room) -> Result<ImageHandle> {
    room.sketch_image
        .clone()
        .ok_or_else(|| RoomcraftError::not_found("SketchImage", &room.id))
}

fn ensure_project_editable(project: &ProjectState, action: &str) -> Result<()> {
    if project.syncing {
        return Err(RoomcraftError::SyncInProgress);
    }
    if project.stage == ProjectStage::Upload {
        return Err(RoomcraftError::invalid_transition(
            &project.id,
            project.stage,
            action,
        ));
    }
    Ok(())
}

fn ensure_design_stage(project: &ProjectState, action: &str) -> Result<()> {
    if !matches!(project.stage, ProjectStage::DesignLoop | ProjectStage::Export) {
        return Err(RoomcraftError::invalid_transition(
            &project.id,
            project.stage,
            action,
        ));
    }
    Ok(())
}

/// Validates a room action that does not need the floorplan.
fn begin_without_floorplan(project: &ProjectState, room_id: &str, action: RoomAction) -> Result<()> {
    if project.syncing {
        return Err(RoomcraftError::SyncInProgress);
    }
    ensure_design_stage(project, action.as_str())?;
    ensure_allowed(project.room(room_id)?, action)
}

/// Validates a room action and returns the project floorplan.
fn begin(project: &ProjectState, room_id: &str, action: RoomAction) -> Result<ImageHandle> {
    begin_without_floorplan(project, room_id, action)?;
    project
        .floorplan
        .clone()
        .ok_or_else(|| RoomcraftError::invalid_input("No floorplan uploaded"))
}

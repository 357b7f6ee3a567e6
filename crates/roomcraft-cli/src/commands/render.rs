use super::utils::{build_workflow, load_image, perspective_stem, slug, write_image};
use anyhow::{Context, Result};
use clap::Args;
use roomcraft_application::RoomWorkflow;
use roomcraft_core::analysis::{ComplianceReport, DesignAudit};
use roomcraft_core::room::{DesignPreferences, Room, RoomStatus};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Floorplan image (PNG, JPEG or WebP)
    pub floorplan: PathBuf,

    /// Output directory; one sub-directory per room
    #[arg(short, long, default_value = "renders")]
    pub out: PathBuf,

    /// Only render rooms with this name (repeatable)
    #[arg(long = "room")]
    pub rooms: Vec<String>,

    /// Project-wide style reference image
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Architectural style, e.g. "Japandi"
    #[arg(long)]
    pub style_name: Option<String>,
    #[arg(long)]
    pub palette: Option<String>,
    #[arg(long)]
    pub lighting: Option<String>,
    #[arg(long)]
    pub flooring: Option<String>,

    /// Extra notes passed to every room's generation
    #[arg(long)]
    pub notes: Option<String>,

    /// Also run a compliance audit against the floorplan
    #[arg(long)]
    pub compliance: bool,
}

impl RenderArgs {
    pub fn preferences(&self) -> DesignPreferences {
        let defaults = DesignPreferences::default();
        DesignPreferences {
            style: self.style_name.clone().unwrap_or(defaults.style),
            palette: self.palette.clone().unwrap_or(defaults.palette),
            lighting: self.lighting.clone().unwrap_or(defaults.lighting),
            flooring: self.flooring.clone().unwrap_or(defaults.flooring),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomSummary {
    name: String,
    status: RoomStatus,
    files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    design_audit: Option<DesignAudit>,
    compliance_report: Option<ComplianceReport>,
}

/// Runs every selected room through sketch, hero, secondary views and
/// completion without interaction, then writes the images and a summary.
pub async fn run(config_dir: Option<&Path>, args: RenderArgs) -> Result<()> {
    let workflow = build_workflow(config_dir).await?;
    let rooms = workflow
        .analyze_floorplan(load_image(&args.floorplan).await?)
        .await?;
    let selected = select_rooms(&rooms, &args.rooms)?;

    if let Some(style) = &args.style {
        workflow.set_global_style(Some(load_image(style).await?)).await?;
    }
    workflow
        .start_design(selected.first().map(|r| r.id.as_str()))
        .await?;
    tokio::fs::create_dir_all(&args.out)
        .await
        .with_context(|| format!("Failed to create {}", args.out.display()))?;

    let preferences = args.preferences();
    let mut summaries = Vec::with_capacity(selected.len());
    for room in &selected {
        if let Some(notes) = &args.notes {
            workflow.set_notes(&room.id, notes.clone()).await?;
        }
        let error = match render_room(&workflow, &room.id, &preferences, args.compliance).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("[CLI] Rendering {} failed: {}", room.name, e);
                Some(e.to_string())
            }
        };

        let room = workflow.room(&room.id).await?;
        let dir = args.out.join(slug(&room.name));
        summaries.push(RoomSummary {
            files: write_room(&dir, &room).await?,
            name: room.name,
            status: room.status,
            error,
            design_audit: room.design_audit,
            compliance_report: room.compliance_report,
        });
    }

    let summary_path = args.out.join("summary.json");
    tokio::fs::write(&summary_path, serde_json::to_string_pretty(&summaries)?)
        .await
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    let completed = summaries
        .iter()
        .filter(|s| s.status == RoomStatus::Completed)
        .count();
    println!(
        "Rendered {completed}/{} room(s) into {}",
        summaries.len(),
        args.out.display()
    );
    Ok(())
}

async fn render_room(
    workflow: &RoomWorkflow,
    room_id: &str,
    preferences: &DesignPreferences,
    compliance: bool,
) -> roomcraft_core::Result<()> {
    workflow.generate_sketch(room_id).await?;
    workflow.approve_sketch(room_id).await?;
    workflow
        .generate_hero(room_id, Some(preferences.clone()))
        .await?;

    if let Err(e) = workflow.approve_hero(room_id).await {
        if e.is_rejection() {
            return Err(e);
        }
        tracing::warn!("[CLI] No secondary views for {}: {}", room_id, e);
    }
    if compliance {
        if let Err(e) = workflow.run_compliance_audit(room_id).await {
            tracing::warn!("[CLI] Compliance audit for {} failed: {}", room_id, e);
        }
    }

    workflow.finish_room(room_id).await?;
    Ok(())
}

fn select_rooms(rooms: &[Room], names: &[String]) -> Result<Vec<Room>> {
    if names.is_empty() {
        return Ok(rooms.to_vec());
    }
    names
        .iter()
        .map(|name| {
            rooms
                .iter()
                .find(|r| r.name.eq_ignore_ascii_case(name.trim()))
                .cloned()
                .with_context(|| {
                    let known: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
                    format!("Unknown room '{name}'; the floorplan has: {}", known.join(", "))
                })
        })
        .collect()
}

/// Writes the sketch and every generated view of `room` into `dir`.
async fn write_room(dir: &Path, room: &Room) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut files = Vec::new();
    if let Some(sketch) = &room.sketch_image {
        files.push(write_image(dir, "sketch", sketch).await?);
    }
    for (perspective, image) in &room.generated_views {
        files.push(write_image(dir, perspective_stem(*perspective), image).await?);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcraft_core::analysis::RoomDescriptor;
    use roomcraft_core::media::ImageHandle;
    use roomcraft_core::room::Perspective;

    fn room(id: &str, name: &str) -> Room {
        Room::from_descriptor(
            id,
            RoomDescriptor {
                name: name.to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_select_rooms_by_name() {
        let rooms = vec![room("r1", "Kitchen"), room("r2", "Living Room")];

        assert_eq!(select_rooms(&rooms, &[]).unwrap().len(), 2);
        let picked = select_rooms(&rooms, &["living room".to_string()]).unwrap();
        assert_eq!(picked[0].id, "r2");

        let err = select_rooms(&rooms, &["Garage".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Kitchen, Living Room"));
    }

    #[tokio::test]
    async fn test_write_room_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut room = room("r1", "Kitchen");
        room.sketch_image = Some(ImageHandle::png(b"sketch".to_vec()));
        room.generated_views
            .insert(Perspective::Hero, ImageHandle::png(b"hero".to_vec()));
        room.generated_views
            .insert(Perspective::Detail, ImageHandle::new("image/jpeg", b"detail".to_vec()));

        let files = write_room(&dir.path().join("kitchen"), &room).await.unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sketch.png", "hero.png", "detail.jpg"]);
        assert_eq!(std::fs::read(&files[1]).unwrap(), b"hero");
    }
}

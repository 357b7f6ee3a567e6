//! Interactive Region Editor.
//!
//! Two hotspot systems share this module:
//!
//! - structural hotspots over the clay sketch, each offering a menu of
//!   geometry edits (at most one menu open per room);
//! - focus crops over a rendered view: a square region around a click that
//!   is edited in isolation and composited back.
//!
//! Pixel work (decoding, cropping, re-encoding) happens here; every
//! generation call goes through the orchestrator.

use image::ImageFormat;
use roomcraft_core::analysis::Hotspot;
use roomcraft_core::error::{Result, RoomcraftError};
use roomcraft_core::geometry::CropRegion;
use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::{FocusState, Perspective, Room, RoomMode};
use std::io::Cursor;

/// Label used when a focus click does not land near a known hotspot.
pub const DEFAULT_FOCUS_LABEL: &str = "Selected area";

/// A click within this distance (in percent) of a hotspot picks up its label.
const HOTSPOT_SNAP_PERCENT: f64 = 5.0;

/// Opens the action menu for `label`, closing any other, or closes it with `None`.
pub fn set_structural_menu(room: &mut Room, label: Option<&str>) -> Result<()> {
    if let Some(label) = label {
        ensure_structural_hotspot(room, label)?;
    }
    room.mode = RoomMode::StructuralEdit {
        open_menu: label.map(str::to_string),
    };
    Ok(())
}

/// Rejects labels that are not among the room's current structural hotspots.
pub fn ensure_structural_hotspot(room: &Room, label: &str) -> Result<()> {
    if room.structural_hotspots.iter().any(|h| h.label == label) {
        Ok(())
    } else {
        Err(RoomcraftError::not_found("StructuralHotspot", label))
    }
}

/// Picks the label of the hotspot nearest to the click, if close enough.
pub fn label_for_click(hotspots: &[Hotspot], x: f64, y: f64) -> String {
    hotspots
        .iter()
        .map(|h| (h, ((h.x - x).powi(2) + (h.y - y).powi(2)).sqrt()))
        .filter(|(_, distance)| *distance <= HOTSPOT_SNAP_PERCENT)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(h, _)| h.label.clone())
        .unwrap_or_else(|| DEFAULT_FOCUS_LABEL.to_string())
}

/// Builds a focus state for a click at `(x, y)` percent on `image`.
///
/// Both crop handles start out identical.
pub fn focus_at(
    image: &ImageHandle,
    perspective: Perspective,
    x: f64,
    y: f64,
    label: String,
) -> Result<FocusState> {
    let decoded = image::load_from_memory(image.bytes())?;
    let region = CropRegion::centered(decoded.width(), decoded.height(), x, y);
    let crop = decoded.crop_imm(region.x, region.y, region.size, region.size);

    let mut encoded = Cursor::new(Vec::new());
    crop.write_to(&mut encoded, ImageFormat::Png)?;
    let crop = ImageHandle::png(encoded.into_inner());

    tracing::debug!(
        "[RegionEditor] Focus crop {}x{} at ({}, {}) for '{}'",
        region.size,
        region.size,
        region.x,
        region.y,
        label
    );

    Ok(FocusState {
        x: x.clamp(0.0, 100.0),
        y: y.clamp(0.0, 100.0),
        label,
        perspective,
        region,
        original_crop: crop.clone(),
        current_crop: crop,
    })
}

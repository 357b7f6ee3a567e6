//! Instruction text sent alongside each generation request.
//!
//! Image inputs are referred to by the labels attached to them, so the
//! label constants here and the wording below must stay in step.

use roomcraft_core::room::{DesignPreferences, Perspective, StructuralAction};

pub const FLOORPLAN: &str = "Input 1 (Floorplan)";
pub const MASTER_STYLE: &str = "Input 2 (Project Master Style)";
pub const STYLE_REFERENCE: &str = "Input 3 (Style Reference)";
pub const SKETCH: &str = "Structural Sketch";
pub const SOURCE_VIEW: &str = "Input 2 (Source View)";
pub const CURRENT_IMAGE: &str = "Input 1 (Current Image)";
pub const EDIT_REFERENCE: &str = "Input 2 (Visual Reference)";
pub const FULL_IMAGE: &str = "Input 1 (Full Image)";
pub const EDITED_CROP: &str = "Input 2 (Edited Region)";
pub const RENDER: &str = "Rendered Image";

/// Room identity passed into prompts.
#[derive(Debug, Clone, Copy)]
pub struct RoomSpec<'a> {
    pub name: &'a str,
    pub dimensions: &'a str,
    pub details: &'a str,
}

pub fn analyze_floorplan_system() -> &'static str {
    "You are an expert architectural plan reader. Identify every distinct room or space \
     in the floorplan. For each, give \"name\", \"dimensions\" (as labelled, or an estimate \
     such as \"Compact\" or \"approx 150 sqft\"), \"details\" (key features or furniture \
     layout) and \"structuralConstraints\" (walls, doors, windows and fixtures that must \
     not move). Return only a JSON array of objects."
}

pub fn analyze_floorplan() -> &'static str {
    "Analyze this floorplan and list its rooms as JSON."
}

pub fn structural_sketch_system() -> &'static str {
    "You are an architectural massing engine. Produce a textureless clay model render: \
     white surfaces, soft ambient occlusion, no materials, no colour, no decor. \
     Geometry must follow the floorplan exactly."
}

pub fn structural_sketch(room: RoomSpec<'_>, constraints: &str, notes: &str) -> String {
    format!(
        "{FLOORPLAN} is the absolute truth for geometry. Locate \"{name}\" and render it as an \
         eye-level clay model.\nDIMENSIONS: {dims}\nDETAILS: {details}\n\
         IMMUTABLE FIXTURES: {constraints}\nUSER NOTES: {notes}",
        name = room.name,
        dims = room.dimensions,
        details = room.details,
        notes = or_none(notes),
    )
}

pub fn hero_system(room: RoomSpec<'_>, preferences: &DesignPreferences) -> String {
    format!(
        "You are an architectural visualization engine. Render \"{name}\" from the floorplan \
         as a photorealistic {perspective} view.\n\
         Walls, windows and furniture positions come from the floorplan and sketch only; \
         style references contribute materials and colours, never shapes.\n\
         DESIGN SPECIFICATIONS:\n\
         - ARCHITECTURAL STYLE: {style}\n\
         - COLOR PALETTE: {palette}\n\
         - LIGHTING MOOD: {lighting}\n\
         - FLOORING MATERIAL: {flooring}",
        name = room.name,
        perspective = Perspective::Hero.label(),
        style = preferences.style,
        palette = preferences.palette,
        lighting = preferences.lighting,
        flooring = preferences.flooring,
    )
}

pub fn hero(
    room: RoomSpec<'_>,
    has_sketch: bool,
    has_master: bool,
    has_reference: bool,
    notes: &str,
) -> String {
    let mut text = format!("{FLOORPLAN}: geometry source. Focus only on {}.\n", room.name);
    if has_sketch {
        text.push_str(&format!(
            "{SKETCH}: approved clay model. Match its geometry and camera exactly.\n"
        ));
    }
    if has_master {
        text.push_str(&format!(
            "{MASTER_STYLE}: match this lighting, rendering style and material palette. \
             Consistency with it is mandatory and overrides every other style input.\n"
        ));
    }
    if has_reference {
        text.push_str(&format!(
            "{STYLE_REFERENCE}: use specific textures from here where the master style \
             does not define them.\n"
        ));
    }
    text.push_str(&format!(
        "GENERATE: {perspective} of {name}.\nDIMENSIONS: {dims}.\n\
         STRUCTURAL DETAILS: {details}.\nUSER NOTES: {notes}",
        perspective = Perspective::Hero.label(),
        name = room.name,
        dims = room.dimensions,
        details = room.details,
        notes = or_none(notes),
    ));
    text
}

pub fn secondary_view_system(perspective: Perspective) -> String {
    let extra = match perspective {
        Perspective::Overhead => "Show an isometric cutaway from above.",
        Perspective::Detail => "Focus on one key design element such as a texture or setting.",
        Perspective::Wide => "Show the full room from a corner.",
        Perspective::Hero => "Use a natural eye-level camera.",
    };
    format!(
        "You are a 3D camera engine. Generate a new view of the room shown in the source \
         view. PERSPECTIVE: {label}. The room must look identical in furniture, materials, \
         colours and lighting. Do not invent objects or change style; only move the camera. \
         {extra}",
        label = perspective.label(),
    )
}

pub fn secondary_view(room_name: &str, perspective: Perspective) -> String {
    format!(
        "{FLOORPLAN}: spatial layout. {SOURCE_VIEW}: the source of truth. \
         Generate the {label} view of {room_name}.",
        label = perspective.label(),
    )
}

pub fn refine_system() -> &'static str {
    "You are an expert interior design editor. Edit the image according to the \
     instruction. Do not move walls or windows and do not change the camera angle. \
     Keep lighting consistent unless asked. Change only what the instruction names. \
     If a visual reference is provided, it is the strict source of truth for the \
     requested object or material."
}

pub fn refine(instruction: &str, has_reference: bool) -> String {
    let mut text = format!("{CURRENT_IMAGE}: the image to edit.\n");
    if has_reference {
        text.push_str(&format!(
            "{EDIT_REFERENCE}: use the style or object shown here for the edit.\n"
        ));
    }
    text.push_str(&format!("EDIT INSTRUCTION: {instruction}"));
    text
}

pub fn detect_hotspots() -> &'static str {
    "Identify up to eight distinct, editable objects or surfaces in this render \
     (furniture, fixtures, finishes). Return only a JSON array of \
     {\"label\": string, \"x\": number, \"y\": number} where x and y are the object's \
     centre in percent of image width and height."
}

pub fn detect_structural_hotspots() -> &'static str {
    "This is a clay model of a room. Identify moveable structural elements (doors, \
     windows, partition walls, built-in fixtures). Return only a JSON array of \
     {\"label\": string, \"x\": number, \"y\": number} with positions in percent. \
     Labels must be unique."
}

pub fn modify_structure(action: StructuralAction, target_label: &str) -> String {
    let verb = match action {
        StructuralAction::MoveLeft => "Move it to the left along its wall.",
        StructuralAction::MoveRight => "Move it to the right along its wall.",
        StructuralAction::Rotate90 => "Rotate it by 90 degrees in place.",
        StructuralAction::Delete => "Remove it entirely and fill the gap with plain wall or floor.",
    };
    format!(
        "{SKETCH}: current clay model. Target element: \"{target_label}\". {verb} \
         Keep every other element and the camera unchanged. Output a clay model render."
    )
}

pub fn compliance_audit(room_name: &str) -> String {
    format!(
        "Compare the {RENDER} of {room_name} against {FLOORPLAN}. Check wall positions, \
         doors, windows and fixed fixtures. Return only JSON: {{\"compliant\": bool, \
         \"summary\": string, \"issues\": [{{\"element\": string, \"expected\": string, \
         \"observed\": string}}]}}"
    )
}

pub fn design_audit(room_name: &str) -> String {
    format!(
        "Act as a senior interior designer reviewing the {RENDER} of {room_name}. \
         Return only JSON: {{\"score\": 0-100, \"summary\": string, \
         \"strengths\": [string], \"suggestions\": [string]}}"
    )
}

pub fn composite_crop(width: u32, height: u32, x: u32, y: u32, size: u32) -> String {
    format!(
        "{FULL_IMAGE} is {width}x{height} pixels. {EDITED_CROP} is an edited version of the \
         {size}x{size} square whose top-left corner is at ({x}, {y}). Blend the edited \
         region back into the full image at that position, matching lighting and \
         perspective at the seams. Leave everything outside the region unchanged."
    )
}

fn or_none(notes: &str) -> &str {
    if notes.trim().is_empty() { "None" } else { notes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_mentions_only_present_inputs() {
        let room = RoomSpec {
            name: "Kitchen",
            dimensions: "12' x 12'",
            details: "Island",
        };
        let text = hero(room, false, true, false, "");
        assert!(text.contains(MASTER_STYLE));
        assert!(!text.contains(STYLE_REFERENCE));
        assert!(!text.contains(SKETCH));
        assert!(text.contains("USER NOTES: None"));
    }

    #[test]
    fn test_refine_reference_wording() {
        assert!(refine("make it blue", true).contains(EDIT_REFERENCE));
        assert!(!refine("make it blue", false).contains(EDIT_REFERENCE));
    }
}

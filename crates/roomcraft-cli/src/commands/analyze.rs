use super::utils::{build_workflow, load_image};
use anyhow::Result;
use std::path::Path;

/// Prints the analysed rooms as JSON.
pub async fn run(config_dir: Option<&Path>, floorplan: &Path) -> Result<()> {
    let workflow = build_workflow(config_dir).await?;
    let rooms = workflow.analyze_floorplan(load_image(floorplan).await?).await?;

    let listing: Vec<serde_json::Value> = rooms
        .iter()
        .map(|room| {
            serde_json::json!({
                "id": room.id,
                "name": room.name,
                "dimensions": room.dimensions,
                "details": room.details,
                "structuralConstraints": room.structural_constraints,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

use anyhow::{Context, Result};
use roomcraft_application::{GenerationOrchestrator, RoomWorkflow};
use roomcraft_core::error::RoomcraftError;
use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::Perspective;
use roomcraft_infrastructure::{ConfigService, SecretServiceImpl};
use roomcraft_interaction::GeminiImageClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Wires config, secrets and the Gemini client into a fresh workflow.
pub async fn build_workflow(config_dir: Option<&Path>) -> Result<RoomWorkflow> {
    let config = ConfigService::new(config_dir).get_config()?;
    let secrets = SecretServiceImpl::new(config_dir)?;

    let client = match GeminiImageClient::try_from_secrets(&secrets, config.generation.clone()).await
    {
        Ok(client) => client,
        Err(RoomcraftError::CredentialMissing) => anyhow::bail!(
            "No API key configured. Run `roomcraft init-secret` and fill in {}",
            secrets.file_path().display()
        ),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "[CLI] Using image model {} (analysis: {})",
        client.settings().image_model,
        client.settings().analysis_model
    );
    let orchestrator = GenerationOrchestrator::with_settings(Arc::new(client), &config.generation);
    Ok(RoomWorkflow::new(orchestrator))
}

pub async fn load_image(path: &Path) -> Result<ImageHandle> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(ImageHandle::new(ImageHandle::mime_type_for_path(path), bytes))
}

pub async fn write_image(dir: &Path, stem: &str, image: &ImageHandle) -> Result<PathBuf> {
    let path = dir.join(format!("{stem}.{}", image.extension()));
    tokio::fs::write(&path, image.bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Lowercase ASCII directory name for a room.
pub fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "room".to_string()
    } else {
        slug.to_string()
    }
}

pub fn perspective_stem(perspective: Perspective) -> &'static str {
    match perspective {
        Perspective::Hero => "hero",
        Perspective::Wide => "wide",
        Perspective::Overhead => "overhead",
        Perspective::Detail => "detail",
    }
}

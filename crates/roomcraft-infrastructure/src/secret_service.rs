//! Secret service implementation.
//!
//! This module provides a service for loading the secret configuration
//! (API keys) stored in secret.json.

use crate::paths::RoomcraftPaths;
use roomcraft_core::config::SecretConfig;
use roomcraft_core::error::{Result, RoomcraftError};
use roomcraft_core::secret::SecretService;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Service for loading secret configuration.
///
/// Reads secret.json once and caches it to avoid repeated file I/O.
///
/// # Example
///
/// ```ignore
/// use roomcraft_infrastructure::SecretServiceImpl;
/// use roomcraft_core::secret::SecretService;
///
/// let service = SecretServiceImpl::new(None)?;
/// let secrets = service.load_secrets().await?;
/// ```
#[derive(Clone)]
pub struct SecretServiceImpl {
    /// Cached secret config, populated on first load.
    secrets: Arc<RwLock<Option<SecretConfig>>>,
    file_path: PathBuf,
}

impl SecretServiceImpl {
    /// Creates a new SecretServiceImpl.
    ///
    /// `base_path` replaces the platform config directory when given.
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let file_path = RoomcraftPaths::new(base_path)
            .secret_file()
            .map_err(|e| RoomcraftError::config(format!("Failed to get secret path: {}", e)))?;

        Ok(Self {
            secrets: Arc::new(RwLock::new(None)),
            file_path,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    async fn load_from_disk(&self) -> Result<SecretConfig> {
        let content = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "[SecretService] {} not found, no credentials configured",
                    self.file_path.display()
                );
                return Ok(SecretConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            RoomcraftError::config(format!(
                "Failed to parse {}: {}",
                self.file_path.display(),
                e
            ))
        })
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        if let Some(cached) = self.secrets.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let loaded = self.load_from_disk().await?;
        *self.secrets.write().await = Some(loaded.clone());
        Ok(loaded)
    }

    async fn secret_file_exists(&self) -> bool {
        tokio::fs::try_exists(&self.file_path).await.unwrap_or(false)
    }
}

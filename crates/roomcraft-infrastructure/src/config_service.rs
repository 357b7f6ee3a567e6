//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/roomcraft/config.toml).

use crate::paths::RoomcraftPaths;
use roomcraft_core::config::RootConfig;
use roomcraft_core::error::{Result, RoomcraftError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the root configuration.
///
/// A missing file yields defaults and is written out so users have
/// something to edit. Missing keys inside an existing file fall back to
/// their defaults.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
    paths: RoomcraftPaths,
}

impl ConfigService {
    /// Creates a new ConfigService.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            paths: RoomcraftPaths::new(base_path),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn load_config(&self) -> Result<RootConfig> {
        let config_path = self.config_path()?;

        if !config_path.exists() {
            let default_config = RootConfig::default();
            if let Err(e) = Self::write_default(&config_path, &default_config) {
                tracing::warn!(
                    "[ConfigService] Could not write default config to {}: {}",
                    config_path.display(),
                    e
                );
            }
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: RootConfig = toml::from_str(&content).map_err(|e| {
            RoomcraftError::config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
        tracing::debug!("[ConfigService] Loaded {}", config_path.display());
        Ok(config)
    }

    fn write_default(path: &Path, config: &RootConfig) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(config)?)?;
        Ok(())
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        self.paths
            .config_file()
            .map_err(|e| RoomcraftError::config(e.to_string()))
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcraft_core::config::DEFAULT_IMAGE_MODEL;

    #[test]
    fn test_missing_config_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(Some(dir.path()));

        let config = service.get_config().unwrap();
        assert_eq!(config, RootConfig::default());
        assert!(dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_partial_config_and_cache_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generation]\nrequest_timeout_secs = 15\n").unwrap();
        let service = ConfigService::new(Some(dir.path()));

        let config = service.get_config().unwrap();
        assert_eq!(config.generation.request_timeout_secs, 15);
        assert_eq!(config.generation.image_model, DEFAULT_IMAGE_MODEL);

        std::fs::write(&path, "[generation]\nrequest_timeout_secs = 45\n").unwrap();
        assert_eq!(service.get_config().unwrap().generation.request_timeout_secs, 15);

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().generation.request_timeout_secs, 45);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[generation\n").unwrap();
        let service = ConfigService::new(Some(dir.path()));

        assert!(matches!(
            service.get_config().unwrap_err(),
            RoomcraftError::Config(_)
        ));
    }
}

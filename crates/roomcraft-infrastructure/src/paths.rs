//! Unified path management for roomcraft configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/roomcraft/         # Config directory
//! ├── config.toml              # Generation settings
//! └── secret.json              # API keys
//! ```
//!
//! Every service also accepts an explicit base directory, which replaces
//! `~/.config/roomcraft` (used by tests and by the CLI's `--config-dir`).

use roomcraft_core::config::{GeminiConfig, SecretConfig};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "roomcraft";
const CONFIG_FILE: &str = "config.toml";
const SECRET_FILE: &str = "secret.json";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves roomcraft's configuration paths.
#[derive(Debug, Clone, Default)]
pub struct RoomcraftPaths {
    base: Option<PathBuf>,
}

impl RoomcraftPaths {
    /// Uses `base` instead of the platform config directory when given.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory (e.g. `~/.config/roomcraft/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to config.toml.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the path to secret.json.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(SECRET_FILE))
    }

    /// Ensures the secret file exists, creating it with a template if it doesn't.
    ///
    /// The template has an empty Gemini key, so generation still reports a
    /// missing credential until the user fills it in. On Unix the file is
    /// created with mode 600.
    pub fn ensure_secret_file(&self) -> Result<PathBuf, std::io::Error> {
        let secret_path = self
            .secret_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        if secret_path.exists() {
            return Ok(secret_path);
        }

        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template_config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: Some(roomcraft_core::config::DEFAULT_IMAGE_MODEL.to_string()),
            }),
        };

        let template_json = serde_json::to_string_pretty(&template_config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        std::fs::write(&secret_path, template_json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        Ok(secret_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RoomcraftPaths::new(Some(dir.path()));
        assert_eq!(paths.config_file().unwrap(), dir.path().join("config.toml"));
        assert_eq!(paths.secret_file().unwrap(), dir.path().join("secret.json"));
    }

    #[test]
    fn test_ensure_secret_file_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RoomcraftPaths::new(Some(&dir.path().join("nested")));

        let path = paths.ensure_secret_file().unwrap();
        let written: SecretConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.gemini_api_key(), None);

        std::fs::write(&path, r#"{"gemini":{"api_key":"k"}}"#).unwrap();
        paths.ensure_secret_file().unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"k\""));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}

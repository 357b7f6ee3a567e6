//! Configuration types shared across crates.
//!
//! `RootConfig` mirrors `config.toml`; `SecretConfig` mirrors `secret.json`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Root configuration structure for config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Settings for talking to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model used for every image-producing request.
    pub image_model: String,
    /// Model used for floorplan analysis, hotspot detection and audits.
    pub analysis_model: String,
    pub base_url: String,
    /// Upper bound for a single call; the service itself has none.
    pub request_timeout_secs: u64,
    pub hero_aspect_ratio: String,
    pub image_size: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            analysis_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
            hero_aspect_ratio: "16:9".to_string(),
            image_size: "1K".to_string(),
        }
    }
}

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

impl SecretConfig {
    /// The Gemini API key, if one is configured and non-blank.
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .as_ref()
            .map(|g| g.api_key.trim())
            .filter(|key| !key.is_empty())
    }
}

/// Gemini API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RootConfig = toml::from_str(
            r#"
            [generation]
            request_timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.request_timeout_secs, 30);
        assert_eq!(config.generation.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.generation.hero_aspect_ratio, "16:9");
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let secrets = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "   ".into(),
                model_name: None,
            }),
        };
        assert_eq!(secrets.gemini_api_key(), None);
        assert_eq!(SecretConfig::default().gemini_api_key(), None);
    }
}

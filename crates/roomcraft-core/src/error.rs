//! Error types for the Roomcraft application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Roomcraft application.
///
/// Variants line up with how the workflow reacts to them:
/// - `CredentialMissing` is fatal to any generation call and never retried
/// - `Generation` / `Timeout` are recoverable; the room reverts to its prior status
/// - `InvalidTransition` / `RoomBusy` / `SyncInProgress` reject an action before
///   any generation call is made
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomcraftError {
    /// No API credential is available for the generation service
    #[error("API credential missing: configure an API key before generating")]
    CredentialMissing,

    /// A single call into the generation service failed
    #[error("Generation failed during {operation}: {message}")]
    Generation {
        operation: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The generation service did not answer in time
    #[error("Generation timed out during {operation}")]
    Timeout { operation: String },

    /// The requested action is not legal in the room's current status
    #[error("Action '{action}' is not allowed for room '{room_id}' in status '{status}'")]
    InvalidTransition {
        room_id: String,
        status: String,
        action: String,
    },

    /// A generation call is already outstanding for the room
    #[error("Room '{room_id}' is busy with another generation call")]
    RoomBusy { room_id: String },

    /// A propagation sync is running; edits are blocked until it finishes
    #[error("A propagation sync is in progress")]
    SyncInProgress,

    /// Caller supplied unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Image decoding/encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoomcraftError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Generation error without an HTTP status
    pub fn generation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            operation: operation.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates an InvalidTransition error
    pub fn invalid_transition(
        room_id: impl Into<String>,
        status: impl std::fmt::Display,
        action: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            room_id: room_id.into(),
            status: status.to_string(),
            action: action.into(),
        }
    }

    /// Creates a RoomBusy error
    pub fn room_busy(room_id: impl Into<String>) -> Self {
        Self::RoomBusy {
            room_id: room_id.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a missing-credential error
    pub fn is_credential_missing(&self) -> bool {
        matches!(self, Self::CredentialMissing)
    }

    /// Check if this error came from a generation call (including timeouts)
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::Timeout { .. })
    }

    /// Check if this error rejected an action before any call was made
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::RoomBusy { .. } | Self::SyncInProgress
        )
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RoomcraftError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RoomcraftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RoomcraftError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for RoomcraftError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for RoomcraftError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

/// Conversion from anyhow::Error (used at infrastructure boundaries)
impl From<anyhow::Error> for RoomcraftError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for RoomcraftError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, RoomcraftError>`.
pub type Result<T> = std::result::Result<T, RoomcraftError>;

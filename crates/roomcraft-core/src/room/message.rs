//! Chat message types for the per-room refinement conversation.

use crate::media::ImageHandle;
use serde::{Deserialize, Serialize};

/// Represents the role of a message in a room's chat history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the design assistant.
    Assistant,
    /// Workflow-authored message (transitions, failures).
    System,
}

/// A single entry in a room's chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Timestamp when the message was created (RFC 3339).
    pub timestamp: String,
    /// Reference image attached by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<ImageHandle>,
}

impl ChatMessage {
    fn now(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            attachment: None,
        }
    }

    pub fn user(content: impl Into<String>, attachment: Option<ImageHandle>) -> Self {
        Self {
            attachment,
            ..Self::now(MessageRole::User, content)
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::now(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::now(MessageRole::System, content)
    }
}

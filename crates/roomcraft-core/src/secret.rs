//! Secret management service trait.
//!
//! Defines the interface for loading the API credential the generation
//! service requires. Acquiring and storing credentials happens elsewhere.

use crate::config::SecretConfig;
use crate::error::Result;

/// Service for managing secret configuration.
///
/// Implementations should ensure that:
/// - Secret files have appropriate permissions (e.g., 600 on Unix)
/// - Secrets are never logged or exposed in error messages
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    async fn load_secrets(&self) -> Result<SecretConfig>;

    /// Checks if the secret file exists.
    async fn secret_file_exists(&self) -> bool;
}

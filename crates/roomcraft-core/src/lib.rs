//! Domain layer for Roomcraft.
//!
//! Holds the project/room model, the generation-service boundary, typed
//! analysis results and configuration types. Nothing here performs I/O
//! beyond decoding image headers.

pub mod analysis;
pub mod config;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod media;
pub mod room;
pub mod secret;

// Re-export common types
pub use error::{Result, RoomcraftError};
pub use generation::{GenerationClient, GenerationOptions, GenerationRequest, GenerationTask};
pub use media::ImageHandle;

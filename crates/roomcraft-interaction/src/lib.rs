//! Interaction layer: clients for the external generation service.

pub mod gemini_image_client;

pub use gemini_image_client::GeminiImageClient;

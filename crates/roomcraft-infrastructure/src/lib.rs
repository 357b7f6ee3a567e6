//! Infrastructure layer: filesystem-backed configuration and secrets.

pub mod config_service;
pub mod paths;
pub mod secret_service;

pub use config_service::ConfigService;
pub use paths::RoomcraftPaths;
pub use secret_service::SecretServiceImpl;

pub mod analyze;
pub mod render;
pub mod setup;
pub mod utils;

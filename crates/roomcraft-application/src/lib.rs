//! Application layer for Roomcraft.
//!
//! - `orchestrator`: dependency-ordered calls into the generation service
//! - `style_propagation`: the set-once master style and sync targets
//! - `region_editor`: structural menus and focus-crop geometry
//! - `workflow`: the room lifecycle state machine driving all of the above
//! - `prompts`: instruction text for each request

pub mod orchestrator;
pub mod prompts;
pub mod region_editor;
pub mod style_propagation;
pub mod workflow;

pub use orchestrator::{ApprovedView, GenerationOrchestrator, HeroInputs, SecondaryViews};
pub use workflow::RoomWorkflow;

//! Runtime wiring: logging setup and the workflow event stream.

pub mod logging;
pub mod tracing_layer;

pub use logging::{LogFormat, init_logging};
pub use tracing_layer::{WorkflowEvent, WorkflowEventLayer};

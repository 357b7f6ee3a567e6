//! Process-wide tracing setup.

use crate::tracing_layer::{WorkflowEvent, WorkflowEventLayer};
use roomcraft_core::error::{Result, RoomcraftError};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "roomcraft=info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Builds the filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| RoomcraftError::config(format!("Invalid log filter '{default_directive}': {e}"))),
    }
}

/// Installs the global subscriber: env filter, a stderr fmt layer and,
/// when `events` is given, a [`WorkflowEventLayer`] feeding it.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(
    format: LogFormat,
    events: Option<mpsc::UnboundedSender<WorkflowEvent>>,
) -> Result<()> {
    let filter = env_filter(DEFAULT_FILTER)?;
    let pretty = (format == LogFormat::Pretty)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(events.map(WorkflowEventLayer::new))
        .try_init()
        .map_err(|e| RoomcraftError::internal(format!("Failed to install tracing subscriber: {e}")))?;

    tracing::debug!("[Logging] Tracing initialised ({:?})", format);
    Ok(())
}

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::ObservabilityConfig;
use crate::lifecycle::Owner;

/// Initialize structured logging.
///
/// Logs go to stderr so command output stays machine-readable. JSON output carries
/// the current span and span list so transition logs can be correlated; `RUST_LOG`
/// directives take precedence over the configured level.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_level))?;

    if config.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    }

    tracing::debug!("Lifecycle telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the phases of one transition
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping every phase of a single transition
pub fn transition_span(owner: &Owner, transition: &str, correlation_id: &str) -> tracing::Span {
    let owner_id = owner.id().map(|id| id.to_string()).unwrap_or_default();
    tracing::info_span!(
        "transition",
        owner.kind = owner.kind(),
        owner.id = %owner_id,
        transition = transition,
        correlation.id = correlation_id
    )
}

/// Span wrapping a command's execute pipeline
pub fn command_span(code: &str, id: &str) -> tracing::Span {
    tracing::info_span!("command", command.code = code, command.id = id)
}

//! Structured logging to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber in the configured format, respecting
/// `RUST_LOG` when set and the configured level otherwise.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })?;

    tracing::debug!(
        event = events::STARTUP,
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "logging initialized"
    );
    Ok(())
}

/// Standard log event names.
pub mod events {
    /// A command or server is starting.
    pub const STARTUP: &str = "startup";

    /// Server is shutting down.
    pub const SHUTDOWN: &str = "shutdown";

    /// Server is listening on an address.
    pub const LISTENING: &str = "listening";

    /// A fragment file has been parsed.
    pub const FRAGMENT_LOADED: &str = "fragment_loaded";

    /// A fragment parsed to an empty document.
    pub const NULL_FRAGMENT: &str = "null_fragment";

    /// Two fragments derived the same schema name.
    pub const SCHEMA_COLLISION: &str = "schema_collision";

    /// Document assembly failed.
    pub const ASSEMBLY_FAILED: &str = "assembly_failed";

    /// The composed document was served over HTTP.
    pub const DOCUMENT_SERVED: &str = "document_served";

    /// An artifact file was written.
    pub const ARTIFACT_WRITTEN: &str = "artifact_written";

    /// A directory entry was skipped while listing fragments.
    pub const ENTRY_SKIPPED: &str = "entry_skipped";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_startup {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::STARTUP,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_shutdown {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SHUTDOWN,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_listening {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::LISTENING,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_assembly_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::ASSEMBLY_FAILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_document_served {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DOCUMENT_SERVED,
            $($field)*
        )
    };
}

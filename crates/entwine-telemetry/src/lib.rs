//! Logging infrastructure for entwine.
//!
//! Structured logs go to stderr so generated documents printed on stdout
//! stay clean. JSON output suits CI pipelines, text and pretty output suit
//! interactive use.
//!
//! # Usage
//!
//! ```ignore
//! use entwine_telemetry::{LogFormat, TelemetryConfig};
//!
//! let config = TelemetryConfig::new()
//!     .with_log_level("debug")
//!     .with_log_format(LogFormat::Json);
//!
//! entwine_telemetry::init(&config)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::{events, init_logging as init};

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Unknown log format name.
    #[error("unknown log format '{0}' (expected text, pretty or json)")]
    UnknownFormat(String),
}

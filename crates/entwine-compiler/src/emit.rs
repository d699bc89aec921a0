//! Rendering and writing of generated artifacts.

use std::path::Path;

use serde::Serialize;
use entwine_telemetry::events;

use crate::error::CompileError;

/// Render a value as YAML.
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, CompileError> {
    Ok(serde_yaml::to_string(value)?)
}

/// Render a value as pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CompileError> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Write an artifact, replacing any existing file. Missing parent
/// directories are created.
pub async fn write_output(path: &Path, contents: &str) -> Result<(), CompileError> {
    let write_error = |source: std::io::Error| CompileError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, contents).await.map_err(write_error)?;
    tracing::debug!(event = events::ARTIFACT_WRITTEN, path = %path.display(), bytes = contents.len(), "artifact written");
    Ok(())
}

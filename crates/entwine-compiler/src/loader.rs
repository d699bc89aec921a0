//! Directory listing and YAML fragment parsing.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use entwine_telemetry::events;

use crate::error::{CompileError, DirectoryKind};
use crate::naming::Category;

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Path the fragment was read from.
    pub path: PathBuf,
    /// Category decided by the fragment's location.
    pub category: Category,
    /// Parsed document; `Null` for an empty file.
    pub tree: Value,
}

impl Fragment {
    /// Read and parse a fragment file.
    pub async fn load(path: PathBuf, category: Category) -> Result<Self, CompileError> {
        let tree = read_tree(&path).await?;
        tracing::debug!(event = events::FRAGMENT_LOADED, path = %path.display(), category = category.as_str(), "fragment loaded");
        Ok(Self {
            path,
            category,
            tree,
        })
    }

    /// File name of the fragment, as listed in its directory.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

/// Read a YAML file into a tree.
pub async fn read_tree(path: &Path) -> Result<Value, CompileError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CompileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_fragment(&content, path)
}

/// Parse YAML fragment text into a tree.
///
/// A document with no content (blank, or only comments and markers)
/// parses to `Null`. Merge keys (`<<: *anchor`) are resolved.
pub fn parse_fragment(content: &str, path: &Path) -> Result<Value, CompileError> {
    if is_blank_document(content) {
        return Ok(Value::Null);
    }
    let parse_error = |source: serde_yaml::Error| CompileError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let mut yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(parse_error)?;
    yaml.apply_merge().map_err(parse_error)?;
    serde_yaml::from_value(yaml).map_err(parse_error)
}

/// List the regular files of a convention directory, sorted by name.
///
/// Names that are not valid UTF-8 cannot be turned into schema names; they
/// are skipped with a warning.
pub async fn list_dir(dir: &Path, kind: DirectoryKind) -> Result<Vec<String>, CompileError> {
    let read_error = |source: std::io::Error| CompileError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CompileError::MissingDirectory {
                kind,
                path: dir.to_path_buf(),
            })
        }
        Err(e) => return Err(read_error(e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        if entry.file_type().await.map_err(read_error)?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!(
                event = events::ENTRY_SKIPPED,
                dir = %dir.display(),
                name = %raw.to_string_lossy(),
                "skipping file whose name is not valid UTF-8"
            ),
        }
    }
    names.sort();
    Ok(names)
}

pub(crate) fn is_blank_document(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::refs::RewriteError;

/// Convention directories the assembler expects to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    /// Entity fragments (`entities/`).
    Entities,
    /// Write-input fragments (`entities/writes/`).
    Writes,
    /// Path fragments (`paths/`).
    Paths,
}

impl DirectoryKind {
    /// Manifest key that overrides this directory's location.
    pub fn manifest_key(self) -> &'static str {
        match self {
            DirectoryKind::Entities => "entities",
            DirectoryKind::Writes => "writes",
            DirectoryKind::Paths => "paths",
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_key())
    }
}

/// Errors produced while assembling or emitting a document.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A convention directory does not exist.
    #[error(
        "{kind} directory not found: {} (create it or set `{}` in entwine.yaml)",
        path.display(),
        kind.manifest_key()
    )]
    MissingDirectory { kind: DirectoryKind, path: PathBuf },

    /// A directory or fragment could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fragment is not valid YAML.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A fragment parsed but its shape cannot be merged.
    #[error("invalid fragment {}: {reason}", path.display())]
    InvalidFragment { path: PathBuf, reason: String },

    /// A `$ref` inside a fragment could not be rewritten.
    #[error("{}: {source}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: RewriteError,
    },

    /// A `$ref` target could not be found while dereferencing.
    #[error("unresolved $ref '{reference}' in {}", path.display())]
    UnresolvedRef { reference: String, path: PathBuf },

    /// A `$ref` chain loops back on itself while dereferencing.
    #[error("circular $ref: {0}")]
    CircularRef(String),

    /// Project manifest could not be loaded.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML rendering error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON rendering error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    /// Whether the failure comes from the filesystem rather than fragment content.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            CompileError::MissingDirectory { .. }
                | CompileError::Read { .. }
                | CompileError::Write { .. }
        )
    }
}

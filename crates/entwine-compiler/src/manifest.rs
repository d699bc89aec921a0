//! Project manifest (`entwine.yaml`) parser.
//!
//! Every key is optional; a project without a manifest uses the
//! conventional layout (`entities/`, `entities/writes/`, `paths/`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::loader::is_blank_document;

/// Manifest file name looked up in the project root.
pub const MANIFEST_FILE: &str = "entwine.yaml";

/// A project manifest (`entwine.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectManifest {
    /// Entity fragments directory, relative to the project root.
    pub entities: String,
    /// Write fragments directory, relative to the entities directory.
    pub writes: String,
    /// Path fragments directory, relative to the project root.
    pub paths: String,
    /// Metadata fragment, relative to the paths directory.
    pub metadata: String,
    /// `openapi` version written when the metadata does not set one.
    pub openapi: String,
    /// Output file names.
    pub output: OutputConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

/// Output file names, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub schemas: String,
    pub spec: String,
    pub reference: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ProjectManifest {
    fn default() -> Self {
        Self {
            entities: "entities".into(),
            writes: "writes".into(),
            paths: "paths".into(),
            metadata: "_metadata.yml".into(),
            openapi: "3.0.3".into(),
            output: OutputConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            schemas: "openApiSchemas.yml".into(),
            spec: "openApi.yml".into(),
            reference: "API_REFERENCE.md".into(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".into(),
        }
    }
}

impl ProjectManifest {
    /// Load a manifest from a YAML file.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::Manifest(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content, path)
    }

    /// Parse a manifest from YAML content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, CompileError> {
        if is_blank_document(content) {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| {
            CompileError::Manifest(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Find the manifest for a project.
    ///
    /// An explicit path must exist. Otherwise `entwine.yaml` in `root` is
    /// used when present, and defaults apply when it is not.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self, CompileError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = root.join(MANIFEST_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using project manifest");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the fragment directories against a project root.
    pub fn layout(&self, root: &Path) -> ProjectLayout {
        let entities = root.join(&self.entities);
        let paths = root.join(&self.paths);
        ProjectLayout {
            root: root.to_path_buf(),
            writes: entities.join(&self.writes),
            metadata: paths.join(&self.metadata),
            entities,
            paths,
            openapi_version: self.openapi.clone(),
        }
    }

    /// Resolve an output file name against a project root.
    pub fn output_path(&self, root: &Path, file: &str) -> PathBuf {
        root.join(file)
    }
}

/// Resolved locations of a project's fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub entities: PathBuf,
    pub writes: PathBuf,
    pub paths: PathBuf,
    pub metadata: PathBuf,
    pub openapi_version: String,
}

impl ProjectLayout {
    /// Conventional layout rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        ProjectManifest::default().layout(root.as_ref())
    }
}

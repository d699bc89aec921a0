//! Assembles an OpenAPI document from a directory of YAML fragments.
//!
//! Entity fragments under `entities/` are loaded, their relative `$ref`s are
//! rewritten to `#/components/schemas/<name>` pointers, and the results are
//! merged into one schema namespace. Path fragments under `paths/` are merged
//! on top to produce the full document.

pub mod assembler;
pub mod composer;
pub mod deref;
pub mod emit;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod naming;
pub mod reference;
pub mod refs;

pub use assembler::{assemble, SchemaEntry, SchemaSet};
pub use composer::{compose, security_schemes};
pub use deref::dereference_file;
pub use emit::{to_json, to_yaml, write_output};
pub use error::{CompileError, DirectoryKind};
pub use loader::Fragment;
pub use manifest::{OutputConfig, ProjectLayout, ProjectManifest, ServerConfig, MANIFEST_FILE};
pub use naming::{component_ref, schema_name, Category, COMPONENT_PREFIX, FRAGMENT_EXTENSION};
pub use reference::render_reference;
pub use refs::{rewrite_ref, rewrite_refs, RewriteError, RewriteMode};

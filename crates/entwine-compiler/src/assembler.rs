//! Schema assembly: folds every entity fragment into one component-schema
//! namespace.
//!
//! Three phases run in order, each reading its files concurrently:
//! common definitions, write fragments, then object fragments. Phase results
//! are merged into a [`SchemaSet`] only after the whole phase has settled.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use entwine_telemetry::events;

use crate::error::{CompileError, DirectoryKind};
use crate::loader::{list_dir, Fragment};
use crate::manifest::ProjectLayout;
use crate::naming::{schema_name, Category, FRAGMENT_EXTENSION};
use crate::refs::{
    normalize_common_refs, normalize_definition_refs, rewrite_refs, RewriteMode,
};

/// Marker identifying the shared definitions file (compared lowercase).
const COMMON_FILE: &str = "common.yml";

/// A named schema ready to be merged.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub name: String,
    pub category: Category,
    pub schema: Value,
}

/// Accumulated component schemas, with the category each one came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    schemas: Map<String, Value>,
    origins: BTreeMap<String, Category>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an entry. A colliding name is overwritten (last write wins) and
    /// reported; the previous schema is returned.
    pub fn insert(&mut self, entry: SchemaEntry) -> Option<Value> {
        let SchemaEntry {
            name,
            category,
            schema,
        } = entry;

        if let Some(previous) = self.origins.insert(name.clone(), category) {
            tracing::warn!(
                event = events::SCHEMA_COLLISION,
                schema = %name,
                previous = previous.as_str(),
                category = category.as_str(),
                "schema name defined more than once; keeping the last one"
            );
        }
        self.schemas.insert(name, schema)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Category the named schema was assembled from.
    pub fn category(&self, name: &str) -> Option<Category> {
        self.origins.get(name).copied()
    }

    /// Names assembled from `category`, sorted.
    pub fn names(&self, category: Category) -> Vec<&str> {
        self.origins
            .iter()
            .filter(|(_, origin)| **origin == category)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn schemas(&self) -> &Map<String, Value> {
        &self.schemas
    }

    pub fn into_schemas(self) -> Map<String, Value> {
        self.schemas
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = SchemaEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }
}

/// Assemble every entity fragment of a project into a [`SchemaSet`].
///
/// Any directory listing, read or parse failure aborts the assembly; no
/// partial result is returned.
pub async fn assemble(layout: &ProjectLayout) -> Result<SchemaSet, CompileError> {
    let mut set = SchemaSet::new();

    // Common definitions
    let entries = list_dir(&layout.entities, DirectoryKind::Entities).await?;
    let common = entries
        .iter()
        .find(|name| name.to_lowercase().contains(COMMON_FILE))
        .cloned();
    match &common {
        Some(name) => set.extend(load_common(layout.entities.join(name)).await?),
        None => tracing::debug!(dir = %layout.entities.display(), "no common definitions"),
    }

    // Write fragments
    let writes = list_dir(&layout.writes, DirectoryKind::Writes).await?;
    let loaded = try_join_all(
        writes
            .iter()
            .filter(|name| name.contains(FRAGMENT_EXTENSION))
            .map(|name| load_write(layout.writes.join(name))),
    )
    .await?;
    set.extend(loaded.into_iter().flatten());

    // Object fragments
    let entries = list_dir(&layout.entities, DirectoryKind::Entities).await?;
    let loaded = try_join_all(
        entries
            .iter()
            .filter(|name| name.contains(FRAGMENT_EXTENSION) && Some(*name) != common.as_ref())
            .map(|name| load_object(layout.entities.join(name))),
    )
    .await?;
    set.extend(loaded);

    tracing::info!(
        schemas = set.len(),
        root = %layout.root.display(),
        "schemas assembled"
    );
    Ok(set)
}

/// Load `common.yml` and return one entry per definition.
async fn load_common(path: PathBuf) -> Result<Vec<SchemaEntry>, CompileError> {
    let fragment = Fragment::load(path, Category::Common).await?;

    let definitions = match fragment.tree.get("definitions") {
        Some(Value::Object(definitions)) => definitions,
        Some(Value::Null) | None => {
            tracing::info!(path = %fragment.path.display(), "common fragment has no definitions");
            return Ok(Vec::new());
        }
        Some(_) => {
            return Err(CompileError::InvalidFragment {
                path: fragment.path.clone(),
                reason: "`definitions` must be a mapping".into(),
            })
        }
    };

    definitions
        .iter()
        .map(|(id, definition)| {
            let mut schema = definition.clone();
            normalize_common_refs(&mut schema);
            normalize_definition_refs(&mut schema);
            Ok(SchemaEntry {
                name: id.clone(),
                category: Category::Common,
                schema: rewrite(&schema, RewriteMode::Default, &fragment.path)?,
            })
        })
        .collect()
}

/// Load one write fragment. Empty fragments contribute nothing.
async fn load_write(path: PathBuf) -> Result<Option<SchemaEntry>, CompileError> {
    let mut fragment = Fragment::load(path, Category::Write).await?;
    if fragment.tree.is_null() {
        tracing::info!(event = events::NULL_FRAGMENT, path = %fragment.path.display(), "skipping empty write fragment");
        return Ok(None);
    }

    let name = fragment_name(&fragment)?;
    normalize_common_refs(&mut fragment.tree);
    let schema = rewrite(&fragment.tree, RewriteMode::WriteLocal, &fragment.path)?;
    Ok(Some(SchemaEntry {
        name,
        category: Category::Write,
        schema,
    }))
}

/// Load one object fragment. Empty fragments are kept as `null` schemas.
async fn load_object(path: PathBuf) -> Result<SchemaEntry, CompileError> {
    let mut fragment = Fragment::load(path, Category::Object).await?;
    let name = fragment_name(&fragment)?;
    if fragment.tree.is_null() {
        tracing::info!(event = events::NULL_FRAGMENT, path = %fragment.path.display(), schema = %name, "empty object fragment");
    }

    normalize_common_refs(&mut fragment.tree);
    let schema = rewrite(&fragment.tree, RewriteMode::Default, &fragment.path)?;
    Ok(SchemaEntry {
        name,
        category: Category::Object,
        schema,
    })
}

fn fragment_name(fragment: &Fragment) -> Result<String, CompileError> {
    schema_name(fragment.file_name(), fragment.category).ok_or_else(|| {
        CompileError::InvalidFragment {
            path: fragment.path.clone(),
            reason: "cannot derive a schema name from the file name".into(),
        }
    })
}

fn rewrite(tree: &Value, mode: RewriteMode, path: &Path) -> Result<Value, CompileError> {
    rewrite_refs(tree, mode).map_err(|source| CompileError::Rewrite {
        path: path.to_path_buf(),
        source,
    })
}

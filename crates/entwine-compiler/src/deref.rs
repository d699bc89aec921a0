//! Inline dereferencing of a single fragment for inspection.
//!
//! Follows every `$ref` (relative files, JSON pointers, or both) starting from
//! one fragment, then flattens `allOf` compositions so the result shows the
//! effective shape of the schema.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::loader::parse_fragment;
use crate::refs::REF_KEY;

/// Dereference a fragment file and merge its `allOf` compositions.
pub fn dereference_file(path: &Path) -> Result<Value, CompileError> {
    let mut resolver = Resolver::default();
    let root = std::fs::canonicalize(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = resolver.document(&root)?.clone();
    let resolved = resolver.resolve(&tree, &root)?;
    Ok(merge_all_of(resolved))
}

#[derive(Default)]
struct Resolver {
    documents: HashMap<PathBuf, Value>,
    /// `file#pointer` targets currently being expanded.
    stack: Vec<String>,
}

impl Resolver {
    fn document(&mut self, path: &Path) -> Result<&Value, CompileError> {
        if !self.documents.contains_key(path) {
            let content = std::fs::read_to_string(path).map_err(|source| CompileError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let tree = parse_fragment(&content, path)?;
            self.documents.insert(path.to_path_buf(), tree);
        }
        Ok(&self.documents[path])
    }

    fn resolve(&mut self, value: &Value, file: &Path) -> Result<Value, CompileError> {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get(REF_KEY) {
                    let mut target = self.follow(reference, file)?;
                    // Keys next to `$ref` extend the referenced schema.
                    if let Value::Object(extended) = &mut target {
                        for (key, sibling) in map.iter().filter(|(key, _)| key.as_str() != REF_KEY) {
                            let sibling = self.resolve(sibling, file)?;
                            extended.insert(key.clone(), sibling);
                        }
                    }
                    return Ok(target);
                }

                let mut resolved = Map::new();
                for (key, child) in map {
                    resolved.insert(key.clone(), self.resolve(child, file)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve(item, file))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            scalar => Ok(scalar.clone()),
        }
    }

    fn follow(&mut self, reference: &str, file: &Path) -> Result<Value, CompileError> {
        let unresolved = || CompileError::UnresolvedRef {
            reference: reference.to_string(),
            path: file.to_path_buf(),
        };

        let (target, pointer) = reference.split_once('#').unwrap_or((reference, ""));
        let target = if target.is_empty() {
            file.to_path_buf()
        } else {
            let base = file.parent().unwrap_or_else(|| Path::new("."));
            std::fs::canonicalize(base.join(target)).map_err(|_| unresolved())?
        };

        let key = format!("{}#{}", target.display(), pointer);
        if self.stack.contains(&key) {
            let mut chain = self.stack.clone();
            chain.push(key);
            return Err(CompileError::CircularRef(chain.join(" -> ")));
        }

        let node = self
            .document(&target)?
            .pointer(pointer)
            .cloned()
            .ok_or_else(unresolved)?;

        self.stack.push(key);
        let resolved = self.resolve(&node, &target);
        self.stack.pop();
        resolved
    }
}

/// Flatten `allOf` lists into their parent schema, innermost first.
///
/// Keys already present win over keys from the composed parts, except that
/// `properties` mappings are unioned and `required` lists are concatenated
/// without duplicates.
pub fn merge_all_of(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut map: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| (key, merge_all_of(child)))
                .collect();

            match map.shift_remove("allOf") {
                Some(Value::Array(parts)) => {
                    for part in parts {
                        match part {
                            Value::Object(part) => merge_schema(&mut map, part),
                            other => tracing::warn!(part = %other, "skipping non-schema allOf entry"),
                        }
                    }
                }
                Some(other) => {
                    map.insert("allOf".into(), other);
                }
                None => {}
            }
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(merge_all_of).collect()),
        scalar => scalar,
    }
}

fn merge_schema(target: &mut Map<String, Value>, part: Map<String, Value>) {
    for (key, value) in part {
        if !target.contains_key(&key) {
            target.insert(key, value);
            continue;
        }
        let Some(existing) = target.get_mut(&key) else {
            continue;
        };
        match (key.as_str(), existing, value) {
            ("properties", Value::Object(existing), Value::Object(incoming)) => {
                for (name, schema) in incoming {
                    existing.entry(name).or_insert(schema);
                }
            }
            ("required", Value::Array(existing), Value::Array(incoming)) => {
                for field in incoming {
                    if !existing.contains(&field) {
                        existing.push(field);
                    }
                }
            }
            _ => {}
        }
    }
}

//! `$ref` normalization.
//!
//! Fragments link to each other with file-relative references
//! (`user.yml`, `writes/user.yml`, `../common.yml#/definitions/address`).
//! Once merged into one document every such reference must point into
//! `#/components/schemas`.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::naming::{component_ref, schema_name, Category, FRAGMENT_EXTENSION};

/// Key holding a reference pointer.
pub const REF_KEY: &str = "$ref";

/// Directory segment marking a reference into the write fragments.
const WRITES_SEGMENT: &str = "writes";

/// JSON-pointer prefix used inside `common.yml` for its own definitions.
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// How bare same-directory references (`foo.yml`) are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RewriteMode {
    /// Bare references name object schemas (`fooObject`).
    #[default]
    Default,
    /// Bare references name sibling write schemas (`writeFoo`).
    WriteLocal,
}

/// A reference that cannot be turned into a canonical pointer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("cannot derive a schema name from $ref '{0}'")]
    Unnamed(String),
}

/// Rewrite a single reference string.
///
/// Returns `Ok(None)` when the reference is left as it is (JSON pointers,
/// already canonical references).
pub fn rewrite_ref(reference: &str, mode: RewriteMode) -> Result<Option<String>, RewriteError> {
    let file = reference.split('#').next().unwrap_or(reference);

    let category = if targets_writes(file) {
        Category::Write
    } else if !reference.contains('/') && reference.contains(FRAGMENT_EXTENSION) {
        match mode {
            RewriteMode::WriteLocal => Category::Write,
            RewriteMode::Default => Category::Object,
        }
    } else {
        return Ok(None);
    };

    schema_name(file, category)
        .map(|name| Some(component_ref(&name)))
        .ok_or_else(|| RewriteError::Unnamed(reference.to_string()))
}

/// Return a copy of `tree` with every `$ref` string rewritten.
///
/// Mappings are descended fail-fast, sequences collect-all: a failing
/// element of a sequence keeps its original value while its siblings are
/// still rewritten, whereas a failing mapping value fails the whole mapping.
pub fn rewrite_refs(tree: &Value, mode: RewriteMode) -> Result<Value, RewriteError> {
    match tree {
        Value::Object(map) => fail_fast(map, mode).map(Value::Object),
        Value::Array(items) => Ok(Value::Array(collect_all(items, mode))),
        scalar => Ok(scalar.clone()),
    }
}

fn fail_fast(map: &Map<String, Value>, mode: RewriteMode) -> Result<Map<String, Value>, RewriteError> {
    map.iter()
        .map(|(key, value)| {
            let rewritten = match (key.as_str(), value) {
                (REF_KEY, Value::String(reference)) => match rewrite_ref(reference, mode)? {
                    Some(canonical) => Value::String(canonical),
                    None => value.clone(),
                },
                _ => rewrite_refs(value, mode)?,
            };
            Ok((key.clone(), rewritten))
        })
        .collect()
}

fn collect_all(items: &[Value], mode: RewriteMode) -> Vec<Value> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            rewrite_refs(item, mode).unwrap_or_else(|err| {
                tracing::warn!(index, error = %err, "array element left unrewritten");
                item.clone()
            })
        })
        .collect()
}

/// Replace every `[../][prefix]common.yml#/definitions` spelling (any case)
/// found in a string value with `#/components/schemas`.
pub fn normalize_common_refs(tree: &mut Value) {
    let pattern = common_pattern();
    for_each_string(tree, &mut |text| {
        if pattern.is_match(text) {
            *text = pattern
                .replace_all(text, "#/components/schemas")
                .into_owned();
        }
    });
}

/// Rewrite `#/definitions/<id>` self-references used inside `common.yml`.
pub fn normalize_definition_refs(tree: &mut Value) {
    match tree {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                match value {
                    Value::String(reference) if key == REF_KEY => {
                        if let Some(id) = reference.strip_prefix(DEFINITIONS_PREFIX) {
                            *reference = component_ref(id);
                        }
                    }
                    other => normalize_definition_refs(other),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_definition_refs),
        _ => {}
    }
}

/// Whether the file part of a reference has a `writes/` directory segment.
fn targets_writes(file: &str) -> bool {
    file.split('/').rev().skip(1).any(|segment| segment == WRITES_SEGMENT)
}

fn common_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)[^\s"'#]*common\.yml#/definitions"#).expect("valid common ref pattern")
    })
}

fn for_each_string(value: &mut Value, f: &mut impl FnMut(&mut String)) {
    match value {
        Value::String(text) => f(text),
        Value::Array(items) => items.iter_mut().for_each(|item| for_each_string(item, f)),
        Value::Object(map) => map.values_mut().for_each(|item| for_each_string(item, f)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_reference_follows_mode() {
        assert_eq!(
            rewrite_ref("foo.yml", RewriteMode::Default).unwrap().as_deref(),
            Some("#/components/schemas/fooObject")
        );
        assert_eq!(
            rewrite_ref("foo.yml", RewriteMode::WriteLocal).unwrap().as_deref(),
            Some("#/components/schemas/writeFoo")
        );
    }

    #[test]
    fn writes_reference_ignores_mode() {
        for mode in [RewriteMode::Default, RewriteMode::WriteLocal] {
            assert_eq!(
                rewrite_ref("writes/bar.yml", mode).unwrap().as_deref(),
                Some("#/components/schemas/writeBar")
            );
            assert_eq!(
                rewrite_ref("../writes/bar.yml", mode).unwrap().as_deref(),
                Some("#/components/schemas/writeBar")
            );
        }
    }

    #[test]
    fn pointers_are_left_alone() {
        for reference in [
            "#/components/schemas/userObject",
            "#/definitions/address",
            "other/user.yml",
            "https://example.com/schema.json",
        ] {
            assert_eq!(rewrite_ref(reference, RewriteMode::Default).unwrap(), None);
        }
    }

    #[test]
    fn unnamed_reference_is_an_error() {
        assert_eq!(
            rewrite_ref(".yml", RewriteMode::Default),
            Err(RewriteError::Unnamed(".yml".into()))
        );
        assert_eq!(
            rewrite_ref("writes/.yml", RewriteMode::Default),
            Err(RewriteError::Unnamed("writes/.yml".into()))
        );
    }

    #[test]
    fn rewrites_nested_trees() {
        let tree = json!({
            "type": "object",
            "properties": {
                "owner": { "$ref": "user.yml" },
                "draft": { "$ref": "writes/post.yml" },
                "tags": {
                    "type": "array",
                    "items": { "$ref": "tag.yml" }
                },
                "choice": {
                    "oneOf": [
                        { "$ref": "cat.yml" },
                        { "$ref": "#/components/schemas/dog" }
                    ]
                }
            }
        });

        let out = rewrite_refs(&tree, RewriteMode::Default).unwrap();

        assert_eq!(out["properties"]["owner"]["$ref"], "#/components/schemas/userObject");
        assert_eq!(out["properties"]["draft"]["$ref"], "#/components/schemas/writePost");
        assert_eq!(
            out["properties"]["tags"]["items"]["$ref"],
            "#/components/schemas/tagObject"
        );
        assert_eq!(
            out["properties"]["choice"]["oneOf"][0]["$ref"],
            "#/components/schemas/catObject"
        );
        assert_eq!(
            out["properties"]["choice"]["oneOf"][1]["$ref"],
            "#/components/schemas/dog"
        );
        assert_eq!(out["type"], "object");
    }

    #[test]
    fn write_local_mode_applies_at_every_depth() {
        let tree = json!({
            "allOf": [{ "$ref": "base.yml" }],
            "properties": { "child": { "items": { "$ref": "child.yml" } } }
        });

        let out = rewrite_refs(&tree, RewriteMode::WriteLocal).unwrap();

        assert_eq!(out["allOf"][0]["$ref"], "#/components/schemas/writeBase");
        assert_eq!(
            out["properties"]["child"]["items"]["$ref"],
            "#/components/schemas/writeChild"
        );
    }

    #[test]
    fn rewriting_is_idempotent() {
        let tree = json!({
            "properties": {
                "a": { "$ref": "a.yml" },
                "b": { "items": [{ "$ref": "writes/b.yml" }] }
            }
        });

        let once = rewrite_refs(&tree, RewriteMode::Default).unwrap();
        let twice = rewrite_refs(&once, RewriteMode::Default).unwrap();
        assert_eq!(once, twice);

        let twice_local = rewrite_refs(&once, RewriteMode::WriteLocal).unwrap();
        assert_eq!(once, twice_local);
    }

    #[test]
    fn non_string_refs_pass_through() {
        let tree = json!({
            "$ref": 42,
            "nested": { "$ref": { "$ref": "inner.yml" } },
            "flag": true,
            "none": null
        });

        let out = rewrite_refs(&tree, RewriteMode::Default).unwrap();

        assert_eq!(out["$ref"], 42);
        assert_eq!(out["nested"]["$ref"]["$ref"], "#/components/schemas/innerObject");
        assert_eq!(out["flag"], true);
        assert!(out["none"].is_null());
    }

    #[test]
    fn sequence_elements_fail_independently() {
        let tree = json!({
            "anyOf": [
                { "$ref": "good.yml" },
                { "$ref": ".yml", "properties": { "x": { "$ref": "x.yml" } } },
                { "$ref": "also.yml" }
            ]
        });

        let out = rewrite_refs(&tree, RewriteMode::Default).unwrap();

        assert_eq!(out["anyOf"][0]["$ref"], "#/components/schemas/goodObject");
        // The failed element is kept verbatim, including refs that would have rewritten.
        assert_eq!(out["anyOf"][1], tree["anyOf"][1]);
        assert_eq!(out["anyOf"][2]["$ref"], "#/components/schemas/alsoObject");
    }

    #[test]
    fn mapping_failures_propagate() {
        let tree = json!({
            "properties": {
                "fine": { "$ref": "fine.yml" },
                "broken": { "$ref": "writes/.yml" }
            }
        });

        assert_eq!(
            rewrite_refs(&tree, RewriteMode::Default),
            Err(RewriteError::Unnamed("writes/.yml".into()))
        );
    }

    #[test]
    fn scalars_are_returned_unchanged() {
        assert_eq!(rewrite_refs(&json!("user.yml"), RewriteMode::Default).unwrap(), json!("user.yml"));
        assert_eq!(rewrite_refs(&Value::Null, RewriteMode::Default).unwrap(), Value::Null);
    }

    #[test]
    fn common_prefixes_are_normalized() {
        let mut tree = json!({
            "properties": {
                "a": { "$ref": "../common.yml#/definitions/address" },
                "b": { "$ref": "common.yml#/definitions/money" },
                "c": { "$ref": "../Common.YML#/definitions/phone" },
                "d": { "$ref": "../shared/api-common.yml#/definitions/email" },
                "e": { "items": [{ "$ref": "./common.yml#/definitions/tag" }] },
                "f": { "$ref": "writes/user.yml" }
            }
        });

        normalize_common_refs(&mut tree);

        let props = &tree["properties"];
        assert_eq!(props["a"]["$ref"], "#/components/schemas/address");
        assert_eq!(props["b"]["$ref"], "#/components/schemas/money");
        assert_eq!(props["c"]["$ref"], "#/components/schemas/phone");
        assert_eq!(props["d"]["$ref"], "#/components/schemas/email");
        assert_eq!(props["e"]["items"][0]["$ref"], "#/components/schemas/tag");
        assert_eq!(props["f"]["$ref"], "writes/user.yml");
    }

    #[test]
    fn normalized_common_refs_survive_rewriting() {
        let mut tree = json!({ "$ref": "../common.yml#/definitions/address" });
        normalize_common_refs(&mut tree);
        let out = rewrite_refs(&tree, RewriteMode::WriteLocal).unwrap();
        assert_eq!(out["$ref"], "#/components/schemas/address");
    }

    #[test]
    fn definition_self_refs_are_normalized() {
        let mut tree = json!({
            "properties": {
                "street": { "type": "string" },
                "geo": { "$ref": "#/definitions/coordinates" },
                "history": { "items": [{ "$ref": "#/definitions/address" }] }
            },
            "description": "#/definitions/untouched"
        });

        normalize_definition_refs(&mut tree);

        assert_eq!(tree["properties"]["geo"]["$ref"], "#/components/schemas/coordinates");
        assert_eq!(
            tree["properties"]["history"]["items"][0]["$ref"],
            "#/components/schemas/address"
        );
        assert_eq!(tree["description"], "#/definitions/untouched");
    }
}

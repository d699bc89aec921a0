//! Full document composition: path fragments, metadata, security schemes and
//! the assembled component schemas.

use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;
use serde_json::{json, Map, Value};
use entwine_telemetry::events;

use crate::assembler::assemble;
use crate::error::{CompileError, DirectoryKind};
use crate::loader::{list_dir, read_tree};
use crate::manifest::ProjectLayout;

/// File-name suffix of path fragments (`usersPaths.yml`).
const PATHS_SUFFIX: &str = "Paths.yml";

/// Compose the full OpenAPI document for a project.
///
/// Keys keep their authored order: `openapi` (when the metadata does not set
/// it), the metadata keys, then `paths` and `components`. Path fragments are
/// merged in file-name order (later keys win), the default security schemes
/// are injected when no `components` exist, and the assembled schemas always
/// replace `components.schemas`.
pub async fn compose(layout: &ProjectLayout) -> Result<Value, CompileError> {
    let paths = load_paths(layout).await?;
    let metadata = load_metadata(&layout.metadata).await?.unwrap_or_default();

    let mut document = Map::new();
    if !metadata.contains_key("openapi") {
        document.insert(
            "openapi".into(),
            Value::String(layout.openapi_version.clone()),
        );
    }
    merge_metadata(&mut document, metadata, &layout.metadata);
    document.insert("paths".into(), Value::Object(paths));

    let components = document
        .entry("components")
        .or_insert(Value::Null);
    if components.is_null() {
        *components = json!({ "securitySchemes": security_schemes() });
    }
    let components = components
        .as_object_mut()
        .ok_or_else(|| CompileError::InvalidFragment {
            path: layout.metadata.clone(),
            reason: "`components` must be a mapping".into(),
        })?;

    let schemas = assemble(layout).await?;
    components.insert("schemas".into(), Value::Object(schemas.into_schemas()));

    Ok(Value::Object(document))
}

/// Security schemes injected into documents that declare no `components`.
pub fn security_schemes() -> Value {
    json!({
        "bearer": {
            "type": "http",
            "scheme": "bearer",
            "description": "Bearer based tokens, simply enter the token (prefixing with \"bearer\" is not required)."
        },
        "basicAuth": {
            "type": "http",
            "scheme": "basic"
        },
        "openId": {
            "type": "openIdConnect",
            "openIdConnectUrl": "https://example.com/.well-known/openid-configuration"
        },
        "OAuth2": {
            "type": "oauth2",
            "flows": {
                "authorizationCode": {
                    "authorizationUrl": "https://example.com/oauth/authorize",
                    "tokenUrl": "https://example.com/oauth/token",
                    "scopes": {
                        "read": "Grants read access",
                        "write": "Grants write access",
                        "admin": "Grants access to admin operations"
                    }
                }
            }
        }
    })
}

async fn load_paths(layout: &ProjectLayout) -> Result<Map<String, Value>, CompileError> {
    let files: Vec<PathBuf> = list_dir(&layout.paths, DirectoryKind::Paths)
        .await?
        .into_iter()
        .filter(|name| name.ends_with(PATHS_SUFFIX))
        .map(|name| layout.paths.join(name))
        .collect();

    let trees = try_join_all(files.iter().map(|path| read_tree(path))).await?;

    let mut paths = Map::new();
    for (file, tree) in files.iter().zip(trees) {
        match tree {
            Value::Object(items) => {
                for (route, item) in items {
                    if paths.insert(route.clone(), item).is_some() {
                        tracing::warn!(
                            path = %file.display(),
                            route = %route,
                            "path defined more than once; keeping the last one"
                        );
                    }
                }
            }
            Value::Null => {
                tracing::info!(event = events::NULL_FRAGMENT, path = %file.display(), "empty paths fragment")
            }
            _ => {
                return Err(CompileError::InvalidFragment {
                    path: file.clone(),
                    reason: "paths fragment must be a mapping".into(),
                })
            }
        }
    }
    Ok(paths)
}

async fn load_metadata(path: &Path) -> Result<Option<Map<String, Value>>, CompileError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|source| CompileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if !exists {
        return Ok(None);
    }

    match read_tree(path).await? {
        Value::Object(metadata) => Ok(Some(metadata)),
        Value::Null => Ok(None),
        _ => Err(CompileError::InvalidFragment {
            path: path.to_path_buf(),
            reason: "metadata fragment must be a mapping".into(),
        }),
    }
}

fn merge_metadata(document: &mut Map<String, Value>, metadata: Map<String, Value>, path: &Path) {
    for (key, value) in metadata {
        if key == "paths" {
            tracing::warn!(path = %path.display(), "ignoring `paths` in metadata; define paths in *Paths.yml fragments");
            continue;
        }
        document.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("entities/writes")).unwrap();
        fs::create_dir_all(temp.path().join("paths")).unwrap();
        fs::write(
            temp.path().join("entities/common.yml"),
            "definitions:\n  id:\n    type: integer\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("entities/user.yml"),
            "properties:\n  id:\n    $ref: common.yml#/definitions/id\n",
        )
        .unwrap();
        temp
    }

    fn write(root: &Path, relative: &str, content: &str) {
        fs::write(root.join(relative), content).unwrap();
    }

    #[tokio::test]
    async fn compose_full_document() {
        let temp = project();
        write(
            temp.path(),
            "paths/usersPaths.yml",
            r#"
/users:
  get:
    responses:
      '200':
        description: ok
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/userObject'
"#,
        );
        write(
            temp.path(),
            "paths/_metadata.yml",
            "info:\n  title: Users API\n  version: 1.0.0\ntags:\n  - name: users\n",
        );

        let doc = compose(&ProjectLayout::new(temp.path())).await.unwrap();

        assert_eq!(doc["openapi"], "3.0.3");
        assert_eq!(doc["info"]["title"], "Users API");
        assert_eq!(doc["tags"][0]["name"], "users");
        assert_eq!(
            doc["paths"]["/users"]["get"]["responses"]["200"]["description"],
            "ok"
        );
        assert_eq!(doc["components"]["securitySchemes"], security_schemes());
        assert_eq!(
            doc["components"]["schemas"]["userObject"]["properties"]["id"]["$ref"],
            "#/components/schemas/id"
        );
        assert_eq!(doc["components"]["schemas"]["id"]["type"], "integer");
    }

    #[tokio::test]
    async fn authored_key_order_is_kept() {
        let temp = project();
        write(
            temp.path(),
            "paths/zPaths.yml",
            "/zoo:\n  summary: zoo\n/apple:\n  summary: apple\n/mango:\n  summary: mango\n",
        );
        write(
            temp.path(),
            "paths/_metadata.yml",
            "info:\n  title: Ordered\n  version: 1.0.0\nservers:\n  - url: https://api.example.com\n",
        );
        write(
            temp.path(),
            "entities/user.yml",
            "type: object\nproperties:\n  zip:\n    type: string\n  name:\n    type: string\n  id:\n    type: integer\n",
        );

        let doc = compose(&ProjectLayout::new(temp.path())).await.unwrap();

        let top: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(top, vec!["openapi", "info", "servers", "paths", "components"]);

        let paths: Vec<&str> = doc["paths"].as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["/zoo", "/apple", "/mango"]);

        let properties: Vec<&str> = doc["components"]["schemas"]["userObject"]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(properties, vec!["zip", "name", "id"]);

        let yaml = crate::emit::to_yaml(&doc).unwrap();
        assert!(yaml.starts_with("openapi: "));
        assert!(yaml.find("info:").unwrap() < yaml.find("paths:").unwrap());
    }

    #[tokio::test]
    async fn later_paths_fragments_win() {
        let temp = project();
        write(
            temp.path(),
            "paths/aPaths.yml",
            "/users:\n  summary: from a\n/health:\n  summary: health\n",
        );
        write(temp.path(), "paths/bPaths.yml", "/users:\n  summary: from b\n");
        write(temp.path(), "paths/notes.yml", "/ignored:\n  summary: not a paths file\n");

        let doc = compose(&ProjectLayout::new(temp.path())).await.unwrap();

        let paths = doc["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths["/users"]["summary"], "from b");
        assert_eq!(paths["/health"]["summary"], "health");
    }

    #[tokio::test]
    async fn existing_components_are_kept() {
        let temp = project();
        write(
            temp.path(),
            "paths/_metadata.yml",
            r#"
openapi: 3.1.0
paths:
  /ignored: {}
components:
  securitySchemes:
    apiKey:
      type: apiKey
      in: header
      name: X-API-Key
  schemas:
    stale:
      type: string
"#,
        );

        let doc = compose(&ProjectLayout::new(temp.path())).await.unwrap();

        assert_eq!(doc["openapi"], "3.1.0");
        assert!(doc["paths"].as_object().unwrap().is_empty());
        let components = &doc["components"];
        assert_eq!(components["securitySchemes"]["apiKey"]["type"], "apiKey");
        assert!(components["securitySchemes"].get("bearer").is_none());
        assert!(components["schemas"].get("stale").is_none());
        assert!(components["schemas"].get("userObject").is_some());
    }

    #[tokio::test]
    async fn missing_paths_directory_is_distinguished() {
        let temp = project();
        fs::remove_dir(temp.path().join("paths")).unwrap();

        let err = compose(&ProjectLayout::new(temp.path())).await.unwrap_err();

        assert!(matches!(
            err,
            CompileError::MissingDirectory {
                kind: DirectoryKind::Paths,
                ..
            }
        ));
        assert!(err.to_string().starts_with("paths directory not found"));
    }

    #[tokio::test]
    async fn non_mapping_paths_fragment_is_rejected() {
        let temp = project();
        write(temp.path(), "paths/badPaths.yml", "- /users\n");

        let err = compose(&ProjectLayout::new(temp.path())).await.unwrap_err();

        match err {
            CompileError::InvalidFragment { path, .. } => assert!(path.ends_with("badPaths.yml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn assembly_failures_propagate() {
        let temp = project();
        fs::remove_dir(temp.path().join("entities/writes")).unwrap();

        let err = compose(&ProjectLayout::new(temp.path())).await.unwrap_err();

        assert!(matches!(
            err,
            CompileError::MissingDirectory {
                kind: DirectoryKind::Writes,
                ..
            }
        ));
    }

    #[test]
    fn default_security_schemes() {
        let schemes = security_schemes();
        assert_eq!(schemes["bearer"]["scheme"], "bearer");
        assert_eq!(schemes["basicAuth"]["scheme"], "basic");
        assert_eq!(schemes["openId"]["type"], "openIdConnect");
        assert_eq!(
            schemes["OAuth2"]["flows"]["authorizationCode"]["scopes"]
                .as_object()
                .unwrap()
                .len(),
            3
        );
    }
}

//! Canonical schema names derived from fragment file names.
//!
//! - common definitions keep their identifier (`address` -> `address`)
//! - write fragments: `user.yml` -> `writeUser`
//! - object fragments: `user.yml` -> `userObject`

use serde::Serialize;

/// Extension carried by every fragment file.
pub const FRAGMENT_EXTENSION: &str = ".yml";

/// Prefix of every canonical component-schema reference.
pub const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// Category a fragment belongs to, decided by where it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Entry of the shared `definitions` mapping in `common.yml`.
    Common,
    /// Input shape for creating or updating a resource (`entities/writes/`).
    Write,
    /// Complete resource representation (`entities/`).
    Object,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Common => "common",
            Category::Write => "write",
            Category::Object => "object",
        }
    }
}

/// Derive the canonical schema name for a file (or identifier) in `category`.
///
/// Only the last `/`-separated segment of `file` is considered. Returns `None`
/// when nothing is left once the extension is removed.
pub fn schema_name(file: &str, category: Category) -> Option<String> {
    match category {
        Category::Common => (!file.is_empty()).then(|| file.to_string()),
        Category::Write => {
            let stem = stem(file)?;
            let mut chars = stem.chars();
            let first = chars.next()?;
            Some(format!(
                "write{}{}",
                first.to_uppercase(),
                chars.as_str()
            ))
        }
        Category::Object => stem(file).map(|stem| format!("{stem}Object")),
    }
}

/// Build the canonical `$ref` pointer for a schema name.
pub fn component_ref(name: &str) -> String {
    format!("{COMPONENT_PREFIX}{name}")
}

/// Last path segment with the first occurrence of the extension removed.
fn stem(file: &str) -> Option<String> {
    let segment = file.rsplit('/').next().unwrap_or(file);
    let stem = segment.replacen(FRAGMENT_EXTENSION, "", 1);
    (!stem.is_empty()).then_some(stem)
}

//! Markdown API reference listing every assembled schema by category.

use std::fmt::Write;

use crate::assembler::SchemaSet;
use crate::naming::{component_ref, Category};

struct Section {
    category: Category,
    title: &'static str,
    blurb: &'static str,
}

const SECTIONS: [Section; 3] = [
    Section {
        category: Category::Write,
        title: "Write Schemas (Input Objects)",
        blurb: "These schemas define the input structure for creating/updating resources.",
    },
    Section {
        category: Category::Object,
        title: "Full Object Schemas",
        blurb: "These schemas define complete resource objects including system-generated properties.",
    },
    Section {
        category: Category::Common,
        title: "Common Schemas",
        blurb: "These are reusable schema components defined in common.yml files.",
    },
];

const QUICK_REFERENCE: &str = r#"## Quick Reference Rules

### File to Schema Name Transformations

**Write Entities:**
- File: `entities/writes/[name].yml`
- Schema: `write[Name]` (capitalized)
- Example: `entities/writes/user.yml` → `writeUser`

**Full Entities:**
- File: `entities/[name].yml`
- Schema: `[name]Object`
- Example: `entities/user.yml` → `userObject`

**Common Definitions:**
- File: `entities/common.yml#/definitions/[name]`
- Schema: `[name]`
- Example: `common.yml#/definitions/address` → `address`

### Using in Path Definitions

In your `paths/*Paths.yml` files, always reference schemas with:
```yaml
$ref: '#/components/schemas/[schemaName]'
```

Example:
```yaml
responses:
  '200':
    description: successful operation
    content:
      application/json:
        schema:
          $ref: '#/components/schemas/userObject'
```
"#;

/// Render the API reference for an assembled schema set.
pub fn render_reference(set: &SchemaSet) -> String {
    let mut out = String::from("# API Reference\n\n");
    out.push_str(
        "This reference shows all available schemas and their component names for use in path definitions.\n\n",
    );

    for section in &SECTIONS {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "## {}\n\n{}\n", section.title, section.blurb);
        out.push_str("| Schema Name | Referenced As |\n");
        out.push_str("|-------------|---------------|\n");
        for name in set.names(section.category) {
            let _ = writeln!(out, "| {} | {} |", name, component_ref(name));
        }
        out.push('\n');
    }

    out.push_str(QUICK_REFERENCE);
    out
}

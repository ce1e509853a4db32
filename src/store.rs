//! Schema namespace store.
//!
//! Flattens one or more top-level schema documents into a single mapping of
//! full type name → schema node. Construction recursively discovers every
//! named sub-definition (record fields, union members, array items, map
//! values), so deeply buried named types are addressable no matter how deep
//! they sit. Lookup supports context-local shadowing: a name redefined
//! inside the currently-compiling schema wins over the global entry, without
//! mutating the global database.

use indexmap::IndexMap;

use crate::error::CompileError;
use crate::schema::SchemaNode;

/// Read-only after construction; safe to share across concurrent compile
/// sessions as an immutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    global: IndexMap<String, SchemaNode>,
}

impl SchemaStore {
    /// Build the global database from `(name, schema)` pairs. Later
    /// documents win on a name collision, matching source-order updates.
    pub fn build<I>(docs: I) -> SchemaStore
    where
        I: IntoIterator<Item = (String, SchemaNode)>,
    {
        let mut global = IndexMap::new();
        for (name, schema) in docs {
            flatten(&schema, &mut global);
            global.insert(name, schema);
        }
        SchemaStore { global }
    }

    /// Look up `name`, preferring the namespace local to `context` (itself a
    /// full name in the global database) before falling back to the global
    /// database.
    pub fn load(&self, name: &str, context: Option<&str>) -> Result<SchemaNode, CompileError> {
        if let Some(context) = context
            && let Some(context_schema) = self.global.get(context)
        {
            // Re-derive the context-local namespace with the same
            // flattening walk used at construction time.
            let mut local = IndexMap::new();
            flatten(context_schema, &mut local);
            if let Some(node) = local.get(name) {
                return Ok(node.clone());
            }
        }
        self.global
            .get(name)
            .cloned()
            .ok_or_else(|| CompileError::SchemaNotFound(name.to_string()))
    }

    /// All names in the global database, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.global.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.global.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Insert every named definition reachable from `node`.
fn flatten(node: &SchemaNode, out: &mut IndexMap<String, SchemaNode>) {
    match node {
        SchemaNode::Name(_) => {}
        SchemaNode::Union(branches) => {
            for branch in branches {
                flatten(branch, out);
            }
        }
        SchemaNode::Definition(def) => {
            if let Some(name) = &def.name {
                out.insert(name.clone(), node.clone());
            }
            for field in &def.fields {
                flatten(&field.schema, out);
            }
            if let Some(items) = &def.items {
                flatten(items, out);
            }
            if let Some(values) = &def.values {
                flatten(values, out);
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store_of(docs: &[serde_json::Value]) -> SchemaStore {
        SchemaStore::build(docs.iter().map(|doc| {
            let schema = SchemaNode::parse(doc).unwrap();
            let name = schema.name().expect("top-level schema must be named").to_string();
            (name, schema)
        }))
    }

    #[test]
    fn deeply_nested_named_types_are_discoverable() {
        let store = store_of(&[json!({
            "type": "record",
            "name": "Outer",
            "fields": [
                {"name": "xs", "type": {"type": "array", "items": {
                    "type": "record",
                    "name": "Item",
                    "fields": [
                        {"name": "tag", "type": {"type": "enum", "name": "Tag", "symbols": ["A"]}}
                    ]
                }}}
            ]
        })]);
        for name in ["Outer", "Item", "Tag"] {
            assert!(store.load(name, None).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn missing_name_fails() {
        let store = store_of(&[]);
        let err = store.load("Nope", None).unwrap_err();
        assert_eq!(err, CompileError::SchemaNotFound("Nope".into()));
    }

    #[test]
    fn context_local_definition_shadows_global() {
        // Two documents each define `Point`; looking it up under the second
        // document's context must return that document's version.
        let store = store_of(&[
            json!({
                "type": "record",
                "name": "A",
                "fields": [{"name": "p", "type": {
                    "type": "record", "name": "Point",
                    "fields": [{"name": "x", "type": "int"}]
                }}]
            }),
            json!({
                "type": "record",
                "name": "B",
                "fields": [{"name": "p", "type": {
                    "type": "record", "name": "Point",
                    "fields": [{"name": "x", "type": "double"}]
                }}]
            }),
        ]);

        let from_b = store.load("Point", Some("B")).unwrap();
        let SchemaNode::Definition(def) = &from_b else { panic!() };
        assert_eq!(def.fields[0].schema, SchemaNode::Name("double".into()));

        let from_a = store.load("Point", Some("A")).unwrap();
        let SchemaNode::Definition(def) = &from_a else { panic!() };
        assert_eq!(def.fields[0].schema, SchemaNode::Name("int".into()));
    }

    #[test]
    fn lookup_falls_back_to_global_when_context_lacks_the_name() {
        let store = store_of(&[
            json!({"type": "record", "name": "Lone", "fields": [{"name": "x", "type": "int"}]}),
            json!({"type": "record", "name": "Other", "fields": [{"name": "y", "type": "long"}]}),
        ]);
        assert!(store.load("Lone", Some("Other")).is_ok());
    }
}

//! Codec synthesis.
//!
//! The recursive-descent engine: given a schema node and the location of its
//! data within the in-memory value, emit serialization and deserialization
//! code. Named references are resolved through the store under the current
//! context (passed explicitly down the recursion); cyclic names are never
//! inlined — the first encounter registers a named auxiliary function pair
//! and every encounter emits a call, so recursive schemas compile without
//! unbounded growth.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::cycles::{self, CycleSet};
use crate::error::CompileError;
use crate::location::Location;
use crate::names::{NameAllocator, TempKind};
use crate::schema::{Definition, Kind, SchemaNode, sanitize};
use crate::store::SchemaStore;
use crate::templates::{
    ARRAY_DE, ARRAY_SER, AUX_DESERIALIZE_FN, AUX_SERIALIZE_FN, MAP_DE, MAP_SER, indent, render,
};
use crate::union;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Logical-type support. When off, any known logical type in the schema
    /// aborts the compile with `UnsupportedLogicalType`.
    pub logical_types: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { logical_types: true }
    }
}

/// Output of one root-schema compile. Immutable; safe to cache keyed by the
/// root schema's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub serialize_body: String,
    pub deserialize_body: String,
    pub auxiliary: BTreeSet<String>,
}

/// Store + cycle set + options, computed once and shared read-only across
/// any number of compiles (including concurrent ones — each `compile` call
/// owns its own session).
#[derive(Debug, Clone)]
pub struct Compiler {
    store: SchemaStore,
    cycles: CycleSet,
    options: Options,
}

impl Compiler {
    pub fn new(store: SchemaStore, options: Options) -> Compiler {
        let cycles = cycles::analyze(&store);
        Compiler { store, cycles, options }
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    pub fn cycles(&self) -> &CycleSet {
        &self.cycles
    }

    /// Compile one root schema into its artifact: two entry-point bodies
    /// plus the auxiliary functions required to break cycles.
    pub fn compile(&self, root: &str) -> Result<GeneratedArtifact, CompileError> {
        let node = self.store.load(root, None)?;
        let mut session = Session {
            store: &self.store,
            cycles: &self.cycles,
            options: self.options,
            names: NameAllocator::new(),
            handled_cycles: BTreeSet::new(),
            auxiliary: BTreeSet::new(),
        };
        let serialize_body = session.serialize_code(&node, &Location::root("value"), root)?;
        let deserialize_body = session.deserialize_code(&node, &Location::root("value"), root)?;
        Ok(GeneratedArtifact {
            serialize_body,
            deserialize_body,
            auxiliary: session.auxiliary,
        })
    }
}

/// Mutable state for one top-level compile. Created per root, discarded
/// once the artifact is extracted; never shared across compiles.
pub(crate) struct Session<'a> {
    pub(crate) store: &'a SchemaStore,
    pub(crate) cycles: &'a CycleSet,
    pub(crate) options: Options,
    pub(crate) names: NameAllocator,
    handled_cycles: BTreeSet<String>,
    auxiliary: BTreeSet<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// SERIALIZE
// ————————————————————————————————————————————————————————————————————————————

impl Session<'_> {
    pub(crate) fn serialize_code(
        &mut self,
        node: &SchemaNode,
        loc: &Location,
        context: &str,
    ) -> Result<String, CompileError> {
        match node {
            SchemaNode::Name(name) => {
                if let Some(kind) = Kind::primitive_from_name(name) {
                    Ok(primitive_write(kind, loc, None))
                } else {
                    self.named_serialize(name, loc, context)
                }
            }
            SchemaNode::Union(branches) => union::serialize_union(self, branches, loc, context),
            SchemaNode::Definition(def) => {
                if let Some(code) = self.logical_serialize(def, loc)? {
                    return Ok(code);
                }
                match def.kind {
                    Kind::Record => {
                        let mut out = String::new();
                        for field in &def.fields {
                            let code =
                                self.serialize_code(&field.schema, &loc.field(&field.name), context)?;
                            if !out.is_empty() {
                                out.push('\n');
                            }
                            out.push_str(&code);
                        }
                        Ok(out)
                    }
                    Kind::Array => {
                        let items = self.names.next(TempKind::Dict);
                        let item = self.names.next(TempKind::Value);
                        let item_schema = def.items.as_deref().ok_or_else(|| {
                            CompileError::UnsupportedSchemaShape("array without items".into())
                        })?;
                        let item_code =
                            self.serialize_code(item_schema, &Location::root(&item), context)?;
                        Ok(render(
                            ARRAY_SER,
                            &[
                                ("items", items.as_str()),
                                ("item", item.as_str()),
                                ("loc", &loc.render_ref()),
                                ("item_code", &indent(&item_code, 8)),
                            ],
                        ))
                    }
                    Kind::Map => {
                        let dict = self.names.next(TempKind::Dict);
                        let key = self.names.next(TempKind::Key);
                        let val = self.names.next(TempKind::Value);
                        let value_schema = def.values.as_deref().ok_or_else(|| {
                            CompileError::UnsupportedSchemaShape("map without values".into())
                        })?;
                        let value_code =
                            self.serialize_code(value_schema, &Location::root(&val), context)?;
                        Ok(render(
                            MAP_SER,
                            &[
                                ("dict", dict.as_str()),
                                ("key", key.as_str()),
                                ("val", val.as_str()),
                                ("loc", &loc.render_ref()),
                                ("value_code", &indent(&value_code, 8)),
                            ],
                        ))
                    }
                    Kind::Enum => {
                        let tag = self.names.next(TempKind::TypeTag);
                        Ok(format!(
                            "let {tag} = enum_index({}, {})?;\nwrite_raw_long(buffer, {tag});",
                            loc.render_ref(),
                            symbols_literal(&def.symbols),
                        ))
                    }
                    Kind::Fixed => {
                        let size = fixed_size(def)?;
                        Ok(primitive_write(Kind::Fixed, loc, Some(size)))
                    }
                    kind => Ok(primitive_write(kind, loc, None)),
                }
            }
        }
    }

    fn named_serialize(
        &mut self,
        name: &str,
        loc: &Location,
        context: &str,
    ) -> Result<String, CompileError> {
        let resolved = self.store.load(name, Some(context))?;
        let full = resolved.name().unwrap_or(name).to_string();
        if self.cycles.contains(&full) {
            self.ensure_cycle_fns(&full, context)?;
            Ok(format!("serialize_{}({}, buffer)?;", sanitize(&full), loc.render_ref()))
        } else {
            self.serialize_code(&resolved, loc, &full)
        }
    }

    // ————————————————————————————————————————————————————————————————————————
    // DESERIALIZE
    // ————————————————————————————————————————————————————————————————————————

    pub(crate) fn deserialize_code(
        &mut self,
        node: &SchemaNode,
        loc: &Location,
        context: &str,
    ) -> Result<String, CompileError> {
        match node {
            SchemaNode::Name(name) => {
                if let Some(kind) = Kind::primitive_from_name(name) {
                    Ok(primitive_read(kind, loc, None))
                } else {
                    self.named_deserialize(name, loc, context)
                }
            }
            SchemaNode::Union(branches) => union::deserialize_union(self, branches, loc, context),
            SchemaNode::Definition(def) => {
                if let Some(code) = self.logical_deserialize(def, loc)? {
                    return Ok(code);
                }
                match def.kind {
                    Kind::Record => {
                        let mut out = format!("{} = Value::Object(Map::new());", loc.render_place());
                        for field in &def.fields {
                            let code = self
                                .deserialize_code(&field.schema, &loc.field(&field.name), context)?;
                            out.push('\n');
                            out.push_str(&code);
                        }
                        Ok(out)
                    }
                    Kind::Array => {
                        let items = self.names.next(TempKind::Dict);
                        let n = self.names.next(TempKind::Index);
                        let item = self.names.next(TempKind::Value);
                        let item_schema = def.items.as_deref().ok_or_else(|| {
                            CompileError::UnsupportedSchemaShape("array without items".into())
                        })?;
                        let item_code =
                            self.deserialize_code(item_schema, &Location::root(&item), context)?;
                        Ok(render(
                            ARRAY_DE,
                            &[
                                ("items", items.as_str()),
                                ("n", n.as_str()),
                                ("item", item.as_str()),
                                ("item_code", &indent(&item_code, 8)),
                                ("place", &loc.render_place()),
                            ],
                        ))
                    }
                    Kind::Map => {
                        let dict = self.names.next(TempKind::Dict);
                        let n = self.names.next(TempKind::Index);
                        let key = self.names.next(TempKind::Key);
                        let val = self.names.next(TempKind::Value);
                        let value_schema = def.values.as_deref().ok_or_else(|| {
                            CompileError::UnsupportedSchemaShape("map without values".into())
                        })?;
                        let value_code =
                            self.deserialize_code(value_schema, &Location::root(&val), context)?;
                        Ok(render(
                            MAP_DE,
                            &[
                                ("dict", dict.as_str()),
                                ("n", n.as_str()),
                                ("key", key.as_str()),
                                ("val", val.as_str()),
                                ("value_code", &indent(&value_code, 8)),
                                ("place", &loc.render_place()),
                            ],
                        ))
                    }
                    Kind::Enum => {
                        let tag = self.names.next(TempKind::TypeTag);
                        Ok(format!(
                            "let {tag} = read_raw_long(source)?;\n{} = enum_symbol({tag}, {})?;",
                            loc.render_place(),
                            symbols_literal(&def.symbols),
                        ))
                    }
                    Kind::Fixed => {
                        let size = fixed_size(def)?;
                        Ok(primitive_read(Kind::Fixed, loc, Some(size)))
                    }
                    kind => Ok(primitive_read(kind, loc, None)),
                }
            }
        }
    }

    fn named_deserialize(
        &mut self,
        name: &str,
        loc: &Location,
        context: &str,
    ) -> Result<String, CompileError> {
        let resolved = self.store.load(name, Some(context))?;
        let full = resolved.name().unwrap_or(name).to_string();
        if self.cycles.contains(&full) {
            self.ensure_cycle_fns(&full, context)?;
            Ok(format!(
                "{} = deserialize_{}(source)?;",
                loc.render_place(),
                sanitize(&full)
            ))
        } else {
            self.deserialize_code(&resolved, loc, &full)
        }
    }

    // ————————————————————————————————————————————————————————————————————————
    // CYCLE-BREAK AUXILIARIES
    // ————————————————————————————————————————————————————————————————————————

    /// Emit the auxiliary function pair for a cycle-starting name, once.
    /// The name is recorded *before* rendering, so the recursive render of
    /// its own body emits calls instead of recursing forever.
    fn ensure_cycle_fns(&mut self, full: &str, context: &str) -> Result<(), CompileError> {
        if !self.handled_cycles.insert(full.to_string()) {
            return Ok(());
        }
        let node = self.store.load(full, Some(context))?;
        let ser_body = self.serialize_code(&node, &Location::root("value"), full)?;
        let de_body = self.deserialize_code(&node, &Location::root("value"), full)?;
        let name = sanitize(full);
        self.auxiliary.insert(render(
            AUX_SERIALIZE_FN,
            &[("name", name.as_str()), ("body", &indent(&ser_body, 4))],
        ));
        self.auxiliary.insert(render(
            AUX_DESERIALIZE_FN,
            &[("name", name.as_str()), ("body", &indent(&de_body, 4))],
        ));
        Ok(())
    }

    // ————————————————————————————————————————————————————————————————————————
    // LOGICAL TYPES
    // ————————————————————————————————————————————————————————————————————————

    /// Two-step logical serialization: prepare into a primitive-ready value,
    /// then write with the underlying primitive writer. `Ok(None)` means no
    /// recognized logical refinement applies and the caller should fall back
    /// to the plain codec (unknown logical names keep Avro's ignore
    /// semantics).
    fn logical_serialize(
        &mut self,
        def: &Definition,
        loc: &Location,
    ) -> Result<Option<String>, CompileError> {
        let Some(plan) = self.logical_plan(def)? else {
            return Ok(None);
        };
        let v = self.names.next(TempKind::Value);
        let prepared = Location::root(format!("&{v}"));
        let write = primitive_write(def.kind, &prepared, def.size);
        Ok(Some(format!(
            "let {v} = prepare_{}({}{})?;\n{write}",
            plan.suffix,
            loc.render_ref(),
            plan.prepare_args,
        )))
    }

    fn logical_deserialize(
        &mut self,
        def: &Definition,
        loc: &Location,
    ) -> Result<Option<String>, CompileError> {
        let Some(plan) = self.logical_plan(def)? else {
            return Ok(None);
        };
        let v = self.names.next(TempKind::Value);
        let read = primitive_read(def.kind, &Location::root(&v), def.size);
        // primitive_read emits `v0 = ...;`, bind it instead
        let read = format!("let {read}");
        Ok(Some(format!(
            "{read}\n{} = read_{}(&{v}{})?;",
            loc.render_place(),
            plan.suffix,
            plan.read_args,
        )))
    }

    /// Decide whether a definition's `logicalType` is recognized on its
    /// underlying kind, and if so how to call the prepare/read transforms.
    fn logical_plan(&self, def: &Definition) -> Result<Option<LogicalPlan>, CompileError> {
        let Some(logical) = &def.logical else {
            return Ok(None);
        };
        let plan = match (logical.name.as_str(), def.kind) {
            ("decimal", Kind::Bytes | Kind::Fixed) => {
                let size = match def.size {
                    Some(n) => format!("Some({n})"),
                    None => "None".to_string(),
                };
                LogicalPlan {
                    suffix: "decimal".into(),
                    prepare_args: format!(", {}, {}, {size}", logical.scale, logical.precision),
                    read_args: format!(", {}, {}", logical.scale, logical.precision),
                }
            }
            ("uuid", Kind::String) => LogicalPlan::plain("uuid"),
            ("date", Kind::Int) => LogicalPlan::plain("date"),
            ("time-millis", Kind::Int) => LogicalPlan::plain("time_millis"),
            ("timestamp-millis", Kind::Long) => LogicalPlan::plain("timestamp_millis"),
            ("timestamp-micros", Kind::Long) => LogicalPlan::plain("timestamp_micros"),
            // Unknown logical names, or known names on a mismatched
            // underlying type, fall back to the plain primitive codec.
            _ => return Ok(None),
        };
        if !self.options.logical_types {
            return Err(CompileError::UnsupportedLogicalType(logical.name.clone()));
        }
        Ok(Some(plan))
    }
}

struct LogicalPlan {
    suffix: String,
    prepare_args: String,
    read_args: String,
}

impl LogicalPlan {
    fn plain(suffix: &str) -> LogicalPlan {
        LogicalPlan {
            suffix: suffix.into(),
            prepare_args: String::new(),
            read_args: String::new(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PRIMITIVE DISPATCH
// ————————————————————————————————————————————————————————————————————————————

fn fixed_size(def: &Definition) -> Result<usize, CompileError> {
    def.size
        .ok_or_else(|| CompileError::UnsupportedSchemaShape("fixed without size".into()))
}

fn primitive_write(kind: Kind, loc: &Location, size: Option<usize>) -> String {
    let target = loc.render_ref();
    match kind {
        Kind::Fixed => {
            let size = size.expect("fixed writer requires a size");
            format!("write_fixed(buffer, {target}, {size})?;")
        }
        kind => format!("write_{}(buffer, {target})?;", kind.as_str()),
    }
}

fn primitive_read(kind: Kind, loc: &Location, size: Option<usize>) -> String {
    let place = loc.render_place();
    match kind {
        Kind::Fixed => {
            let size = size.expect("fixed reader requires a size");
            format!("{place} = read_fixed(source, {size})?;")
        }
        kind => format!("{place} = read_{}(source)?;", kind.as_str()),
    }
}

pub(crate) fn symbols_literal(symbols: &[String]) -> String {
    let inner = symbols
        .iter()
        .map(|s| format!("{s:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("&[{inner}]")
}

pub(crate) fn is_null_branch(node: &SchemaNode) -> bool {
    match node {
        SchemaNode::Name(n) => n == "null",
        SchemaNode::Definition(def) => def.kind == Kind::Null && def.logical.is_none(),
        SchemaNode::Union(_) => false,
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

    fn compiler_of(docs: &[serde_json::Value]) -> Compiler {
        let store = SchemaStore::build(docs.iter().map(|doc| {
            let schema = SchemaNode::parse(doc).unwrap();
            (schema.name().unwrap().to_string(), schema)
        }));
        Compiler::new(store, Options::default())
    }

    #[test]
    fn simple_record_emits_field_codecs_in_order() {
        let compiler = compiler_of(&[json!({
            "type": "record",
            "name": "Simple",
            "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "string"}
            ]
        })]);
        let artifact = compiler.compile("Simple").unwrap();
        assert_eq!(
            artifact.serialize_body,
            "write_int(buffer, &value[\"a\"])?;\nwrite_string(buffer, &value[\"b\"])?;"
        );
        let de = &artifact.deserialize_body;
        assert!(de.starts_with("value = Value::Object(Map::new());"));
        let a = de.find("value[\"a\"] = read_int(source)?;").unwrap();
        let b = de.find("value[\"b\"] = read_string(source)?;").unwrap();
        assert!(a < b);
        assert!(artifact.auxiliary.is_empty());
    }

    #[test]
    fn recursive_schema_emits_exactly_one_auxiliary_pair() {
        let compiler = compiler_of(&[json!({
            "type": "record",
            "name": "TreeNode",
            "fields": [
                {"name": "value", "type": "int"},
                {"name": "children", "type": {"type": "array", "items": "TreeNode"}}
            ]
        })]);
        let artifact = compiler.compile("TreeNode").unwrap();
        assert_eq!(artifact.auxiliary.len(), 2);
        let all = artifact.auxiliary.iter().cloned().collect::<Vec<_>>().join("\n");
        assert_eq!(all.matches("fn serialize_TreeNode(").count(), 1);
        assert_eq!(all.matches("fn deserialize_TreeNode(").count(), 1);
        // entry body calls the auxiliary, it does not inline forever
        assert!(artifact.serialize_body.contains("serialize_TreeNode("));
        assert!(artifact.deserialize_body.contains("deserialize_TreeNode(source)?"));
    }

    #[test]
    fn repeated_references_to_a_cyclic_type_still_emit_one_pair() {
        let compiler = compiler_of(&[
            json!({
                "type": "record",
                "name": "TreeNode",
                "fields": [
                    {"name": "children", "type": {"type": "array", "items": "TreeNode"}}
                ]
            }),
            json!({
                "type": "record",
                "name": "Forest",
                "fields": [
                    {"name": "first", "type": "TreeNode"},
                    {"name": "second", "type": "TreeNode"},
                    {"name": "more", "type": {"type": "array", "items": "TreeNode"}}
                ]
            }),
        ]);
        let artifact = compiler.compile("Forest").unwrap();
        assert_eq!(artifact.auxiliary.len(), 2);
        assert_eq!(artifact.serialize_body.matches("serialize_TreeNode(").count(), 3);
    }

    #[test]
    fn namespaced_cyclic_names_are_sanitized() {
        let compiler = compiler_of(&[json!({
            "type": "record",
            "name": "Node",
            "namespace": "com.example",
            "fields": [
                {"name": "next", "type": ["null", "com.example.Node"]}
            ]
        })]);
        let artifact = compiler.compile("com.example.Node").unwrap();
        let all = artifact.auxiliary.iter().cloned().collect::<Vec<_>>().join("\n");
        assert!(all.contains("fn serialize_com_example_Node("));
        assert!(all.contains("fn deserialize_com_example_Node("));
    }

    #[test]
    fn enum_codec_uses_declared_symbol_order() {
        let compiler = compiler_of(&[json!({
            "type": "enum",
            "name": "Color",
            "symbols": ["A", "B", "C"]
        })]);
        let artifact = compiler.compile("Color").unwrap();
        assert_eq!(
            artifact.serialize_body,
            "let tag0 = enum_index(value, &[\"A\", \"B\", \"C\"])?;\nwrite_raw_long(buffer, tag0);"
        );
        assert_eq!(
            artifact.deserialize_body,
            "let tag1 = read_raw_long(source)?;\nvalue = enum_symbol(tag1, &[\"A\", \"B\", \"C\"])?;"
        );
    }

    #[test]
    fn map_codec_is_block_encoded() {
        let compiler = compiler_of(&[json!({
            "type": "record",
            "name": "Holder",
            "fields": [{"name": "m", "type": {"type": "map", "values": "int"}}]
        })]);
        let artifact = compiler.compile("Holder").unwrap();
        assert!(artifact.serialize_body.contains("as_object(&value[\"m\"])?"));
        assert!(artifact.serialize_body.contains("write_raw_string(buffer, k0);"));
        assert!(artifact.serialize_body.ends_with("write_raw_long(buffer, 0);"));
        assert!(artifact.deserialize_body.contains("let k1 = read_raw_string(source)?;"));
        assert!(artifact.deserialize_body.contains("value[\"m\"] = Value::Object("));
    }

    #[test]
    fn logical_decimal_on_fixed_is_two_step() {
        let compiler = compiler_of(&[json!({
            "type": "record",
            "name": "Money",
            "fields": [{"name": "amount", "type": {
                "type": "fixed", "name": "Dec8", "size": 8,
                "logicalType": "decimal", "precision": 10, "scale": 2
            }}]
        })]);
        let artifact = compiler.compile("Money").unwrap();
        assert_eq!(
            artifact.serialize_body,
            "let v0 = prepare_decimal(&value[\"amount\"], 2, 10, Some(8))?;\n\
             write_fixed(buffer, &v0, 8)?;"
        );
        assert_eq!(
            artifact.deserialize_body,
            "value = Value::Object(Map::new());\n\
             let v1 = read_fixed(source, 8)?;\n\
             value[\"amount\"] = read_decimal(&v1, 2, 10)?;"
        );
    }

    #[test]
    fn disabled_logical_types_fail_the_compile() {
        let store = SchemaStore::build({
            let schema = SchemaNode::parse(&json!({
                "type": "fixed", "name": "Dec8", "size": 8,
                "logicalType": "decimal", "precision": 10, "scale": 2
            }))
            .unwrap();
            [("Dec8".to_string(), schema)]
        });
        let compiler = Compiler::new(store, Options { logical_types: false });
        let err = compiler.compile("Dec8").unwrap_err();
        assert_eq!(err, CompileError::UnsupportedLogicalType("decimal".into()));
    }

    #[test]
    fn unknown_logical_names_fall_back_to_the_raw_codec() {
        let compiler = compiler_of(&[json!({
            "type": "record",
            "name": "Holder",
            "fields": [{"name": "x", "type": {"type": "string", "logicalType": "mystery"}}]
        })]);
        let artifact = compiler.compile("Holder").unwrap();
        assert_eq!(artifact.serialize_body, "write_string(buffer, &value[\"x\"])?;");
    }

    #[test]
    fn missing_root_is_schema_not_found() {
        let compiler = compiler_of(&[]);
        assert_eq!(
            compiler.compile("Ghost").unwrap_err(),
            CompileError::SchemaNotFound("Ghost".into())
        );
    }
}

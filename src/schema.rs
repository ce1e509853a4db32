//! Schema data model.
//!
//! Avro-style schema documents come in as `serde_json::Value` trees and are
//! parsed once into the strongly-typed `SchemaNode` sum type. Everything
//! downstream (store flattening, cycle analysis, code synthesis) matches
//! exhaustively on these variants instead of duck-typing the JSON.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::CompileError;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A schema node: a bare name (primitive or reference to a named type), a
/// union of alternatives, or a full definition. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Name(String),
    Union(Vec<SchemaNode>),
    Definition(Definition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub kind: Kind,
    /// Full name (namespace joined with `.`) for record/enum/fixed.
    pub name: Option<String>,
    pub fields: Vec<Field>,
    pub items: Option<Box<SchemaNode>>,
    pub values: Option<Box<SchemaNode>>,
    pub symbols: Vec<String>,
    pub size: Option<usize>,
    pub logical: Option<Logical>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: SchemaNode,
    pub default: Option<Value>,
}

/// Logical refinement of a primitive/fixed wire representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Logical {
    pub name: String,
    pub scale: u32,
    pub precision: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Record,
    Array,
    Map,
    Enum,
    Fixed,
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl Kind {
    pub fn primitive_from_name(s: &str) -> Option<Kind> {
        Some(match s {
            "null" => Kind::Null,
            "boolean" => Kind::Boolean,
            "int" => Kind::Int,
            "long" => Kind::Long,
            "float" => Kind::Float,
            "double" => Kind::Double,
            "bytes" => Kind::Bytes,
            "string" => Kind::String,
            _ => return None,
        })
    }

    pub fn is_primitive(self) -> bool {
        !matches!(
            self,
            Kind::Record | Kind::Array | Kind::Map | Kind::Enum | Kind::Fixed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Record => "record",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Enum => "enum",
            Kind::Fixed => "fixed",
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Int => "int",
            Kind::Long => "long",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Bytes => "bytes",
            Kind::String => "string",
        }
    }
}

pub fn is_primitive_name(s: &str) -> bool {
    Kind::primitive_from_name(s).is_some()
}

/// Namespace separators become `_` when a full name is spliced into a
/// generated function identifier.
pub fn sanitize(name: &str) -> String {
    name.replace('.', "_")
}

// ————————————————————————————————————————————————————————————————————————————
// NAMES
// ————————————————————————————————————————————————————————————————————————————

// Avro name grammar: dotted sequence of [A-Za-z_][A-Za-z0-9_]* atoms.
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

fn check_name(name: &str) -> Result<(), CompileError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(CompileError::InvalidName(name.to_string()))
    }
}

/// Resolve the full name of a definition: an already-dotted name wins, then
/// an explicit `namespace` attribute, then the enclosing namespace.
fn full_name(
    name: &str,
    namespace: Option<&str>,
    enclosing: Option<&str>,
) -> Result<String, CompileError> {
    check_name(name)?;
    if name.contains('.') {
        return Ok(name.to_string());
    }
    let ns = namespace.or(enclosing);
    match ns {
        Some(ns) if !ns.is_empty() => {
            check_name(ns)?;
            Ok(format!("{ns}.{name}"))
        }
        _ => Ok(name.to_string()),
    }
}

fn namespace_of(full: &str) -> Option<&str> {
    full.rsplit_once('.').map(|(ns, _)| ns)
}

// ————————————————————————————————————————————————————————————————————————————
// PARSING
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    /// Parse a schema document.
    pub fn parse(v: &Value) -> Result<SchemaNode, CompileError> {
        parse_node(v, None)
    }

    /// The full name of this node, when it is a named definition.
    pub fn name(&self) -> Option<&str> {
        match self {
            SchemaNode::Definition(def) => def.name.as_deref(),
            _ => None,
        }
    }
}

fn shape_err(v: &Value, detail: &str) -> CompileError {
    CompileError::UnsupportedSchemaShape(format!("{detail}: {v}"))
}

fn parse_node(v: &Value, enclosing: Option<&str>) -> Result<SchemaNode, CompileError> {
    match v {
        Value::String(s) => {
            if !is_primitive_name(s) {
                check_name(s)?;
            }
            Ok(SchemaNode::Name(s.clone()))
        }
        Value::Array(branches) => {
            let branches = branches
                .iter()
                .map(|b| parse_node(b, enclosing))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SchemaNode::Union(branches))
        }
        Value::Object(obj) => {
            let ty = obj
                .get("type")
                .ok_or_else(|| shape_err(v, "schema object without `type`"))?;
            match ty {
                // {"type": [...]} — a union spelled as a field type.
                Value::Array(_) => parse_node(ty, enclosing),
                // {"type": {...}} — a wrapped nested definition.
                Value::Object(_) => parse_node(ty, enclosing),
                Value::String(ty_name) => parse_definition(v, obj, ty_name, enclosing),
                other => Err(shape_err(other, "schema `type` must be a string, list or object")),
            }
        }
        other => Err(shape_err(other, "schema must be a string, list or object")),
    }
}

fn parse_definition(
    whole: &Value,
    obj: &serde_json::Map<String, Value>,
    ty_name: &str,
    enclosing: Option<&str>,
) -> Result<SchemaNode, CompileError> {
    let namespace = obj.get("namespace").and_then(Value::as_str);

    match ty_name {
        "record" => {
            let name = required_name(whole, obj, namespace, enclosing)?;
            let inner_ns = namespace_of(&name).map(str::to_string);
            let raw_fields = obj
                .get("fields")
                .and_then(Value::as_array)
                .ok_or_else(|| shape_err(whole, "record without `fields` list"))?;
            let mut fields = Vec::with_capacity(raw_fields.len());
            for raw in raw_fields {
                let fobj = raw
                    .as_object()
                    .ok_or_else(|| shape_err(raw, "record field must be an object"))?;
                let fname = fobj
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| shape_err(raw, "record field without `name`"))?;
                let fty = fobj
                    .get("type")
                    .ok_or_else(|| shape_err(raw, "record field without `type`"))?;
                fields.push(Field {
                    name: fname.to_string(),
                    schema: parse_node(fty, inner_ns.as_deref())?,
                    default: fobj.get("default").cloned(),
                });
            }
            Ok(SchemaNode::Definition(Definition {
                kind: Kind::Record,
                name: Some(name),
                fields,
                items: None,
                values: None,
                symbols: Vec::new(),
                size: None,
                logical: None,
            }))
        }
        "enum" => {
            let name = required_name(whole, obj, namespace, enclosing)?;
            let symbols = obj
                .get("symbols")
                .and_then(Value::as_array)
                .ok_or_else(|| shape_err(whole, "enum without `symbols` list"))?
                .iter()
                .map(|s| {
                    s.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| shape_err(s, "enum symbol must be a string"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SchemaNode::Definition(Definition {
                kind: Kind::Enum,
                name: Some(name),
                fields: Vec::new(),
                items: None,
                values: None,
                symbols,
                size: None,
                logical: None,
            }))
        }
        "fixed" => {
            let name = required_name(whole, obj, namespace, enclosing)?;
            let size = obj
                .get("size")
                .and_then(Value::as_u64)
                .ok_or_else(|| shape_err(whole, "fixed without integer `size`"))?;
            Ok(SchemaNode::Definition(Definition {
                kind: Kind::Fixed,
                name: Some(name),
                fields: Vec::new(),
                items: None,
                values: None,
                symbols: Vec::new(),
                size: Some(size as usize),
                logical: parse_logical(obj),
            }))
        }
        "array" => {
            let items = obj
                .get("items")
                .ok_or_else(|| shape_err(whole, "array without `items`"))?;
            Ok(SchemaNode::Definition(Definition {
                kind: Kind::Array,
                name: None,
                fields: Vec::new(),
                items: Some(Box::new(parse_node(items, enclosing)?)),
                values: None,
                symbols: Vec::new(),
                size: None,
                logical: None,
            }))
        }
        "map" => {
            let values = obj
                .get("values")
                .ok_or_else(|| shape_err(whole, "map without `values`"))?;
            Ok(SchemaNode::Definition(Definition {
                kind: Kind::Map,
                name: None,
                fields: Vec::new(),
                items: None,
                values: Some(Box::new(parse_node(values, enclosing)?)),
                symbols: Vec::new(),
                size: None,
                logical: None,
            }))
        }
        prim => {
            let kind = Kind::primitive_from_name(prim)
                .ok_or_else(|| shape_err(whole, "unrecognized schema `type`"))?;
            Ok(SchemaNode::Definition(Definition {
                kind,
                name: None,
                fields: Vec::new(),
                items: None,
                values: None,
                symbols: Vec::new(),
                size: None,
                logical: parse_logical(obj),
            }))
        }
    }
}

fn required_name(
    whole: &Value,
    obj: &serde_json::Map<String, Value>,
    namespace: Option<&str>,
    enclosing: Option<&str>,
) -> Result<String, CompileError> {
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| shape_err(whole, "named type without `name`"))?;
    full_name(name, namespace, enclosing)
}

fn parse_logical(obj: &serde_json::Map<String, Value>) -> Option<Logical> {
    let name = obj.get("logicalType")?.as_str()?.to_string();
    let scale = obj.get("scale").and_then(Value::as_u64).unwrap_or(0) as u32;
    let precision = obj.get("precision").and_then(Value::as_u64).unwrap_or(0) as u32;
    Some(Logical { name, scale, precision })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

//! Union branch resolution.
//!
//! Write side: branches are tested with synthesized membership predicates —
//! `null` first regardless of declared position, then declared order, first
//! match wins — and the *declared* branch index is what goes on the wire as
//! a zig-zag long before the payload. Read side: the decoded index selects
//! the branch directly, no predicate runs.

use crate::error::CompileError;
use crate::location::Location;
use crate::names::TempKind;
use crate::schema::{Kind, SchemaNode};
use crate::store::SchemaStore;
use crate::synth::{Session, is_null_branch, symbols_literal};
use crate::templates::indent;

pub(crate) fn serialize_union(
    session: &mut Session,
    branches: &[SchemaNode],
    loc: &Location,
    context: &str,
) -> Result<String, CompileError> {
    if branches.is_empty() {
        return Err(CompileError::UnsupportedSchemaShape("empty union".into()));
    }

    // Test order: null first (its declared index is preserved), then the
    // remaining branches in declared order.
    let mut ordered: Vec<(usize, &SchemaNode)> = Vec::with_capacity(branches.len());
    for (index, branch) in branches.iter().enumerate() {
        if is_null_branch(branch) {
            ordered.insert(0, (index, branch));
        } else {
            ordered.push((index, branch));
        }
    }

    let mut out = String::new();
    for (position, (index, branch)) in ordered.iter().enumerate() {
        let test = predicate(session.store, branch, loc, context)?;
        let payload = session.serialize_code(branch, loc, context)?;
        let block = indent(&format!("write_raw_long(buffer, {index});\n{payload}"), 4);
        if position == 0 {
            out.push_str(&format!("if {test} {{\n{block}\n"));
        } else {
            out.push_str(&format!("}} else if {test} {{\n{block}\n"));
        }
    }
    out.push_str("} else {\n    return Err(CodecError::NoMatchingUnionBranch);\n}");
    Ok(out)
}

pub(crate) fn deserialize_union(
    session: &mut Session,
    branches: &[SchemaNode],
    loc: &Location,
    context: &str,
) -> Result<String, CompileError> {
    if branches.is_empty() {
        return Err(CompileError::UnsupportedSchemaShape("empty union".into()));
    }
    let tag = session.names.next(TempKind::TypeTag);
    let mut out = format!("let {tag} = read_raw_long(source)?;\nmatch {tag} {{\n");
    for (index, branch) in branches.iter().enumerate() {
        let payload = session.deserialize_code(branch, loc, context)?;
        out.push_str(&format!("    {index} => {{\n{}\n    }}\n", indent(&payload, 8)));
    }
    out.push_str(&format!(
        "    _ => return Err(CodecError::InvalidUnionIndex({tag})),\n}}"
    ));
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// MEMBERSHIP PREDICATES
// ————————————————————————————————————————————————————————————————————————————

/// Synthesize the runtime type-membership test for one union branch.
fn predicate(
    store: &SchemaStore,
    branch: &SchemaNode,
    loc: &Location,
    context: &str,
) -> Result<String, CompileError> {
    let target = loc.render_place();
    let by_ref = loc.render_ref();
    match branch {
        SchemaNode::Union(_) => Err(CompileError::InvalidUnionConstraint(
            "a union may not directly contain another union".into(),
        )),
        SchemaNode::Name(name) => {
            if let Some(kind) = Kind::primitive_from_name(name) {
                Ok(primitive_predicate(kind, &target, &by_ref))
            } else {
                // A named reference tests as whatever it resolves to.
                let resolved = store.load(name, Some(context))?;
                let full = resolved.name().unwrap_or(name).to_string();
                predicate(store, &resolved, loc, &full)
            }
        }
        SchemaNode::Definition(def) => {
            if let Some(logical) = &def.logical {
                match (logical.name.as_str(), def.kind) {
                    ("decimal", Kind::Bytes | Kind::Fixed) => {
                        return Ok(format!("is_decimal_str({by_ref})"));
                    }
                    ("uuid", Kind::String) => return Ok(format!("is_uuid_str({by_ref})")),
                    ("date", Kind::Int) => return Ok(format!("is_date_str({by_ref})")),
                    ("time-millis", Kind::Int) => return Ok(format!("is_time_str({by_ref})")),
                    ("timestamp-millis" | "timestamp-micros", Kind::Long) => {
                        return Ok(format!("is_timestamp_str({by_ref})"));
                    }
                    _ => {} // unrecognized refinement: plain underlying test
                }
            }
            match def.kind {
                Kind::Record | Kind::Map => Ok(format!("{target}.is_object()")),
                Kind::Array => Ok(format!("{target}.is_array()")),
                Kind::Enum => Ok(format!(
                    "matches_enum({by_ref}, {})",
                    symbols_literal(&def.symbols)
                )),
                Kind::Fixed => {
                    let size = def.size.ok_or_else(|| {
                        CompileError::UnsupportedSchemaShape("fixed without size".into())
                    })?;
                    Ok(format!("is_fixed_str({by_ref}, {size})"))
                }
                kind => Ok(primitive_predicate(kind, &target, &by_ref)),
            }
        }
    }
}

fn primitive_predicate(kind: Kind, target: &str, by_ref: &str) -> String {
    match kind {
        Kind::Null => format!("{target}.is_null()"),
        Kind::Boolean => format!("{target}.is_boolean()"),
        Kind::Int | Kind::Long => format!("is_integer({by_ref})"),
        Kind::Float | Kind::Double => format!("{target}.is_number()"),
        Kind::Bytes | Kind::String => format!("{target}.is_string()"),
        // container kinds never reach here
        _ => unreachable!("primitive predicate for non-primitive kind"),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

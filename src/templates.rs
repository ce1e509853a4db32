//! Textual assembly.
//!
//! `render` is a total, side-effect-free substitution of `%{name}`
//! placeholders; the constants below are the code shapes the synthesizer
//! stitches fragments into. Keeping them here means the synthesizer reasons
//! about *structure* (locations, temporaries, recursion) while this module
//! owns every literal line of target-language syntax.

/// Replace each `%{key}` with its binding. Unknown placeholders are left
/// untouched, missing bindings are not an error.
pub fn render(template: &str, bindings: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in bindings {
        out = out.replace(&format!("%{{{key}}}"), value);
    }
    out
}

/// Indent every non-empty line by `n` spaces.
pub fn indent(text: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.is_empty() {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// TEMPLATES
// ————————————————————————————————————————————————————————————————————————————

/// Block-encoded array, write side: one non-empty block, zero terminator.
pub const ARRAY_SER: &str = "\
let %{items} = as_array(%{loc})?;
if !%{items}.is_empty() {
    write_raw_long(buffer, %{items}.len() as i64);
    for %{item} in %{items} {
%{item_code}
    }
}
write_raw_long(buffer, 0);";

/// Block-encoded array, read side. A negative count is the absolute item
/// count followed by the block's byte size, which is skipped.
pub const ARRAY_DE: &str = "\
let mut %{items} = Vec::new();
loop {
    let mut %{n} = read_raw_long(source)?;
    if %{n} == 0 {
        break;
    }
    if %{n} < 0 {
        %{n} = -%{n};
        let _ = read_raw_long(source)?;
    }
    for _ in 0..%{n} {
        #[allow(unused_assignments, unused_mut)]
        let mut %{item} = Value::Null;
%{item_code}
        %{items}.push(%{item});
    }
}
%{place} = Value::Array(%{items});";

pub const MAP_SER: &str = "\
let %{dict} = as_object(%{loc})?;
if !%{dict}.is_empty() {
    write_raw_long(buffer, %{dict}.len() as i64);
    for (%{key}, %{val}) in %{dict} {
        write_raw_string(buffer, %{key});
%{value_code}
    }
}
write_raw_long(buffer, 0);";

pub const MAP_DE: &str = "\
let mut %{dict} = Map::new();
loop {
    let mut %{n} = read_raw_long(source)?;
    if %{n} == 0 {
        break;
    }
    if %{n} < 0 {
        %{n} = -%{n};
        let _ = read_raw_long(source)?;
    }
    for _ in 0..%{n} {
        let %{key} = read_raw_string(source)?;
        #[allow(unused_assignments, unused_mut)]
        let mut %{val} = Value::Null;
%{value_code}
        %{dict}.insert(%{key}, %{val});
    }
}
%{place} = Value::Object(%{dict});";

/// Cycle-break auxiliary pair. These are synthesized by name from the start;
/// no generated text is ever rewritten after the fact.
pub const AUX_SERIALIZE_FN: &str = "\
#[allow(non_snake_case)]
fn serialize_%{name}(value: &Value, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
%{body}
    Ok(())
}";

pub const AUX_DESERIALIZE_FN: &str = "\
#[allow(non_snake_case)]
fn deserialize_%{name}(source: &mut Reader) -> Result<Value, CodecError> {
    #[allow(unused_assignments, unused_mut)]
    let mut value = Value::Null;
%{body}
    Ok(value)
}";

/// A whole loadable codec module: auxiliary functions plus exactly two entry
/// points.
pub const MODULE: &str = "\
//! Generated Avro codec for `%{root}`. Do not edit by hand.

#[allow(unused_imports)]
use serde_json::{Map, Value};
#[allow(unused_imports)]
use avrogen::runtime::*;

%{auxiliary}pub fn serialize(value: &Value, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
%{serialize_body}
    Ok(())
}

pub fn deserialize(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut reader = Reader::new(bytes);
    let source = &mut reader;
    #[allow(unused_assignments, unused_mut)]
    let mut value = Value::Null;
%{deserialize_body}
    Ok(value)
}
";

//! Primitive binary layer for generated codecs.
//!
//! Generated serialize/deserialize bodies call into these routines; nothing
//! here knows about schemas. Values travel as `serde_json::Value`:
//! `bytes`/`fixed` payloads are carried in JSON strings one char per byte
//! (U+0000..U+00FF), `string` payloads are ordinary UTF-8.
//!
//! Integers use the Avro zig-zag varint encoding; floats are little-endian
//! IEEE; bytes/strings are length-prefixed; arrays/maps are block-encoded by
//! the generated code itself on top of `write_raw_long`.

pub mod logical;

pub use logical::*;

use serde_json::{Map, Value};
use thiserror::Error;

/// Failures raised by *generated* code at encode/decode time. These are the
/// codec caller's problem, not the compiler's.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("enum index out of range: {0}")]
    InvalidSymbol(i64),

    #[error("union index out of range: {0}")]
    InvalidUnionIndex(i64),

    #[error("value matches no union branch")]
    NoMatchingUnionBranch,

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(expected: &'static str, v: &Value) -> CodecError {
    CodecError::TypeMismatch { expected, found: kind_of(v) }
}

// ————————————————————————————————————————————————————————————————————————————
// READER
// ————————————————————————————————————————————————————————————————————————————

/// Cursor over an input buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    pub fn read_byte(&mut self) -> Result<u8, CodecError> {
        let b = *self.buf.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(n).ok_or(CodecError::UnexpectedEof)?;
        let slice = self.buf.get(self.pos..end).ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RAW INTEGERS / STRINGS
// ————————————————————————————————————————————————————————————————————————————

/// Zig-zag varint. Also used by generated code for block counts, union
/// branch indices and enum symbol indices.
pub fn write_raw_long(buffer: &mut Vec<u8>, v: i64) {
    let mut z = ((v << 1) ^ (v >> 63)) as u64;
    loop {
        let byte = (z & 0x7f) as u8;
        z >>= 7;
        if z == 0 {
            buffer.push(byte);
            break;
        }
        buffer.push(byte | 0x80);
    }
}

pub fn read_raw_long(source: &mut Reader) -> Result<i64, CodecError> {
    let mut z: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = source.read_byte()?;
        z |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
        if shift > 63 {
            return Err(CodecError::InvalidValue("varint longer than 10 bytes".into()));
        }
    }
    Ok(((z >> 1) as i64) ^ -((z & 1) as i64))
}

pub fn write_raw_string(buffer: &mut Vec<u8>, s: &str) {
    write_raw_long(buffer, s.len() as i64);
    buffer.extend_from_slice(s.as_bytes());
}

pub fn read_raw_string(source: &mut Reader) -> Result<String, CodecError> {
    let len = read_raw_long(source)?;
    if len < 0 {
        return Err(CodecError::InvalidValue(format!("negative string length {len}")));
    }
    let bytes = source.read_exact(len as usize)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| CodecError::InvalidValue(format!("string is not utf-8: {e}")))
}

// ————————————————————————————————————————————————————————————————————————————
// BYTE-STRING CONVENTION
// ————————————————————————————————————————————————————————————————————————————

/// Decode a byte-carrying JSON string (one char per byte, U+00..U+FF).
pub fn value_bytes(v: &Value) -> Result<Vec<u8>, CodecError> {
    let s = v.as_str().ok_or_else(|| mismatch("bytes", v))?;
    s.chars()
        .map(|c| {
            u8::try_from(c as u32)
                .map_err(|_| CodecError::InvalidValue(format!("non-byte char {c:?} in bytes value")))
        })
        .collect()
}

pub fn bytes_value(bytes: &[u8]) -> Value {
    Value::String(bytes.iter().map(|&b| b as char).collect())
}

// ————————————————————————————————————————————————————————————————————————————
// PRIMITIVE WRITERS
// ————————————————————————————————————————————————————————————————————————————

pub fn write_null(_buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    if v.is_null() { Ok(()) } else { Err(mismatch("null", v)) }
}

pub fn write_boolean(buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    let b = v.as_bool().ok_or_else(|| mismatch("boolean", v))?;
    buffer.push(b as u8);
    Ok(())
}

pub fn write_int(buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    let n = v.as_i64().ok_or_else(|| mismatch("int", v))?;
    if i32::try_from(n).is_err() {
        return Err(CodecError::InvalidValue(format!("{n} out of range for int")));
    }
    write_raw_long(buffer, n);
    Ok(())
}

pub fn write_long(buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    let n = v.as_i64().ok_or_else(|| mismatch("long", v))?;
    write_raw_long(buffer, n);
    Ok(())
}

pub fn write_float(buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    let f = v.as_f64().ok_or_else(|| mismatch("float", v))?;
    buffer.extend_from_slice(&(f as f32).to_le_bytes());
    Ok(())
}

pub fn write_double(buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    let f = v.as_f64().ok_or_else(|| mismatch("double", v))?;
    buffer.extend_from_slice(&f.to_le_bytes());
    Ok(())
}

pub fn write_bytes(buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    let bytes = value_bytes(v)?;
    write_raw_long(buffer, bytes.len() as i64);
    buffer.extend_from_slice(&bytes);
    Ok(())
}

pub fn write_string(buffer: &mut Vec<u8>, v: &Value) -> Result<(), CodecError> {
    let s = v.as_str().ok_or_else(|| mismatch("string", v))?;
    write_raw_string(buffer, s);
    Ok(())
}

pub fn write_fixed(buffer: &mut Vec<u8>, v: &Value, size: usize) -> Result<(), CodecError> {
    let bytes = value_bytes(v)?;
    if bytes.len() != size {
        return Err(CodecError::InvalidValue(format!(
            "fixed value is {} bytes, schema says {size}",
            bytes.len()
        )));
    }
    buffer.extend_from_slice(&bytes);
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// PRIMITIVE READERS
// ————————————————————————————————————————————————————————————————————————————

pub fn read_null(_source: &mut Reader) -> Result<Value, CodecError> {
    Ok(Value::Null)
}

pub fn read_boolean(source: &mut Reader) -> Result<Value, CodecError> {
    match source.read_byte()? {
        0 => Ok(Value::Bool(false)),
        1 => Ok(Value::Bool(true)),
        b => Err(CodecError::InvalidValue(format!("boolean byte {b}"))),
    }
}

pub fn read_int(source: &mut Reader) -> Result<Value, CodecError> {
    let n = read_raw_long(source)?;
    if i32::try_from(n).is_err() {
        return Err(CodecError::InvalidValue(format!("{n} out of range for int")));
    }
    Ok(Value::from(n))
}

pub fn read_long(source: &mut Reader) -> Result<Value, CodecError> {
    Ok(Value::from(read_raw_long(source)?))
}

pub fn read_float(source: &mut Reader) -> Result<Value, CodecError> {
    let bytes: [u8; 4] = source.read_exact(4)?.try_into().unwrap();
    let f = f32::from_le_bytes(bytes) as f64;
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| CodecError::InvalidValue("non-finite float".into()))
}

pub fn read_double(source: &mut Reader) -> Result<Value, CodecError> {
    let bytes: [u8; 8] = source.read_exact(8)?.try_into().unwrap();
    let f = f64::from_le_bytes(bytes);
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| CodecError::InvalidValue("non-finite double".into()))
}

pub fn read_bytes(source: &mut Reader) -> Result<Value, CodecError> {
    let len = read_raw_long(source)?;
    if len < 0 {
        return Err(CodecError::InvalidValue(format!("negative bytes length {len}")));
    }
    Ok(bytes_value(source.read_exact(len as usize)?))
}

pub fn read_string(source: &mut Reader) -> Result<Value, CodecError> {
    Ok(Value::String(read_raw_string(source)?))
}

pub fn read_fixed(source: &mut Reader, size: usize) -> Result<Value, CodecError> {
    Ok(bytes_value(source.read_exact(size)?))
}

// ————————————————————————————————————————————————————————————————————————————
// SHAPE HELPERS (called by generated code)
// ————————————————————————————————————————————————————————————————————————————

pub fn as_array(v: &Value) -> Result<&Vec<Value>, CodecError> {
    v.as_array().ok_or_else(|| mismatch("array", v))
}

pub fn as_object(v: &Value) -> Result<&Map<String, Value>, CodecError> {
    v.as_object().ok_or_else(|| mismatch("object", v))
}

pub fn is_integer(v: &Value) -> bool {
    v.as_i64().is_some() || v.as_u64().is_some()
}

/// Byte-type membership test for `fixed` union branches.
pub fn is_fixed_str(v: &Value, size: usize) -> bool {
    v.as_str()
        .is_some_and(|s| s.chars().all(|c| (c as u32) <= 0xff) && s.chars().count() == size)
}

/// Enum membership test for union branches.
pub fn matches_enum(v: &Value, symbols: &[&str]) -> bool {
    v.as_str().is_some_and(|s| symbols.contains(&s))
}

/// Index of the current symbol within the declared symbol list.
pub fn enum_index(v: &Value, symbols: &[&str]) -> Result<i64, CodecError> {
    let s = v.as_str().ok_or_else(|| mismatch("enum symbol", v))?;
    symbols
        .iter()
        .position(|sym| *sym == s)
        .map(|i| i as i64)
        .ok_or_else(|| CodecError::InvalidValue(format!("symbol {s:?} not in enum")))
}

/// Symbol lookup by decoded index; out-of-range fails.
pub fn enum_symbol(index: i64, symbols: &[&str]) -> Result<Value, CodecError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| symbols.get(i))
        .map(|s| Value::String((*s).to_string()))
        .ok_or(CodecError::InvalidSymbol(index))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

//! Generated Avro codec for `Variant`. Do not edit by hand.

#[allow(unused_imports)]
use serde_json::{Map, Value};
#[allow(unused_imports)]
use avrogen::runtime::*;

pub fn serialize(value: &Value, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
    if value["u"].is_null() {
        write_raw_long(buffer, 0);
        write_null(buffer, &value["u"])?;
    } else if is_integer(&value["u"]) {
        write_raw_long(buffer, 1);
        write_int(buffer, &value["u"])?;
    } else if value["u"].is_string() {
        write_raw_long(buffer, 2);
        write_string(buffer, &value["u"])?;
    } else {
        return Err(CodecError::NoMatchingUnionBranch);
    }
    let d0 = as_object(&value["tags"])?;
    if !d0.is_empty() {
        write_raw_long(buffer, d0.len() as i64);
        for (k0, v0) in d0 {
            write_raw_string(buffer, k0);
            write_int(buffer, v0)?;
        }
    }
    write_raw_long(buffer, 0);
    let tag0 = enum_index(&value["color"], &["R", "G", "B"])?;
    write_raw_long(buffer, tag0);
    Ok(())
}

pub fn deserialize(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut reader = Reader::new(bytes);
    let source = &mut reader;
    #[allow(unused_assignments, unused_mut)]
    let mut value = Value::Null;
    value = Value::Object(Map::new());
    let tag1 = read_raw_long(source)?;
    match tag1 {
        0 => {
            value["u"] = read_null(source)?;
        }
        1 => {
            value["u"] = read_int(source)?;
        }
        2 => {
            value["u"] = read_string(source)?;
        }
        _ => return Err(CodecError::InvalidUnionIndex(tag1)),
    }
    let mut d1 = Map::new();
    loop {
        let mut n0 = read_raw_long(source)?;
        if n0 == 0 {
            break;
        }
        if n0 < 0 {
            n0 = -n0;
            let _ = read_raw_long(source)?;
        }
        for _ in 0..n0 {
            let k1 = read_raw_string(source)?;
            #[allow(unused_assignments, unused_mut)]
            let mut v1 = Value::Null;
            v1 = read_int(source)?;
            d1.insert(k1, v1);
        }
    }
    value["tags"] = Value::Object(d1);
    let tag2 = read_raw_long(source)?;
    value["color"] = enum_symbol(tag2, &["R", "G", "B"])?;
    Ok(value)
}

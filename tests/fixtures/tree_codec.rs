//! Generated Avro codec for `TreeNode`. Do not edit by hand.

#[allow(unused_imports)]
use serde_json::{Map, Value};
#[allow(unused_imports)]
use avrogen::runtime::*;

#[allow(non_snake_case)]
fn deserialize_TreeNode(source: &mut Reader) -> Result<Value, CodecError> {
    #[allow(unused_assignments, unused_mut)]
    let mut value = Value::Null;
    value = Value::Object(Map::new());
    value["value"] = read_int(source)?;
    let mut d2 = Vec::new();
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
            #[allow(unused_assignments, unused_mut)]
            let mut v2 = Value::Null;
            v2 = deserialize_TreeNode(source)?;
            d2.push(v2);
        }
    }
    value["children"] = Value::Array(d2);
    Ok(value)
}

#[allow(non_snake_case)]
fn serialize_TreeNode(value: &Value, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
    write_int(buffer, &value["value"])?;
    let d1 = as_array(&value["children"])?;
    if !d1.is_empty() {
        write_raw_long(buffer, d1.len() as i64);
        for v1 in d1 {
            serialize_TreeNode(v1, buffer)?;
        }
    }
    write_raw_long(buffer, 0);
    Ok(())
}

pub fn serialize(value: &Value, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
    write_int(buffer, &value["value"])?;
    let d0 = as_array(&value["children"])?;
    if !d0.is_empty() {
        write_raw_long(buffer, d0.len() as i64);
        for v0 in d0 {
            serialize_TreeNode(v0, buffer)?;
        }
    }
    write_raw_long(buffer, 0);
    Ok(())
}

pub fn deserialize(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut reader = Reader::new(bytes);
    let source = &mut reader;
    #[allow(unused_assignments, unused_mut)]
    let mut value = Value::Null;
    value = Value::Object(Map::new());
    value["value"] = read_int(source)?;
    let mut d3 = Vec::new();
    loop {
        let mut n1 = read_raw_long(source)?;
        if n1 == 0 {
            break;
        }
        if n1 < 0 {
            n1 = -n1;
            let _ = read_raw_long(source)?;
        }
        for _ in 0..n1 {
            #[allow(unused_assignments, unused_mut)]
            let mut v3 = Value::Null;
            v3 = deserialize_TreeNode(source)?;
            d3.push(v3);
        }
    }
    value["children"] = Value::Array(d3);
    Ok(value)
}

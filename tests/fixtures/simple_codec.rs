//! Generated Avro codec for `Simple`. Do not edit by hand.

#[allow(unused_imports)]
use serde_json::{Map, Value};
#[allow(unused_imports)]
use avrogen::runtime::*;

pub fn serialize(value: &Value, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
    write_int(buffer, &value["a"])?;
    write_string(buffer, &value["b"])?;
    Ok(())
}

pub fn deserialize(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut reader = Reader::new(bytes);
    let source = &mut reader;
    #[allow(unused_assignments, unused_mut)]
    let mut value = Value::Null;
    value = Value::Object(Map::new());
    value["a"] = read_int(source)?;
    value["b"] = read_string(source)?;
    Ok(value)
}

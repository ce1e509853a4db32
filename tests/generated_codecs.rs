//! End-to-end coverage: compile schemas through the public API, pin the
//! emitted module text against checked-in fixtures, and exercise those same
//! fixtures as compiled code over the runtime layer.

use avrogen::runtime::CodecError;
use avrogen::{Compiler, Options, SchemaNode, SchemaStore, codec_module_source};
use pretty_assertions::assert_eq;
use serde_json::json;

#[path = "fixtures/simple_codec.rs"]
mod simple_codec;
#[path = "fixtures/tree_codec.rs"]
mod tree_codec;
#[path = "fixtures/variant_codec.rs"]
mod variant_codec;

fn compile_module(doc: serde_json::Value) -> String {
    let schema = SchemaNode::parse(&doc).unwrap();
    let root = schema.name().unwrap().to_string();
    let store = SchemaStore::build([(root.clone(), schema)]);
    let artifact = Compiler::new(store, Options::default())
        .compile(&root)
        .unwrap();
    codec_module_source(&artifact, &root)
}

fn simple_schema() -> serde_json::Value {
    json!({
        "type": "record",
        "name": "Simple",
        "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"}
        ]
    })
}

fn tree_schema() -> serde_json::Value {
    json!({
        "type": "record",
        "name": "TreeNode",
        "fields": [
            {"name": "value", "type": "int"},
            {"name": "children", "type": {"type": "array", "items": "TreeNode"}}
        ]
    })
}

fn variant_schema() -> serde_json::Value {
    json!({
        "type": "record",
        "name": "Variant",
        "fields": [
            {"name": "u", "type": ["null", "int", "string"]},
            {"name": "tags", "type": {"type": "map", "values": "int"}},
            {"name": "color", "type": {"type": "enum", "name": "Color", "symbols": ["R", "G", "B"]}}
        ]
    })
}

// ————————————————————————————————————————————————————————————————————————————
// EMITTED TEXT ↔ FIXTURES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn simple_module_text_matches_fixture() {
    assert_eq!(
        compile_module(simple_schema()),
        include_str!("fixtures/simple_codec.rs")
    );
}

#[test]
fn tree_module_text_matches_fixture() {
    assert_eq!(
        compile_module(tree_schema()),
        include_str!("fixtures/tree_codec.rs")
    );
}

#[test]
fn variant_module_text_matches_fixture() {
    assert_eq!(
        compile_module(variant_schema()),
        include_str!("fixtures/variant_codec.rs")
    );
}

// ————————————————————————————————————————————————————————————————————————————
// WIRE ROUND TRIPS THROUGH THE FIXTURES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn simple_record_round_trips() {
    let original = json!({"a": 5, "b": "hi"});
    let mut buffer = Vec::new();
    simple_codec::serialize(&original, &mut buffer).unwrap();
    assert_eq!(buffer, vec![0x0a, 0x04, b'h', b'i']);
    assert_eq!(simple_codec::deserialize(&buffer).unwrap(), original);
}

#[test]
fn recursive_tree_round_trips() {
    let original = json!({
        "value": 1,
        "children": [
            {"value": 2, "children": []},
            {"value": 3, "children": []}
        ]
    });
    let mut buffer = Vec::new();
    tree_codec::serialize(&original, &mut buffer).unwrap();
    // value 1, block of 2 children (each: value + empty block), terminator
    assert_eq!(buffer, vec![0x02, 0x04, 0x04, 0x00, 0x06, 0x00, 0x00]);
    assert_eq!(tree_codec::deserialize(&buffer).unwrap(), original);
}

#[test]
fn negative_block_counts_skip_the_block_size() {
    // Same tree, but the children block is written with count -2 followed by
    // a block byte size of 4.
    let bytes = [0x02, 0x03, 0x08, 0x04, 0x00, 0x06, 0x00, 0x00];
    let decoded = tree_codec::deserialize(&bytes).unwrap();
    assert_eq!(
        decoded,
        json!({
            "value": 1,
            "children": [
                {"value": 2, "children": []},
                {"value": 3, "children": []}
            ]
        })
    );
}

#[test]
fn union_null_branch_round_trips() {
    let original = json!({"u": null, "tags": {}, "color": "R"});
    let mut buffer = Vec::new();
    variant_codec::serialize(&original, &mut buffer).unwrap();
    // union index 0, empty map terminator, enum index 0
    assert_eq!(buffer, vec![0x00, 0x00, 0x00]);
    assert_eq!(variant_codec::deserialize(&buffer).unwrap(), original);
}

#[test]
fn union_int_branch_round_trips() {
    let original = json!({"u": 5, "tags": {"a": 1}, "color": "B"});
    let mut buffer = Vec::new();
    variant_codec::serialize(&original, &mut buffer).unwrap();
    assert_eq!(
        buffer,
        vec![0x02, 0x0a, 0x02, 0x02, b'a', 0x02, 0x00, 0x04]
    );
    assert_eq!(variant_codec::deserialize(&buffer).unwrap(), original);
}

#[test]
fn union_string_branch_round_trips() {
    let original = json!({"u": "hi", "tags": {}, "color": "G"});
    let mut buffer = Vec::new();
    variant_codec::serialize(&original, &mut buffer).unwrap();
    assert_eq!(buffer, vec![0x04, 0x04, b'h', b'i', 0x00, 0x02]);
    assert_eq!(variant_codec::deserialize(&buffer).unwrap(), original);
}

#[test]
fn unmatched_union_value_is_rejected_at_write_time() {
    let mut buffer = Vec::new();
    let err = variant_codec::serialize(&json!({"u": true, "tags": {}, "color": "R"}), &mut buffer)
        .unwrap_err();
    assert_eq!(err, CodecError::NoMatchingUnionBranch);
}

#[test]
fn out_of_range_union_index_is_rejected_at_read_time() {
    // union index 3 on a three-branch union
    let err = variant_codec::deserialize(&[0x06]).unwrap_err();
    assert_eq!(err, CodecError::InvalidUnionIndex(3));
}

#[test]
fn out_of_range_enum_index_is_rejected_at_read_time() {
    // null branch, empty map, enum index 3
    let err = variant_codec::deserialize(&[0x00, 0x00, 0x06]).unwrap_err();
    assert_eq!(err, CodecError::InvalidSymbol(3));
}

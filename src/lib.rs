//! avrogen: an Avro-style schema compiler.
//!
//! Feed it declarative schema documents (records, arrays, maps, enums,
//! unions, fixed, logical types); ahead of runtime it emits a pair of
//! serialize/deserialize routines — Rust source text targeting the
//! `runtime` primitive layer — that convert between an in-memory
//! `serde_json::Value` and the Avro binary wire format.
//!
//! Pipeline: parse documents into [`schema::SchemaNode`], flatten them into
//! a [`store::SchemaStore`], run [`cycles::analyze`] once per store, then
//! let [`synth::Compiler`] perform the two recursive passes per root schema.

pub mod cli;
pub mod cycles;
pub mod error;
pub mod location;
pub mod names;
pub mod runtime;
pub mod schema;
pub mod store;
pub mod synth;
pub mod templates;
mod union;

pub use error::CompileError;
pub use schema::SchemaNode;
pub use store::SchemaStore;
pub use synth::{Compiler, GeneratedArtifact, Options};

/// Combine an artifact's three text blocks into a loadable codec module
/// exposing exactly two operations: `serialize(value) -> bytes` and
/// `deserialize(bytes) -> value`.
pub fn codec_module_source(artifact: &GeneratedArtifact, root: &str) -> String {
    let mut auxiliary = String::new();
    for function in &artifact.auxiliary {
        auxiliary.push_str(function);
        auxiliary.push_str("\n\n");
    }
    templates::render(
        templates::MODULE,
        &[
            ("root", root),
            ("auxiliary", &auxiliary),
            ("serialize_body", &templates::indent(&artifact.serialize_body, 4)),
            ("deserialize_body", &templates::indent(&artifact.deserialize_body, 4)),
        ],
    )
}

//! Compiler-side error taxonomy.
//!
//! Everything here is fatal and synchronous: a malformed schema aborts the
//! whole root compile, there is no partial-artifact mode. Failures raised by
//! *generated* code at encode/decode time live in `runtime::CodecError`.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// A referenced name is absent from both the context-local and the
    /// global namespace.
    #[error("schema not found: `{0}`")]
    SchemaNotFound(String),

    /// A schema node's shape does not match any recognized Avro construct.
    #[error("unsupported schema shape: {0}")]
    UnsupportedSchemaShape(String),

    /// A known logical type was used while the logical-type capability is
    /// disabled in the compile options.
    #[error("unsupported logical type: `{0}` (logical types are disabled)")]
    UnsupportedLogicalType(String),

    /// No runtime membership test can be synthesized for a declared union
    /// branch (e.g. a union nested directly inside a union).
    #[error("no membership test for union branch: {0}")]
    InvalidUnionConstraint(String),

    /// A name that does not satisfy the Avro name grammar.
    #[error("invalid schema name: `{0}`")]
    InvalidName(String),
}

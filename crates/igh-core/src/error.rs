//! Error types for igh-core

use thiserror::Error;

/// Core error type for the transform engine.
///
/// Every variant is a configuration error in the sense of the pipeline
/// contract: all of these are detectable before a single source row is read.
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Unrecognized mapping expression syntax
    #[error("[E001] Cannot parse mapping expression '{expr}': {reason}")]
    ExprParse { expr: String, reason: String },

    /// E002: LOOKUP name not present in the fixed registry
    #[error("[E002] Unknown lookup table '{name}' in {table}.{column}")]
    UnknownLookup {
        name: String,
        table: String,
        column: String,
    },

    /// E003: Circular dependency among mapped tables
    #[error("[E003] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E004: A table is ordered before a dimension it references
    #[error("[E004] Load order violation: '{table}' is loaded before referenced dimension '{dimension}'")]
    LoadOrderViolation { table: String, dimension: String },

    /// E005: A mapped table is missing from the load order
    #[error("[E005] Table '{table}' is mapped but missing from the load order")]
    TableNotInOrder { table: String },

    /// E006: The load order names a table the schema map does not define
    #[error("[E006] Load order entry '{table}' is not in the schema map")]
    UnknownTableInOrder { table: String },

    /// E007: Duplicate target table name
    #[error("[E007] Duplicate table '{name}' in schema map or load order")]
    DuplicateTable { name: String },

    /// E008: FK expression references a table the schema map does not define
    #[error("[E008] {table}.{column} references unknown dimension '{dimension}'")]
    UnknownFkTarget {
        table: String,
        column: String,
        dimension: String,
    },

    /// E009: FK lookup column does not match the dimension's natural key
    #[error("[E009] {table}.{column} looks up '{dimension}' by a column that is not its natural key ({expected})")]
    NaturalKeyMismatch {
        table: String,
        column: String,
        dimension: String,
        expected: String,
    },

    /// E010: Composite FK does not line up with the dimension's distinct columns
    #[error("[E010] {table}.{column}: composite key does not match the distinct columns of '{dimension}'")]
    CompositeKeyMismatch {
        table: String,
        column: String,
        dimension: String,
    },

    /// E011: Structurally invalid table spec
    #[error("[E011] Invalid spec for table '{table}': {reason}")]
    InvalidTableSpec { table: String, reason: String },

    /// E012: IO error
    #[error("[E012] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E013: Schema-map YAML parse error
    #[error("[E013] Schema map parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

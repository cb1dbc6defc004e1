//! igh-core - Core library for the IGH transform engine
//!
//! This crate provides the schema-map model, the mapping-expression AST and
//! parser, the table dependency DAG, the DDL generator, and the run report
//! shared across all pipeline components. It has no database access.

pub mod dag;
pub mod ddl;
pub mod error;
pub mod expr;
pub mod lookup;
pub mod report;
pub mod schema;
pub mod value;

pub use dag::TableDag;
pub use ddl::{generate_all_ddl, generate_create_table, infer_column_type, ColumnType};
pub use error::{CoreError, CoreResult};
pub use expr::{CaseExpr, Expr, FkSource};
pub use lookup::{LookupRegistry, LookupTable};
pub use report::{ReferentialWarning, RunReport, TableLoad};
pub use schema::{
    delimited_fk_column, ColumnSpec, CompiledColumn, CompiledMap, CompiledTable, SchemaMap,
    SourceKind, Special, TableKind, TableSpec,
};
pub use value::{KeyPart, KeyTuple, Value};

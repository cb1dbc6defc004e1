//! igh-db - Database abstraction for the IGH transform engine
//!
//! Exposes the [`Database`] trait consumed by the extractor and loader, and
//! the DuckDB backend implementing it. Source stores are opened read-only;
//! target stores take engine-assigned surrogate keys through parameterized
//! inserts.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use crate::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, Row};

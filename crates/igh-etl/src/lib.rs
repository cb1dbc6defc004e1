//! Transform-and-load engine: reads a normalized CRM-style store and
//! materializes a star schema (dimensions, facts, bridges) into a target
//! database, resolving option sets, foreign keys, and lookup tables on
//! the way through.

pub mod cleanup;
pub mod dimkeys;
pub mod error;
pub mod eval;
pub mod extractor;
pub mod loader;
pub mod optionset;
pub mod pipeline;
pub mod silver;
pub mod starmap;
pub mod transform;

pub use cleanup::TableData;
pub use dimkeys::DimKeyCache;
pub use error::{EtlError, EtlResult};
pub use eval::{EvalContext, Resolved};
pub use extractor::Extractor;
pub use loader::Loader;
pub use optionset::OptionsetCatalog;
pub use pipeline::Pipeline;
pub use starmap::{builtin_load_order, builtin_lookups, builtin_schema_map};
pub use transform::{TransformedTable, Transformer};

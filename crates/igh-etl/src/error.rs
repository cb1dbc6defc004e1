use thiserror::Error;

/// Errors raised while transforming and loading a star schema
#[derive(Error, Debug)]
pub enum EtlError {
    #[error(transparent)]
    Core(#[from] igh_core::CoreError),

    #[error(transparent)]
    Db(#[from] igh_db::DbError),

    #[error("[T001] Unknown option code {code} in optionset '{optionset}'")]
    UnknownOptionCode { optionset: String, code: i64 },

    #[error("[T002] Option code {code} is ambiguous: '{optionset}' maps it to both '{first}' and '{second}'")]
    AmbiguousOptionset {
        optionset: String,
        code: i64,
        first: String,
        second: String,
    },

    #[error("[T003] No optionset table found for column '{column}' (expected '{expected_table}')")]
    MissingOptionset {
        column: String,
        expected_table: String,
    },

    #[error("[T004] Cannot load '{table}': dimension '{dependency}' has not been inserted yet")]
    DependencyNotInserted { table: String, dependency: String },

    #[error("[T005] Column '{column}' holds '{value}', which is not a numeric option code")]
    BadOptionCode { column: String, value: String },

    #[error("[T006] Source table '{table}' is missing column '{column}'")]
    MissingSourceColumn { table: String, column: String },
}

pub type EtlResult<T> = Result<T, EtlError>;

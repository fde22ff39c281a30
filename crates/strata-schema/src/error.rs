use strata_core::{dialect::Dialect, error::DriverError, value::FieldType};
use thiserror::Error as ThisError;

///
/// SchemaError
///
/// A structurally invalid schema or an impossible column conversion.
/// Always raised before any DDL is rendered.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error(
        "foreign key {symbol:?} on table {table:?} must reference the primary key \
         or a unique column of {ref_table:?}"
    )]
    BadReference {
        table: String,
        symbol: String,
        ref_table: String,
    },

    #[error("duplicate column {column:?} on table {table:?}")]
    DuplicateColumn { table: String, column: String },

    #[error("duplicate table {table:?}")]
    DuplicateTable { table: String },

    #[error("foreign key {symbol:?} on table {table:?} has mismatched column counts")]
    FkArity { table: String, symbol: String },

    #[error("foreign key {symbol:?} on table {table:?} names unknown column {column:?}")]
    FkColumn {
        table: String,
        symbol: String,
        column: String,
    },

    #[error("column {table:?}.{column:?} cannot convert from {from} to {to}")]
    Incompatible {
        table: String,
        column: String,
        from: FieldType,
        to: FieldType,
    },

    #[error("index {index:?} on table {table:?} names unknown column {column:?}")]
    IndexColumn {
        table: String,
        index: String,
        column: String,
    },

    #[error(
        "column {table:?}.{column:?} conversion from {from} to {to} is narrowing; \
         enable allow_narrowing to force it"
    )]
    Narrowing {
        table: String,
        column: String,
        from: FieldType,
        to: FieldType,
    },

    #[error("foreign key {symbol:?} on table {table:?} references unknown table {ref_table:?}")]
    UnknownRefTable {
        table: String,
        symbol: String,
        ref_table: String,
    },
}

///
/// MigrateError
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum MigrateError {
    #[error("schema change failed: {0}")]
    Apply(#[source] DriverError),

    #[error("migration canceled before completion")]
    Canceled,

    #[error(
        "migration stopped after {applied} of {total} changes; change {index} failed: {source}"
    )]
    Partial {
        applied: usize,
        total: usize,
        index: usize,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{dialect} cannot apply this change online: {change}")]
    Unsupported { dialect: Dialect, change: String },
}

impl MigrateError {
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }
}

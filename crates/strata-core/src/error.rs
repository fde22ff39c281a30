use crate::{
    dialect::{Dialect, DialectAdapter},
    value::{FieldType, Value},
};
use thiserror::Error as ThisError;

/// Raw error surfaced by the underlying driver. Passed through unchanged
/// unless it matches a dialect's constraint patterns.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

///
/// ValidationError
///
/// Malformed spec, always detected before any SQL is issued.
/// Never requires a driver round trip.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum ValidationError {
    #[error("edge on table {table:?} expects {expected} column(s), got {got}")]
    EdgeColumns { table: String, expected: usize, got: usize },

    #[error("id value provided for some batch rows but not all")]
    InconsistentIds,

    #[error("invalid enum value {value:?} for column {column:?}")]
    InvalidEnum { column: String, value: String },

    #[error("missing required field {column:?}")]
    MissingField { column: String },

    #[error("missing node id for {op} on table {table:?}")]
    MissingId { op: &'static str, table: String },

    #[error("batch insert spans more than one table: {first:?} != {other:?}")]
    MixedTables { first: String, other: String },

    #[error("cannot link foreign-key edge to more than one node")]
    MultiNodeFkEdge,

    #[error("add mutation on non-numeric column {column:?} of type {ty}")]
    NonNumericAdd { column: String, ty: FieldType },

    #[error("unknown column {column:?} on table {table:?}")]
    UnknownColumn { table: String, column: String },
}

///
/// ConstraintError
///
/// A unique or foreign-key violation surfaced by the database, reclassified
/// from the dialect's raw error text. The original driver error stays
/// reachable through `source()`.
///

#[derive(Debug, ThisError)]
#[error("constraint failed: {source}")]
pub struct ConstraintError {
    pub dialect: Dialect,
    #[source]
    pub source: DriverError,
}

///
/// Error
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("operation canceled before execution")]
    Canceled,

    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error("driver: {0}")]
    Driver(DriverError),

    #[error("record with id {id} not found in table {table:?}")]
    NotFound { table: String, id: Value },

    #[error("{count} records found in table {table:?} where exactly one was expected")]
    NotSingular { table: String, count: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// True when the error wraps a reclassified constraint violation.
#[must_use]
pub const fn is_constraint_error(err: &Error) -> bool {
    err.is_constraint()
}

/// Reclassify a raw driver error after a round trip completed.
///
/// The substring table lives on the dialect adapter so that future
/// error-message changes need a single update point. Unmatched errors pass
/// through unchanged.
#[must_use]
pub fn classify(adapter: &dyn DialectAdapter, source: DriverError) -> Error {
    let text = source.to_string();
    if adapter
        .constraint_error_patterns()
        .iter()
        .any(|pattern| text.contains(pattern))
    {
        return Error::Constraint(ConstraintError {
            dialect: adapter.dialect(),
            source,
        });
    }
    Error::Driver(source)
}

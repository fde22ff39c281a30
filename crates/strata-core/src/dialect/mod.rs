//! Per-database quoting, placeholders, type mapping, and feature flags.
//!
//! A [`DialectAdapter`] is selected once per client and threaded through the
//! compiler, differ, and migration executor. Nothing else in the workspace
//! branches on the dialect.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use crate::value::{FieldType, Value};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Dialect
///

#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize,
)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Resolve the capability adapter for this dialect.
    #[must_use]
    pub const fn adapter(self) -> &'static dyn DialectAdapter {
        match self {
            Self::MySql => &MySql,
            Self::Postgres => &Postgres,
            Self::Sqlite => &Sqlite,
        }
    }
}

///
/// DialectAdapter
///
/// Capability interface covering everything the compiler, differ, and
/// executor need to know about one database backend.
///

pub trait DialectAdapter: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Quote an identifier (table, column, index, or constraint name).
    fn quote_ident(&self, ident: &str) -> String;

    /// Positional placeholder for the 1-based argument index.
    fn placeholder(&self, index: usize) -> String;

    /// Dialect column type for a semantic type and optional size.
    fn type_for(&self, ty: FieldType, size: Option<u64>) -> String;

    /// Whether INSERT supports a RETURNING clause for id retrieval.
    fn supports_returning(&self) -> bool;

    /// Whether DDL participates in transactions.
    fn supports_transactional_ddl(&self) -> bool;

    /// Sentinel LIMIT injected when OFFSET is set without an explicit
    /// limit. Some dialects refuse OFFSET without LIMIT.
    fn max_limit(&self) -> i64 {
        i64::MAX
    }

    /// Substrings identifying constraint violations in this dialect's raw
    /// error text. The single source of truth for error classification.
    fn constraint_error_patterns(&self) -> &'static [&'static str];

    /// Inline literal rendering, used only by DDL default clauses.
    /// DML always carries values as positional arguments.
    fn literal(&self, value: &Value) -> String {
        default_literal(value)
    }
}

/// Literal forms shared by MySQL and SQLite; Postgres overrides booleans
/// and blobs.
pub(crate) fn default_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => {
            if *v {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        Value::Int(v) => v.to_string(),
        Value::Uint(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{b:02x}")).collect();
            format!("X'{hex}'")
        }
        Value::Time(v) => format!("'{v}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_round_trips_dialect() {
        for dialect in [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite] {
            assert_eq!(dialect.adapter().dialect(), dialect);
        }
    }

    #[test]
    fn text_literals_escape_quotes() {
        let adapter = Dialect::Sqlite.adapter();
        assert_eq!(adapter.literal(&Value::Text("it's".into())), "'it''s'");
    }

    #[test]
    fn bytes_literals_render_as_hex_blobs() {
        let adapter = Dialect::MySql.adapter();
        assert_eq!(adapter.literal(&Value::Bytes(vec![0xde, 0xad])), "X'dead'");
    }
}

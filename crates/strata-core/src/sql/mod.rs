//! Minimal statement builders: SELECT, INSERT, UPDATE, DELETE.
//!
//! These exist for the compiler, not for end users; callers never see SQL
//! text. All DML values travel as positional arguments through the dialect
//! adapter's placeholder style.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::{ColumnRef, FromItem, Join, SelectBuilder};
pub use update::{SetExpr, UpdateBuilder};

use crate::{dialect::DialectAdapter, value::Value};

///
/// Statement
///
/// Compiled SQL text plus its ordered positional arguments.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    #[must_use]
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// DDL helper: text only, no arguments.
    #[must_use]
    pub fn ddl(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

///
/// SqlWriter
///
/// Accumulates SQL text and arguments while tracking placeholder indexes.
///

pub(crate) struct SqlWriter<'a> {
    adapter: &'a dyn DialectAdapter,
    sql: String,
    args: Vec<Value>,
}

impl<'a> SqlWriter<'a> {
    pub(crate) fn new(adapter: &'a dyn DialectAdapter) -> Self {
        Self {
            adapter,
            sql: String::new(),
            args: Vec::new(),
        }
    }

    pub(crate) fn adapter(&self) -> &'a dyn DialectAdapter {
        self.adapter
    }

    pub(crate) fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub(crate) fn ident(&mut self, ident: &str) {
        let quoted = self.adapter.quote_ident(ident);
        self.sql.push_str(&quoted);
    }

    /// Write `qualifier`.`name`, or a bare name when unqualified.
    pub(crate) fn column(&mut self, qualifier: Option<&str>, name: &str) {
        if let Some(q) = qualifier {
            self.ident(q);
            self.sql.push('.');
        }
        self.ident(name);
    }

    /// Write the next positional placeholder and record its argument.
    pub(crate) fn arg(&mut self, value: Value) {
        self.args.push(value);
        let placeholder = self.adapter.placeholder(self.args.len());
        self.sql.push_str(&placeholder);
    }

    pub(crate) fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            args: self.args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn writer_numbers_postgres_placeholders() {
        let mut w = SqlWriter::new(Dialect::Postgres.adapter());
        w.push("SELECT ");
        w.arg(Value::Int(1));
        w.push(", ");
        w.arg(Value::Text("x".into()));
        let stmt = w.finish();
        assert_eq!(stmt.sql, "SELECT $1, $2");
        assert_eq!(stmt.args, vec![Value::Int(1), Value::Text("x".into())]);
    }

    #[test]
    fn qualified_columns_are_quoted_per_dialect() {
        let mut w = SqlWriter::new(Dialect::MySql.adapter());
        w.column(Some("users"), "id");
        assert_eq!(w.finish().sql, "`users`.`id`");
    }
}

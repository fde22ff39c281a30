use crate::{
    dialect::{Dialect, DialectAdapter},
    sql::{SqlWriter, Statement},
    value::Value,
};

///
/// InsertBuilder
///
/// Single- and multi-row INSERT. Batch inserts render one statement with a
/// VALUES tuple per row; row order is the positional-id contract for
/// RETURNING-based retrieval.
///

#[derive(Clone, Debug)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    returning: Option<String>,
    ignore_conflicts: bool,
}

impl InsertBuilder {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            returning: None,
            ignore_conflicts: false,
        }
    }

    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append one row. The value count must match the column count.
    #[must_use]
    pub fn values(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Request `RETURNING <column>` on dialects that support it; a no-op on
    /// the rest, where the driver's last-insert-id takes over.
    #[must_use]
    pub fn returning(mut self, column: impl Into<String>) -> Self {
        self.returning = Some(column.into());
        self
    }

    /// Duplicate-key rows are skipped instead of failing. Used by M2M edge
    /// linking where re-adding an existing edge is a no-op.
    #[must_use]
    pub const fn ignore_conflicts(mut self) -> Self {
        self.ignore_conflicts = true;
        self
    }

    #[must_use]
    pub fn build(&self, adapter: &dyn DialectAdapter) -> Statement {
        let mut w = SqlWriter::new(adapter);
        let mysql = adapter.dialect() == Dialect::MySql;
        if self.ignore_conflicts && mysql {
            w.push("INSERT IGNORE INTO ");
        } else {
            w.push("INSERT INTO ");
        }
        w.ident(&self.table);
        if self.columns.is_empty() {
            // A row of nothing but defaults.
            if mysql {
                w.push(" () VALUES ()");
            } else {
                w.push(" DEFAULT VALUES");
            }
        } else {
            w.push(" (");
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.ident(col);
            }
            w.push(") VALUES ");
            for (i, row) in self.rows.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push("(");
                for (j, value) in row.iter().enumerate() {
                    if j > 0 {
                        w.push(", ");
                    }
                    w.arg(value.clone());
                }
                w.push(")");
            }
        }
        if self.ignore_conflicts && !mysql {
            w.push(" ON CONFLICT DO NOTHING");
        }
        if let Some(col) = &self.returning
            && adapter.supports_returning()
        {
            w.push(" RETURNING ");
            w.ident(col);
        }
        w.finish()
    }
}

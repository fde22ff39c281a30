use crate::{
    dialect::DialectAdapter,
    spec::Predicate,
    sql::{SqlWriter, Statement},
    value::Value,
};

///
/// SetExpr
///
/// One column assignment inside an UPDATE.
///

#[derive(Clone, Debug, PartialEq)]
pub enum SetExpr {
    /// `col = ?`
    Value(Value),
    /// `col = NULL`
    Null,
    /// `col = COALESCE(col, 0) + ?`, numeric columns only.
    Add(Value),
}

///
/// UpdateBuilder
///

#[derive(Clone, Debug)]
pub struct UpdateBuilder {
    table: String,
    sets: Vec<(String, SetExpr)>,
    preds: Vec<Predicate>,
}

impl UpdateBuilder {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            sets: Vec::new(),
            preds: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.sets.push((column.into(), SetExpr::Value(value)));
        self
    }

    #[must_use]
    pub fn set_null(mut self, column: impl Into<String>) -> Self {
        self.sets.push((column.into(), SetExpr::Null));
        self
    }

    #[must_use]
    pub fn add(mut self, column: impl Into<String>, delta: Value) -> Self {
        self.sets.push((column.into(), SetExpr::Add(delta)));
        self
    }

    #[must_use]
    pub fn filter(mut self, pred: Predicate) -> Self {
        self.preds.push(pred);
        self
    }

    /// An UPDATE with no assignments is never sent to the driver.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    #[must_use]
    pub fn build(&self, adapter: &dyn DialectAdapter) -> Statement {
        let mut w = SqlWriter::new(adapter);
        w.push("UPDATE ");
        w.ident(&self.table);
        w.push(" SET ");
        for (i, (column, expr)) in self.sets.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.ident(column);
            match expr {
                SetExpr::Value(value) => {
                    w.push(" = ");
                    w.arg(value.clone());
                }
                SetExpr::Null => w.push(" = NULL"),
                SetExpr::Add(delta) => {
                    w.push(" = COALESCE(");
                    w.ident(column);
                    w.push(", 0) + ");
                    w.arg(delta.clone());
                }
            }
        }
        if let Some(pred) = Predicate::conjoin(self.preds.clone()) {
            w.push(" WHERE ");
            pred.render(&mut w, None);
        }
        w.finish()
    }
}

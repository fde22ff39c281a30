use crate::{
    sql::{SelectBuilder, SqlWriter},
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// Predicate
///
/// A filter tree over one table's columns. Conjunction order is preserved:
/// compiling `[a, b]` renders `a AND b` with arguments in that order.
///
/// Column names are unqualified; the builder qualifies them with the
/// selector's table when the query joins other tables.
///

#[derive(Clone, Debug)]
pub enum Predicate {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    Like(String, String),
    IsNull(String),
    NotNull(String),
    /// Membership in a correlated sub-select, used by edge traversals.
    InSelect(String, Box<SelectBuilder>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(column.into(), value.into())
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt(column.into(), value.into())
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(column.into(), value.into())
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(column.into(), value.into())
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte(column.into(), value.into())
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::NotIn(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like(column.into(), pattern.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self::NotNull(column.into())
    }

    pub fn in_select(column: impl Into<String>, query: SelectBuilder) -> Self {
        Self::InSelect(column.into(), Box::new(query))
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut preds) => {
                preds.push(other);
                Self::And(preds)
            }
            first => Self::And(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut preds) => {
                preds.push(other);
                Self::Or(preds)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Conjoin a list in order; `None` when the list is empty.
    #[must_use]
    pub fn conjoin(preds: Vec<Self>) -> Option<Self> {
        let mut iter = preds.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, Self::and))
    }

    pub(crate) fn render(&self, w: &mut SqlWriter<'_>, qualifier: Option<&str>) {
        match self {
            Self::Eq(col, Value::Null) | Self::IsNull(col) => {
                w.column(qualifier, col);
                w.push(" IS NULL");
            }
            Self::Ne(col, Value::Null) | Self::NotNull(col) => {
                w.column(qualifier, col);
                w.push(" IS NOT NULL");
            }
            Self::Eq(col, value) => Self::binary(w, qualifier, col, " = ", value),
            Self::Ne(col, value) => Self::binary(w, qualifier, col, " <> ", value),
            Self::Gt(col, value) => Self::binary(w, qualifier, col, " > ", value),
            Self::Gte(col, value) => Self::binary(w, qualifier, col, " >= ", value),
            Self::Lt(col, value) => Self::binary(w, qualifier, col, " < ", value),
            Self::Lte(col, value) => Self::binary(w, qualifier, col, " <= ", value),
            // An empty IN set matches nothing, an empty NOT IN everything.
            Self::In(_, values) if values.is_empty() => w.push("FALSE"),
            Self::NotIn(_, values) if values.is_empty() => w.push("TRUE"),
            Self::In(col, values) => Self::in_list(w, qualifier, col, values, false),
            Self::NotIn(col, values) => Self::in_list(w, qualifier, col, values, true),
            Self::Like(col, pattern) => {
                w.column(qualifier, col);
                w.push(" LIKE ");
                w.arg(Value::Text(pattern.clone()));
            }
            Self::InSelect(col, query) => {
                w.column(qualifier, col);
                w.push(" IN (");
                query.render(w);
                w.push(")");
            }
            Self::And(preds) => Self::composite(w, qualifier, preds, " AND "),
            Self::Or(preds) => Self::composite(w, qualifier, preds, " OR "),
            Self::Not(pred) => {
                w.push("NOT (");
                pred.render(w, qualifier);
                w.push(")");
            }
        }
    }

    fn binary(w: &mut SqlWriter<'_>, qualifier: Option<&str>, col: &str, op: &str, value: &Value) {
        w.column(qualifier, col);
        w.push(op);
        w.arg(value.clone());
    }

    fn in_list(
        w: &mut SqlWriter<'_>,
        qualifier: Option<&str>,
        col: &str,
        values: &[Value],
        negated: bool,
    ) {
        w.column(qualifier, col);
        w.push(if negated { " NOT IN (" } else { " IN (" });
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.arg(value.clone());
        }
        w.push(")");
    }

    fn composite(w: &mut SqlWriter<'_>, qualifier: Option<&str>, preds: &[Self], sep: &str) {
        if preds.is_empty() {
            w.push("TRUE");
            return;
        }
        for (i, pred) in preds.iter().enumerate() {
            if i > 0 {
                w.push(sep);
            }
            let grouped = matches!(pred, Self::And(_) | Self::Or(_));
            if grouped {
                w.push("(");
            }
            pred.render(w, qualifier);
            if grouped {
                w.push(")");
            }
        }
    }
}

///
/// OrderBy
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

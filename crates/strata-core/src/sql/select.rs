use crate::{
    spec::{Direction, OrderBy, Predicate},
    sql::{SqlWriter, Statement},
    value::Value,
};

///
/// ColumnRef
///
/// A possibly-qualified column reference inside a SELECT.
///

#[derive(Clone, Debug)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    fn render(&self, w: &mut SqlWriter<'_>) {
        w.column(self.qualifier.as_deref(), &self.name);
    }
}

///
/// FromItem
///

#[derive(Clone, Debug)]
pub enum FromItem {
    Table { name: String },
    Select { query: Box<SelectBuilder>, alias: String },
}

impl FromItem {
    /// The name other clauses use to qualify this item's columns.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        match self {
            Self::Table { name } => name,
            Self::Select { alias, .. } => alias,
        }
    }

    fn render(&self, w: &mut SqlWriter<'_>) {
        match self {
            Self::Table { name } => w.ident(name),
            Self::Select { query, alias } => {
                w.push("(");
                query.render(w);
                w.push(") AS ");
                w.ident(alias);
            }
        }
    }
}

///
/// Join
///

#[derive(Clone, Debug)]
pub struct Join {
    pub item: FromItem,
    pub on: (ColumnRef, ColumnRef),
}

///
/// Projection
///

#[derive(Clone, Debug, Default)]
enum Projection {
    /// `*`
    #[default]
    All,
    Columns(Vec<ColumnRef>),
    Count { distinct: bool, columns: Vec<ColumnRef> },
}

///
/// SelectBuilder
///
/// A composable SELECT. Traversal steps nest these as join sources and as
/// correlated `IN (...)` subqueries.
///

#[derive(Clone, Debug)]
pub struct SelectBuilder {
    from: FromItem,
    projection: Projection,
    distinct: bool,
    joins: Vec<Join>,
    preds: Vec<Predicate>,
    order: Vec<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectBuilder {
    #[must_use]
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            from: FromItem::Table { name: table.into() },
            projection: Projection::All,
            distinct: false,
            joins: Vec::new(),
            preds: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// The qualifier for this select's main table.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.from.qualifier()
    }

    /// Select unqualified columns of the main table. They are qualified at
    /// render time only when the query joins other tables.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let qualifier = self.from.qualifier().to_string();
        self.projection = Projection::Columns(
            columns
                .into_iter()
                .map(|name| ColumnRef {
                    qualifier: Some(qualifier.clone()),
                    name: name.into(),
                })
                .collect(),
        );
        self
    }

    /// Replace the projection with explicit column references.
    #[must_use]
    pub fn select_refs(mut self, columns: Vec<ColumnRef>) -> Self {
        self.projection = Projection::Columns(columns);
        self
    }

    /// Replace the projection with a COUNT aggregate.
    #[must_use]
    pub fn count(mut self, distinct: bool, columns: Vec<ColumnRef>) -> Self {
        self.projection = Projection::Count { distinct, columns };
        // DISTINCT moves inside the aggregate.
        self.distinct = false;
        self
    }

    #[must_use]
    pub const fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    #[must_use]
    pub fn join(mut self, item: FromItem, on_left: ColumnRef, on_right: ColumnRef) -> Self {
        self.joins.push(Join {
            item,
            on: (on_left, on_right),
        });
        self
    }

    /// Append a predicate; multiple calls conjoin in order.
    #[must_use]
    pub fn filter(mut self, pred: Predicate) -> Self {
        self.preds.push(pred);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    #[must_use]
    pub fn clear_order(mut self) -> Self {
        self.order.clear();
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub const fn has_limit(&self) -> bool {
        self.limit.is_some()
    }

    /// Render as a complete statement.
    #[must_use]
    pub fn build(&self, adapter: &dyn crate::dialect::DialectAdapter) -> Statement {
        let mut w = SqlWriter::new(adapter);
        self.render(&mut w);
        w.finish()
    }

    /// Render wrapped in `SELECT EXISTS (...)`.
    #[must_use]
    pub fn build_exists(&self, adapter: &dyn crate::dialect::DialectAdapter) -> Statement {
        let mut w = SqlWriter::new(adapter);
        w.push("SELECT EXISTS (");
        self.render(&mut w);
        w.push(")");
        w.finish()
    }

    /// Predicate columns are qualified only when the query joins other
    /// tables; bare names keep single-table SQL readable.
    fn pred_qualifier(&self) -> Option<&str> {
        if self.joins.is_empty() {
            None
        } else {
            Some(self.from.qualifier())
        }
    }

    pub(crate) fn render(&self, w: &mut SqlWriter<'_>) {
        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }
        match &self.projection {
            Projection::All => w.push("*"),
            Projection::Columns(columns) => {
                for (i, col) in columns.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    col.render(w);
                }
            }
            Projection::Count { distinct, columns } => {
                w.push("COUNT(");
                if columns.is_empty() {
                    w.push("*");
                } else {
                    if *distinct {
                        w.push("DISTINCT ");
                    }
                    for (i, col) in columns.iter().enumerate() {
                        if i > 0 {
                            w.push(", ");
                        }
                        col.render(w);
                    }
                }
                w.push(")");
            }
        }
        w.push(" FROM ");
        self.from.render(w);
        for join in &self.joins {
            w.push(" JOIN ");
            join.item.render(w);
            w.push(" ON ");
            join.on.0.render(w);
            w.push(" = ");
            join.on.1.render(w);
        }
        if let Some(pred) = Predicate::conjoin(self.preds.clone()) {
            w.push(" WHERE ");
            pred.render(w, self.pred_qualifier());
        }
        if !self.order.is_empty() {
            w.push(" ORDER BY ");
            let qualifier = self.pred_qualifier().map(ToString::to_string);
            for (i, order) in self.order.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.column(qualifier.as_deref(), &order.column);
                match order.direction {
                    Direction::Asc => w.push(" ASC"),
                    Direction::Desc => w.push(" DESC"),
                }
            }
        }
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }
    }
}

// Stop InSelect predicates from needing a manual PartialEq; equality on
// select trees is structural over the rendered form.
impl PartialEq for SelectBuilder {
    fn eq(&self, other: &Self) -> bool {
        let adapter = crate::dialect::Dialect::Sqlite.adapter();
        self.build(adapter) == other.build(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dialect::Dialect, value::Value};

    #[test]
    fn plain_select_stays_unqualified() {
        let stmt = SelectBuilder::from_table("users")
            .columns(["id", "name"])
            .filter(Predicate::gt("age", 21_i64))
            .order_by(OrderBy::desc("name"))
            .build(Dialect::Sqlite.adapter());
        assert_eq!(
            stmt.sql,
            "SELECT `users`.`id`, `users`.`name` FROM `users` WHERE `age` > ? \
             ORDER BY `name` DESC"
        );
        assert_eq!(stmt.args, vec![Value::Int(21)]);
    }

    #[test]
    fn join_on_subquery_aliases_and_qualifies() {
        let sub = SelectBuilder::from_table("pets")
            .select_refs(vec![ColumnRef::qualified("pets", "owner_id")])
            .filter(Predicate::eq("id", 7_i64));
        let stmt = SelectBuilder::from_table("users")
            .columns(["id"])
            .join(
                FromItem::Select {
                    query: Box::new(sub),
                    alias: "t1".to_string(),
                },
                ColumnRef::qualified("users", "id"),
                ColumnRef::qualified("t1", "owner_id"),
            )
            .build(Dialect::Postgres.adapter());
        assert_eq!(
            stmt.sql,
            "SELECT \"users\".\"id\" FROM \"users\" JOIN \
             (SELECT \"pets\".\"owner_id\" FROM \"pets\" WHERE \"id\" = $1) AS \"t1\" \
             ON \"users\".\"id\" = \"t1\".\"owner_id\""
        );
        assert_eq!(stmt.args, vec![Value::Int(7)]);
    }

    #[test]
    fn count_folds_distinct_into_the_aggregate() {
        let stmt = SelectBuilder::from_table("users")
            .distinct(true)
            .count(true, vec![ColumnRef::bare("id")])
            .build(Dialect::Sqlite.adapter());
        assert_eq!(stmt.sql, "SELECT COUNT(DISTINCT `id`) FROM `users`");
    }
}

use crate::{
    dialect::DialectAdapter,
    spec::Predicate,
    sql::{SqlWriter, Statement},
};

///
/// DeleteBuilder
///
/// DELETE with conjoined predicates. Cascade behavior belongs to the
/// schema's foreign keys, never to this statement.
///

#[derive(Clone, Debug)]
pub struct DeleteBuilder {
    table: String,
    preds: Vec<Predicate>,
}

impl DeleteBuilder {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            preds: Vec::new(),
        }
    }

    #[must_use]
    pub fn filter(mut self, pred: Predicate) -> Self {
        self.preds.push(pred);
        self
    }

    #[must_use]
    pub fn build(&self, adapter: &dyn DialectAdapter) -> Statement {
        let mut w = SqlWriter::new(adapter);
        w.push("DELETE FROM ");
        w.ident(&self.table);
        if let Some(pred) = Predicate::conjoin(self.preds.clone()) {
            w.push(" WHERE ");
            pred.render(&mut w, None);
        }
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dialect::Dialect, value::Value};

    #[test]
    fn delete_conjoins_predicates() {
        let stmt = DeleteBuilder::new("pets")
            .filter(Predicate::eq("owner_id", 1_i64))
            .filter(Predicate::is_null("name"))
            .build(Dialect::Postgres.adapter());
        assert_eq!(
            stmt.sql,
            "DELETE FROM \"pets\" WHERE \"owner_id\" = $1 AND \"name\" IS NULL"
        );
        assert_eq!(stmt.args, vec![Value::Int(1)]);
    }

    #[test]
    fn bare_delete_has_no_where() {
        let stmt = DeleteBuilder::new("pets").build(Dialect::Sqlite.adapter());
        assert_eq!(stmt.sql, "DELETE FROM `pets`");
    }
}

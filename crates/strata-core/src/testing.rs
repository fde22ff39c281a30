//! Test support: a scripted in-memory driver.
//!
//! Execution-layer tests care about the exact statements an operation
//! sends and how it reacts to the results, not about a real database. The
//! scripted driver replays canned replies in order and records everything
//! it was asked to run.

use crate::{
    dialect::Dialect,
    driver::{Context, Driver, ExecResult, Rows},
    error::DriverError,
    sql::Statement,
    value::Value,
};
use std::collections::VecDeque;

///
/// Reply
///

#[derive(Clone, Debug)]
enum Reply {
    Exec(ExecResult),
    Rows(Rows),
    Fail(String),
}

///
/// ScriptedDriver
///
/// Replies are consumed in the order they were scripted; a query against
/// an exec reply (or an exhausted script) fails the statement, which makes
/// plan mismatches visible as test failures.
///

#[derive(Debug)]
pub struct ScriptedDriver {
    dialect: Dialect,
    replies: VecDeque<Reply>,
    log: Vec<Statement>,
    begun: usize,
    committed: usize,
    rolled_back: usize,
}

impl ScriptedDriver {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            replies: VecDeque::new(),
            log: Vec::new(),
            begun: 0,
            committed: 0,
            rolled_back: 0,
        }
    }

    /// Script an exec reply with an affected-row count.
    #[must_use]
    pub fn reply_exec(mut self, rows_affected: u64) -> Self {
        self.replies.push_back(Reply::Exec(ExecResult {
            rows_affected,
            last_insert_id: None,
        }));
        self
    }

    /// Script an exec reply carrying a last-insert id.
    #[must_use]
    pub fn reply_exec_with_id(mut self, rows_affected: u64, last_insert_id: i64) -> Self {
        self.replies.push_back(Reply::Exec(ExecResult {
            rows_affected,
            last_insert_id: Some(last_insert_id),
        }));
        self
    }

    /// Script a result set.
    #[must_use]
    pub fn reply_rows(mut self, rows: Rows) -> Self {
        self.replies.push_back(Reply::Rows(rows));
        self
    }

    /// Script a one-column result set, as produced by `RETURNING id`.
    #[must_use]
    pub fn reply_ids(self, ids: Vec<Value>) -> Self {
        self.reply_rows(Rows {
            columns: vec!["id".to_string()],
            values: ids.into_iter().map(|id| vec![id]).collect(),
        })
    }

    /// Script a single-scalar result set.
    #[must_use]
    pub fn reply_scalar(self, value: impl Into<Value>) -> Self {
        self.reply_rows(Rows {
            columns: vec!["value".to_string()],
            values: vec![vec![value.into()]],
        })
    }

    /// Script a statement failure with the given error text.
    #[must_use]
    pub fn reply_error(mut self, message: impl Into<String>) -> Self {
        self.replies.push_back(Reply::Fail(message.into()));
        self
    }

    /// The SQL text of the i-th recorded statement.
    #[must_use]
    pub fn statement(&self, i: usize) -> &str {
        &self.log[i].sql
    }

    /// The arguments of the i-th recorded statement.
    #[must_use]
    pub fn args(&self, i: usize) -> Vec<Value> {
        self.log[i].args.clone()
    }

    #[must_use]
    pub fn statements(&self) -> usize {
        self.log.len()
    }

    #[must_use]
    pub fn committed(&self) -> bool {
        self.committed > 0
    }

    #[must_use]
    pub fn rolled_back(&self) -> bool {
        self.rolled_back > 0
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.begun > self.committed + self.rolled_back
    }

    fn next_reply(&mut self, stmt: &Statement) -> Result<Reply, DriverError> {
        self.log.push(stmt.clone());
        self.replies
            .pop_front()
            .ok_or_else(|| DriverError::from(format!("unscripted statement: {}", stmt.sql)))
    }
}

impl Driver for ScriptedDriver {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn exec(&mut self, _ctx: &Context, stmt: &Statement) -> Result<ExecResult, DriverError> {
        match self.next_reply(stmt)? {
            Reply::Exec(result) => Ok(result),
            Reply::Rows(_) => Err(format!("scripted rows for exec: {}", stmt.sql).into()),
            Reply::Fail(message) => Err(message.into()),
        }
    }

    fn query(&mut self, _ctx: &Context, stmt: &Statement) -> Result<Rows, DriverError> {
        match self.next_reply(stmt)? {
            Reply::Rows(rows) => Ok(rows),
            Reply::Exec(_) => Err(format!("scripted exec for query: {}", stmt.sql).into()),
            Reply::Fail(message) => Err(message.into()),
        }
    }

    fn begin(&mut self, _ctx: &Context) -> Result<(), DriverError> {
        self.begun += 1;
        Ok(())
    }

    fn commit(&mut self, _ctx: &Context) -> Result<(), DriverError> {
        self.committed += 1;
        Ok(())
    }

    fn rollback(&mut self, _ctx: &Context) -> Result<(), DriverError> {
        self.rolled_back += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_consumed_in_order() {
        let ctx = Context::background();
        let mut driver = ScriptedDriver::new(Dialect::Sqlite)
            .reply_exec(1)
            .reply_scalar(42_i64);
        let stmt = Statement::new("UPDATE t SET x = 1", Vec::new());
        let result = driver.exec(&ctx, &stmt).expect("exec");
        assert_eq!(result.rows_affected, 1);

        let rows = driver
            .query(&ctx, &Statement::new("SELECT 42", Vec::new()))
            .expect("query");
        assert_eq!(rows.scalar(), Some(&Value::Int(42)));
        assert_eq!(driver.statements(), 2);
    }

    #[test]
    fn exhausted_script_fails_the_statement() {
        let mut driver = ScriptedDriver::new(Dialect::Sqlite);
        let err = driver
            .exec(&Context::background(), &Statement::new("DELETE FROM t", Vec::new()))
            .unwrap_err();
        assert!(err.to_string().contains("unscripted"));
    }
}

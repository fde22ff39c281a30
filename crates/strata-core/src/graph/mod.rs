//! The graph compiler: turns declarative specs into dialect-specific SQL
//! and drives the multi-statement execution plans for mutations.
//!
//! Compilation is deterministic: the same spec and dialect always produce
//! the same SQL text and the same argument order. Execution goes through
//! the [`Driver`](crate::driver::Driver) trait and never assumes a
//! concrete database client.

mod create;
mod delete;
mod query;
mod update;

pub use create::{batch_create, compile_batch_create, compile_create, create_node};
pub use delete::{compile_delete, delete_nodes};
pub use query::{
    compile_count, compile_exists, compile_query, count_nodes, exists_nodes, query_node,
    query_nodes,
};
pub use update::{compile_update, update_node, update_nodes};

use crate::{
    dialect::DialectAdapter,
    driver::{Context, Driver, ExecResult, Rows},
    error::{ConstraintError, Error, ValidationError},
    spec::Predicate,
    sql::Statement,
};

/// Bracket a multi-statement plan in a transaction, rolling back on the
/// first failure. The rollback error is dropped: the original failure is
/// the one the caller needs.
pub(crate) fn with_txn<T>(
    ctx: &Context,
    driver: &mut dyn Driver,
    f: impl FnOnce(&mut dyn Driver) -> Result<T, Error>,
) -> Result<T, Error> {
    driver.begin(ctx).map_err(Error::Driver)?;
    match f(driver) {
        Ok(value) => {
            driver.commit(ctx).map_err(Error::Driver)?;
            Ok(value)
        }
        Err(err) => {
            let _ = driver.rollback(ctx);
            Err(err)
        }
    }
}

/// Execute a mutation statement, reclassifying constraint violations.
pub(crate) fn run_exec(
    ctx: &Context,
    driver: &mut dyn Driver,
    stmt: &Statement,
) -> Result<ExecResult, Error> {
    if ctx.is_canceled() {
        return Err(Error::Canceled);
    }
    tracing::debug!(sql = %stmt.sql, args = stmt.args.len(), "exec");
    let adapter = driver.dialect().adapter();
    driver
        .exec(ctx, stmt)
        .map_err(|err| crate::error::classify(adapter, err))
}

/// Execute a read statement. Reads pass driver errors through unchanged.
pub(crate) fn run_query(
    ctx: &Context,
    driver: &mut dyn Driver,
    stmt: &Statement,
) -> Result<Rows, Error> {
    if ctx.is_canceled() {
        return Err(Error::Canceled);
    }
    tracing::debug!(sql = %stmt.sql, args = stmt.args.len(), "query");
    driver.query(ctx, stmt).map_err(Error::Driver)
}

/// A constraint failure detected by the executor itself, without a driver
/// error to wrap: a foreign-key edge UPDATE touched fewer rows than it
/// had targets, meaning some target was missing or already linked.
pub(crate) fn edge_constraint(adapter: &dyn DialectAdapter, message: String) -> Error {
    Error::Constraint(ConstraintError {
        dialect: adapter.dialect(),
        source: message.into(),
    })
}

/// Columns referenced by a predicate tree, in render order. Subquery
/// internals are excluded; only the outer membership column counts.
pub(crate) fn predicate_columns<'a>(pred: &'a Predicate, out: &mut Vec<&'a str>) {
    match pred {
        Predicate::Eq(col, _)
        | Predicate::Ne(col, _)
        | Predicate::Gt(col, _)
        | Predicate::Gte(col, _)
        | Predicate::Lt(col, _)
        | Predicate::Lte(col, _)
        | Predicate::In(col, _)
        | Predicate::NotIn(col, _)
        | Predicate::Like(col, _)
        | Predicate::IsNull(col)
        | Predicate::NotNull(col)
        | Predicate::InSelect(col, _) => out.push(col),
        Predicate::And(preds) | Predicate::Or(preds) => {
            for pred in preds {
                predicate_columns(pred, out);
            }
        }
        Predicate::Not(pred) => predicate_columns(pred, out),
    }
}

/// Reject predicate and order columns the node does not declare.
pub(crate) fn check_columns<'a>(
    table: &str,
    declared: &[String],
    used: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    for column in used {
        if !declared.iter().any(|c| c == column) {
            return Err(ValidationError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

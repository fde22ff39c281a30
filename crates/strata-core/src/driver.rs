//! Driver capability interface, consumed, never implemented here.
//!
//! The wire protocol belongs to the embedding application; the compiler and
//! migration executor only need "execute this statement, give me rows or an
//! affected count".

use crate::{error::DriverError, sql::Statement, value::Value};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

///
/// Context
///
/// Cancellation token threaded through every compile/apply operation.
/// Cancellation before a statement is sent aborts cleanly; cancellation
/// after a statement is sent is an unknown outcome the caller must resolve
/// by re-querying, never by assuming failure.
///

#[derive(Clone, Debug, Default)]
pub struct Context {
    canceled: Arc<AtomicBool>,
}

impl Context {
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

///
/// ExecResult
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Set by dialects with `LAST_INSERT_ID` semantics.
    pub last_insert_id: Option<i64>,
}

///
/// Rows
///
/// A materialized result set. Column order matches the SELECT list, and the
/// scan hooks passed to the executors must agree positionally with it.
///

#[derive(Clone, Debug, Default)]
pub struct Rows {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Value>>,
}

impl Rows {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Scan a single scalar from the first row and column.
    #[must_use]
    pub fn scalar(&self) -> Option<&Value> {
        self.values.first().and_then(|row| row.first())
    }
}

///
/// Driver
///
/// The executable surface of one database connection. `begin`, `commit`,
/// and `rollback` bracket multi-statement graph mutations; drivers without
/// nested transactions may treat re-entrant calls as savepoints or errors,
/// that policy is theirs.
///

pub trait Driver {
    fn dialect(&self) -> crate::dialect::Dialect;

    fn exec(&mut self, ctx: &Context, stmt: &Statement) -> Result<ExecResult, DriverError>;

    fn query(&mut self, ctx: &Context, stmt: &Statement) -> Result<Rows, DriverError>;

    fn begin(&mut self, ctx: &Context) -> Result<(), DriverError>;

    fn commit(&mut self, ctx: &Context) -> Result<(), DriverError>;

    fn rollback(&mut self, ctx: &Context) -> Result<(), DriverError>;
}

//! Executes a [`ChangeSet`] against a live database.
//!
//! Rendering happens up front, so an unsupported change fails before any
//! DDL runs. Dialects with transactional DDL apply the whole set
//! atomically; MySQL applies sequentially and reports partial progress on
//! failure.

mod ddl;
mod inspect;

pub use inspect::Inspector;

use crate::{
    diff::{Change, ChangeSet, DiffOptions, diff},
    error::MigrateError,
    model::Schema,
};
use std::collections::BTreeSet;
use strata_core::{
    driver::{Context, Driver},
    sql::Statement,
};

///
/// Migrator
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Migrator {
    options: DiffOptions,
}

impl Migrator {
    #[must_use]
    pub const fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Render and execute a change set in emission order.
    pub fn apply(
        &self,
        ctx: &Context,
        driver: &mut dyn Driver,
        set: &ChangeSet,
    ) -> Result<(), MigrateError> {
        if set.is_empty() {
            return Ok(());
        }
        let adapter = driver.dialect().adapter();

        // Constraint changes on tables this set itself creates or drops
        // may be folded into the table statement by the renderer.
        let mut added = BTreeSet::new();
        let mut dropped = BTreeSet::new();
        for change in set {
            match change {
                Change::AddTable { table } => {
                    added.insert(table.name.as_str());
                }
                Change::DropTable { table } => {
                    dropped.insert(table.as_str());
                }
                _ => {}
            }
        }

        // Render everything first: Unsupported must fail with nothing
        // executed.
        let mut plan: Vec<(usize, Statement)> = Vec::with_capacity(set.len());
        for (index, change) in set.iter().enumerate() {
            if ddl::subsumed(adapter.dialect(), change, &added, &dropped) {
                continue;
            }
            tracing::debug!(change = %change.describe(), "migrate");
            for stmt in ddl::render(adapter, change)? {
                plan.push((index, stmt));
            }
        }

        if adapter.supports_transactional_ddl() {
            self.apply_atomic(ctx, driver, &plan)
        } else {
            self.apply_sequential(ctx, driver, &plan, set.len())
        }
    }

    /// Inspect the live schema, diff, and apply; returns the change set
    /// that was applied.
    pub fn sync(
        &self,
        ctx: &Context,
        driver: &mut dyn Driver,
        inspector: &mut dyn Inspector,
        desired: &Schema,
    ) -> Result<ChangeSet, MigrateError> {
        let live = inspector.describe(ctx, driver).map_err(MigrateError::Apply)?;
        let set = diff(desired, &live, &self.options)?;
        self.apply(ctx, driver, &set)?;
        Ok(set)
    }

    fn apply_atomic(
        &self,
        ctx: &Context,
        driver: &mut dyn Driver,
        plan: &[(usize, Statement)],
    ) -> Result<(), MigrateError> {
        driver.begin(ctx).map_err(MigrateError::Apply)?;
        for (_, stmt) in plan {
            if ctx.is_canceled() {
                let _ = driver.rollback(ctx);
                return Err(MigrateError::Canceled);
            }
            if let Err(source) = driver.exec(ctx, stmt) {
                let _ = driver.rollback(ctx);
                return Err(MigrateError::Apply(source));
            }
        }
        driver.commit(ctx).map_err(MigrateError::Apply)
    }

    /// No transactional DDL: execute one statement at a time and report
    /// exactly how far we got on failure.
    fn apply_sequential(
        &self,
        ctx: &Context,
        driver: &mut dyn Driver,
        plan: &[(usize, Statement)],
        total: usize,
    ) -> Result<(), MigrateError> {
        let mut applied = 0;
        for (index, stmt) in plan {
            if ctx.is_canceled() {
                return Err(MigrateError::Canceled);
            }
            if let Err(source) = driver.exec(ctx, stmt) {
                return Err(MigrateError::Partial {
                    applied,
                    total,
                    index: *index,
                    source,
                });
            }
            applied = *index + 1;
        }
        Ok(())
    }
}

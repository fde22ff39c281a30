//! Declarative schema model, structural differ, and migration executor.
//!
//! The desired schema is described as plain data ([`model::Schema`]),
//! compared against the live one ([`diff::diff`]), and the resulting
//! ordered [`diff::ChangeSet`] is rendered to dialect DDL and executed
//! ([`migrate::Migrator`]). Diffing is pure; only `apply` touches a
//! driver.

pub mod diff;
pub mod error;
pub mod migrate;
pub mod model;

pub mod prelude {
    pub use crate::{
        diff::{Change, ChangeSet, DiffOptions, diff},
        error::{MigrateError, SchemaError},
        migrate::{Inspector, Migrator},
        model::{Column, ForeignKey, Index, ReferenceAction, Schema, Table},
    };
}

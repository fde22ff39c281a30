use crate::model::{Column, ForeignKey, Index, Table};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use strata_core::value::Value;

///
/// Change
///
/// One schema change, carrying everything its DDL rendering needs. The
/// differ emits changes in a dependency-safe order; renderers and
/// [`apply_to_model`](crate::diff::apply_to_model) preserve it.
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Change {
    AddColumn {
        table: String,
        column: Column,
        /// Value written into existing rows when the column is NOT NULL
        /// and declares no default of its own.
        backfill: Option<Value>,
    },
    AddForeignKey {
        table: String,
        fk: ForeignKey,
    },
    AddIndex {
        table: String,
        index: Index,
    },
    /// Columns, primary key, and foreign keys; indexes follow as separate
    /// changes. Foreign keys also trail as AddForeignKey entries for
    /// dialects that constrain after creation, while SQLite inlines them
    /// into the CREATE TABLE.
    AddTable {
        table: Table,
    },
    AlterColumnType {
        table: String,
        from: Column,
        to: Column,
    },
    DropColumn {
        table: String,
        column: String,
    },
    DropForeignKey {
        table: String,
        symbol: String,
    },
    DropIndex {
        table: String,
        index: String,
    },
    DropTable {
        table: String,
    },
}

impl Change {
    /// Destructive changes lose data when applied. The differ only emits
    /// them behind the corresponding [`DiffOptions`](crate::diff::DiffOptions)
    /// gate, and callers may still refuse them.
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        matches!(self, Self::DropColumn { .. } | Self::DropTable { .. })
    }

    /// Short description for logs and error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::AddColumn { table, column, .. } => {
                format!("add column {table}.{}", column.name)
            }
            Self::AddForeignKey { table, fk } => {
                format!("add foreign key {} on {table}", fk.symbol)
            }
            Self::AddIndex { table, index } => format!("add index {} on {table}", index.name),
            Self::AddTable { table } => format!("add table {}", table.name),
            Self::AlterColumnType { table, to, .. } => {
                format!("alter column {table}.{}", to.name)
            }
            Self::DropColumn { table, column } => format!("drop column {table}.{column}"),
            Self::DropForeignKey { table, symbol } => {
                format!("drop foreign key {symbol} on {table}")
            }
            Self::DropIndex { table, index } => format!("drop index {index} on {table}"),
            Self::DropTable { table } => format!("drop table {table}"),
        }
    }
}

///
/// ChangeSet
///
/// An ordered list of changes. Order is semantic: constraint drops come
/// before the drops they unblock, and foreign keys are added only after
/// every referenced table exists.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, Deserialize, Serialize)]
pub struct ChangeSet(Vec<Change>);

impl ChangeSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, change: Change) {
        self.0.push(change);
    }

    pub fn extend(&mut self, changes: impl IntoIterator<Item = Change>) {
        self.0.extend(changes);
    }

    #[must_use]
    pub fn destructive_count(&self) -> usize {
        self.0.iter().filter(|c| c.is_destructive()).count()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! The declarative schema model: plain data describing tables, columns,
//! indexes, and foreign keys, independent of any dialect.

mod convert;
mod validate;

pub(crate) use convert::{Convertibility, convertible};
pub use validate::validate;

use serde::{Deserialize, Serialize};
use strata_core::{
    dialect::{Dialect, DialectAdapter},
    value::{FieldType, Value},
};
use std::collections::BTreeMap;

///
/// Schema
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    #[must_use]
    pub const fn new() -> Self {
        Self { tables: Vec::new() }
    }

    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub(crate) fn find_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }
}

///
/// Table
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    /// Whether `columns` is this table's primary key or a single unique
    /// column. Foreign keys may only reference such column sets.
    #[must_use]
    pub fn is_identifying(&self, columns: &[String]) -> bool {
        if self.primary_key == columns {
            return true;
        }
        match columns {
            [only] => self.find_column(only).is_some_and(|c| c.unique),
            _ => false,
        }
    }
}

///
/// Column
///

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Column {
    pub name: String,
    pub ty: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub unique: bool,

    /// Auto-increment identifier column.
    #[serde(default)]
    pub increment: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Per-dialect raw type overrides, taking precedence over
    /// [`DialectAdapter::type_for`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub type_overrides: BTreeMap<Dialect, String>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            size: None,
            nullable: false,
            unique: false,
            increment: false,
            default: None,
            type_overrides: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn increment(mut self) -> Self {
        self.increment = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn override_type(mut self, dialect: Dialect, raw: impl Into<String>) -> Self {
        self.type_overrides.insert(dialect, raw.into());
        self
    }

    /// The dialect column type, honoring any override.
    #[must_use]
    pub fn type_for(&self, adapter: &dyn DialectAdapter) -> String {
        self.type_overrides
            .get(&adapter.dialect())
            .cloned()
            .unwrap_or_else(|| adapter.type_for(self.ty, self.size))
    }

    /// Structural identity for diffing: everything that affects the
    /// rendered column definition.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.size == other.size
            && self.nullable == other.nullable
            && self.type_overrides == other.type_overrides
    }
}

///
/// Index
///

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,

    /// Per-column prefix lengths (MySQL long-string indexes).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prefixes: BTreeMap<String, u64>,
}

impl Index {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            unique: false,
            columns: columns.into_iter().map(Into::into).collect(),
            prefixes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn prefix(mut self, column: impl Into<String>, length: u64) -> Self {
        self.prefixes.insert(column.into(), length);
        self
    }
}

///
/// ReferenceAction
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum ReferenceAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferenceAction {
    /// The SQL keyword form.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

///
/// ForeignKey
///
/// The symbol is the constraint's identity across diffs: a foreign key
/// whose target or action changed is dropped and re-added under the same
/// symbol.
///

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ForeignKey {
    pub symbol: String,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_delete: ReferenceAction,
}

impl ForeignKey {
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        columns: Vec<String>,
        ref_table: impl Into<String>,
        ref_columns: Vec<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            columns,
            ref_table: ref_table.into(),
            ref_columns,
            on_delete: ReferenceAction::NoAction,
        }
    }

    #[must_use]
    pub const fn on_delete(mut self, action: ReferenceAction) -> Self {
        self.on_delete = action;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_override_beats_the_adapter_mapping() {
        let col = Column::new("meta", FieldType::String)
            .override_type(Dialect::Postgres, "jsonb");
        assert_eq!(col.type_for(Dialect::Postgres.adapter()), "jsonb");
        assert_ne!(col.type_for(Dialect::MySql.adapter()), "jsonb");
    }

    #[test]
    fn fk_may_reference_pk_or_unique_column() {
        let users = Table::new("users")
            .column(Column::new("id", FieldType::I64).increment())
            .column(Column::new("email", FieldType::String).unique())
            .column(Column::new("name", FieldType::String))
            .primary_key(["id"]);
        assert!(users.is_identifying(&["id".to_string()]));
        assert!(users.is_identifying(&["email".to_string()]));
        assert!(!users.is_identifying(&["name".to_string()]));
    }

    #[test]
    fn schema_round_trips_through_serde() {
        let schema = Schema::new().table(
            Table::new("users")
                .column(Column::new("id", FieldType::I64).increment())
                .primary_key(["id"])
                .index(Index::new("users_email", ["email"]).unique()),
        );
        let json = serde_json::to_string(&schema).expect("serialize");
        let back: Schema = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.tables[0].indexes[0].name, "users_email");
    }
}

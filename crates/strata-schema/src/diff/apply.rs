use crate::{
    diff::{Change, ChangeSet},
    model::Schema,
};

/// Apply a change set to an in-memory schema, yielding the schema the
/// database would hold after a successful migration.
///
/// This is the pure half of the executor, used for planning and for the
/// idempotence check: diffing the desired schema against the applied
/// model yields an empty set.
#[must_use]
pub fn apply_to_model(live: &Schema, set: &ChangeSet) -> Schema {
    let mut schema = live.clone();
    for change in set {
        match change {
            Change::AddTable { table } => schema.tables.push(table.clone()),
            Change::DropTable { table } => schema.tables.retain(|t| &t.name != table),
            Change::AddColumn { table, column, .. } => {
                if let Some(t) = schema.find_table_mut(table) {
                    t.columns.push(column.clone());
                }
            }
            Change::DropColumn { table, column } => {
                if let Some(t) = schema.find_table_mut(table) {
                    t.columns.retain(|c| &c.name != column);
                }
            }
            Change::AlterColumnType { table, to, .. } => {
                if let Some(col) = schema
                    .find_table_mut(table)
                    .and_then(|t| t.columns.iter_mut().find(|c| c.name == to.name))
                {
                    *col = to.clone();
                }
            }
            Change::AddIndex { table, index } => {
                if let Some(t) = schema.find_table_mut(table) {
                    t.indexes.push(index.clone());
                }
            }
            Change::DropIndex { table, index } => {
                if let Some(t) = schema.find_table_mut(table) {
                    t.indexes.retain(|i| &i.name != index);
                }
            }
            // The AddTable shell may already carry this constraint.
            Change::AddForeignKey { table, fk } => {
                if let Some(t) = schema.find_table_mut(table)
                    && t.foreign_keys.iter().all(|f| f.symbol != fk.symbol)
                {
                    t.foreign_keys.push(fk.clone());
                }
            }
            Change::DropForeignKey { table, symbol } => {
                if let Some(t) = schema.find_table_mut(table) {
                    t.foreign_keys.retain(|f| &f.symbol != symbol);
                }
            }
        }
    }
    schema
}

use crate::{error::SchemaError, model::Schema};
use std::collections::BTreeSet;

/// Check a schema's structural invariants before it is diffed or applied.
///
/// Every index and foreign-key column must exist on its table, and every
/// foreign key must point at the referenced table's primary key or a
/// unique column.
pub fn validate(schema: &Schema) -> Result<(), SchemaError> {
    let mut names = BTreeSet::new();
    for table in &schema.tables {
        if !names.insert(table.name.as_str()) {
            return Err(SchemaError::DuplicateTable {
                table: table.name.clone(),
            });
        }
        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        for index in &table.indexes {
            for column in index.columns.iter().chain(index.prefixes.keys()) {
                if !table.has_column(column) {
                    return Err(SchemaError::IndexColumn {
                        table: table.name.clone(),
                        index: index.name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
        for fk in &table.foreign_keys {
            if fk.columns.len() != fk.ref_columns.len() || fk.columns.is_empty() {
                return Err(SchemaError::FkArity {
                    table: table.name.clone(),
                    symbol: fk.symbol.clone(),
                });
            }
            for column in &fk.columns {
                if !table.has_column(column) {
                    return Err(SchemaError::FkColumn {
                        table: table.name.clone(),
                        symbol: fk.symbol.clone(),
                        column: column.clone(),
                    });
                }
            }
            let Some(referenced) = schema.find_table(&fk.ref_table) else {
                return Err(SchemaError::UnknownRefTable {
                    table: table.name.clone(),
                    symbol: fk.symbol.clone(),
                    ref_table: fk.ref_table.clone(),
                });
            };
            if !referenced.is_identifying(&fk.ref_columns) {
                return Err(SchemaError::BadReference {
                    table: table.name.clone(),
                    symbol: fk.symbol.clone(),
                    ref_table: fk.ref_table.clone(),
                });
            }
        }
    }
    Ok(())
}

//! Structural schema diffing: desired versus live, producing an ordered
//! [`ChangeSet`].
//!
//! Emission order is fixed in dependency-safe phases: foreign-key drops,
//! index drops, column changes, table drops, table adds (topologically
//! ordered by foreign-key dependency), index adds, foreign-key adds.

mod apply;
mod change;

pub use apply::apply_to_model;
pub use change::{Change, ChangeSet};

use crate::{
    error::SchemaError,
    model::{Column, Convertibility, Schema, Table, convertible, validate},
};
use std::collections::BTreeSet;

///
/// DiffOptions
///
/// Destructive and lossy changes are opt-in; with everything off the diff
/// is purely additive.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DiffOptions {
    /// Emit DropColumn for live columns absent from the desired schema.
    pub drop_columns: bool,
    /// Emit DropTable (and the unblocking foreign-key drops) for live
    /// tables absent from the desired schema.
    pub drop_tables: bool,
    /// Permit lossy column conversions (size or width shrink, sign loss).
    pub allow_narrowing: bool,
}

impl DiffOptions {
    /// Everything enabled; the live schema is made to match exactly.
    #[must_use]
    pub const fn force() -> Self {
        Self {
            drop_columns: true,
            drop_tables: true,
            allow_narrowing: true,
        }
    }
}

/// Compute the ordered changes that turn `live` into `desired`.
pub fn diff(desired: &Schema, live: &Schema, opts: &DiffOptions) -> Result<ChangeSet, SchemaError> {
    validate(desired)?;
    validate(live)?;

    let mut drop_fks = Vec::new();
    let mut drop_indexes = Vec::new();
    let mut columns = Vec::new();
    let mut drop_tables = Vec::new();
    let mut add_indexes = Vec::new();
    let mut add_fks = Vec::new();

    // Tables leaving the schema. Every foreign key that references one,
    // wherever it lives, must drop before the table does.
    let mut dropped: BTreeSet<&str> = BTreeSet::new();
    if opts.drop_tables {
        for table in &live.tables {
            if desired.find_table(&table.name).is_none() {
                dropped.insert(&table.name);
                drop_tables.push(Change::DropTable {
                    table: table.name.clone(),
                });
            }
        }
        for table in &live.tables {
            for fk in &table.foreign_keys {
                if dropped.contains(table.name.as_str())
                    || dropped.contains(fk.ref_table.as_str())
                {
                    drop_fks.push(Change::DropForeignKey {
                        table: table.name.clone(),
                        symbol: fk.symbol.clone(),
                    });
                }
            }
        }
    }

    // Tables present on both sides.
    for table in &desired.tables {
        let Some(existing) = live.find_table(&table.name) else {
            continue;
        };
        diff_columns(table, existing, opts, &mut columns, &mut drop_fks)?;
        diff_indexes(table, existing, &mut drop_indexes, &mut add_indexes);
        diff_fks(table, existing, &mut drop_fks, &mut add_fks);
    }

    // New tables, dependency-free first. The AddTable change keeps the
    // table's foreign keys so renderers that can only inline them at
    // creation have them; the trailing AddForeignKey entries serve the
    // dialects that constrain after creation. Indexes always trail.
    let mut add_tables = Vec::new();
    for table in sort_new_tables(desired, live) {
        let mut shell = table.clone();
        shell.indexes.clear();
        add_tables.push(Change::AddTable { table: shell });
        for index in &table.indexes {
            add_indexes.push(Change::AddIndex {
                table: table.name.clone(),
                index: index.clone(),
            });
        }
        for fk in &table.foreign_keys {
            add_fks.push(Change::AddForeignKey {
                table: table.name.clone(),
                fk: fk.clone(),
            });
        }
    }

    let mut set = ChangeSet::new();
    set.extend(dedup_fk_drops(drop_fks));
    set.extend(drop_indexes);
    set.extend(columns);
    set.extend(drop_tables);
    set.extend(add_tables);
    set.extend(add_indexes);
    set.extend(add_fks);
    tracing::debug!(changes = set.len(), destructive = set.destructive_count(), "diff");
    Ok(set)
}

fn diff_columns(
    desired: &Table,
    live: &Table,
    opts: &DiffOptions,
    out: &mut Vec<Change>,
    drop_fks: &mut Vec<Change>,
) -> Result<(), SchemaError> {
    for column in &desired.columns {
        match live.find_column(&column.name) {
            None => out.push(Change::AddColumn {
                table: desired.name.clone(),
                column: column.clone(),
                backfill: backfill_for(column),
            }),
            Some(existing) if !existing.same_shape(column) => {
                match convertible(existing, column) {
                    Convertibility::Ok => {}
                    Convertibility::Narrowing if opts.allow_narrowing => {}
                    Convertibility::Narrowing => {
                        return Err(SchemaError::Narrowing {
                            table: desired.name.clone(),
                            column: column.name.clone(),
                            from: existing.ty,
                            to: column.ty,
                        });
                    }
                    Convertibility::Incompatible => {
                        return Err(SchemaError::Incompatible {
                            table: desired.name.clone(),
                            column: column.name.clone(),
                            from: existing.ty,
                            to: column.ty,
                        });
                    }
                }
                out.push(Change::AlterColumnType {
                    table: desired.name.clone(),
                    from: existing.clone(),
                    to: column.clone(),
                });
            }
            Some(_) => {}
        }
    }
    if opts.drop_columns {
        for column in &live.columns {
            if desired.find_column(&column.name).is_some() {
                continue;
            }
            // Constraints over the column go first.
            for fk in &live.foreign_keys {
                if fk.columns.contains(&column.name) {
                    drop_fks.push(Change::DropForeignKey {
                        table: live.name.clone(),
                        symbol: fk.symbol.clone(),
                    });
                }
            }
            out.push(Change::DropColumn {
                table: desired.name.clone(),
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}

fn diff_indexes(
    desired: &Table,
    live: &Table,
    drops: &mut Vec<Change>,
    adds: &mut Vec<Change>,
) {
    for index in &desired.indexes {
        match live.indexes.iter().find(|i| i.name == index.name) {
            None => adds.push(Change::AddIndex {
                table: desired.name.clone(),
                index: index.clone(),
            }),
            // Indexes never change in place; a structural mismatch is
            // drop-then-add.
            Some(existing) if existing != index => {
                drops.push(Change::DropIndex {
                    table: desired.name.clone(),
                    index: index.name.clone(),
                });
                adds.push(Change::AddIndex {
                    table: desired.name.clone(),
                    index: index.clone(),
                });
            }
            Some(_) => {}
        }
    }
    for index in &live.indexes {
        if desired.indexes.iter().all(|i| i.name != index.name) {
            drops.push(Change::DropIndex {
                table: desired.name.clone(),
                index: index.name.clone(),
            });
        }
    }
}

fn diff_fks(desired: &Table, live: &Table, drops: &mut Vec<Change>, adds: &mut Vec<Change>) {
    for fk in &desired.foreign_keys {
        match live.foreign_keys.iter().find(|f| f.symbol == fk.symbol) {
            None => adds.push(Change::AddForeignKey {
                table: desired.name.clone(),
                fk: fk.clone(),
            }),
            Some(existing) if existing != fk => {
                drops.push(Change::DropForeignKey {
                    table: desired.name.clone(),
                    symbol: fk.symbol.clone(),
                });
                adds.push(Change::AddForeignKey {
                    table: desired.name.clone(),
                    fk: fk.clone(),
                });
            }
            Some(_) => {}
        }
    }
    for fk in &live.foreign_keys {
        if desired.foreign_keys.iter().all(|f| f.symbol != fk.symbol) {
            drops.push(Change::DropForeignKey {
                table: desired.name.clone(),
                symbol: fk.symbol.clone(),
            });
        }
    }
}

/// NOT NULL columns with no declared default need a value for existing
/// rows; the type's zero serves.
fn backfill_for(column: &Column) -> Option<strata_core::value::Value> {
    if column.nullable || column.default.is_some() {
        None
    } else {
        Some(strata_core::value::Value::zero_for(column.ty))
    }
}

/// New tables in creation order: referenced tables before referencing
/// ones, alphabetical within a rank, cycles broken by name.
fn sort_new_tables<'a>(desired: &'a Schema, live: &Schema) -> Vec<&'a Table> {
    let mut pending: Vec<&Table> = desired
        .tables
        .iter()
        .filter(|t| live.find_table(&t.name).is_none())
        .collect();
    pending.sort_by(|a, b| a.name.cmp(&b.name));

    let mut created: BTreeSet<&str> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready: Vec<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.foreign_keys.iter().all(|fk| {
                    fk.ref_table == t.name
                        || created.contains(fk.ref_table.as_str())
                        || live.find_table(&fk.ref_table).is_some()
                })
            })
            .map(|(i, _)| i)
            .collect();
        if ready.is_empty() {
            // Cycle: emit the alphabetically first table and continue;
            // its foreign keys still trail every table add.
            let table = pending.remove(0);
            created.insert(&table.name);
            ordered.push(table);
            continue;
        }
        let mut batch: Vec<&Table> = Vec::new();
        for i in ready.into_iter().rev() {
            batch.push(pending.remove(i));
        }
        batch.sort_by(|a, b| a.name.cmp(&b.name));
        for table in batch {
            created.insert(&table.name);
            ordered.push(table);
        }
    }
    ordered
}

fn dedup_fk_drops(changes: Vec<Change>) -> Vec<Change> {
    let mut seen = BTreeSet::new();
    changes
        .into_iter()
        .filter(|change| {
            let Change::DropForeignKey { table, symbol } = change else {
                return true;
            };
            seen.insert((table.clone(), symbol.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForeignKey, Index, ReferenceAction};
    use proptest::prelude::*;
    use strata_core::value::{FieldType, Value};

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", FieldType::I64).increment())
            .column(Column::new("name", FieldType::String))
            .primary_key(["id"])
    }

    fn pets() -> Table {
        Table::new("pets")
            .column(Column::new("id", FieldType::I64).increment())
            .column(Column::new("owner_id", FieldType::I64).nullable())
            .primary_key(["id"])
            .foreign_key(
                ForeignKey::new("pets_owner", vec!["owner_id".into()], "users", vec!["id".into()])
                    .on_delete(ReferenceAction::Cascade),
            )
    }

    #[test]
    fn fresh_schema_orders_tables_by_dependency() {
        // Declaration order puts the dependent table first on purpose.
        let desired = Schema::new().table(pets()).table(users());
        let set = diff(&desired, &Schema::new(), &DiffOptions::default()).expect("diff");

        let names: Vec<&str> = set
            .iter()
            .filter_map(|c| match c {
                Change::AddTable { table } => Some(table.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["users", "pets"]);

        // Foreign keys trail every table creation.
        let last_add = set
            .iter()
            .rposition(|c| matches!(c, Change::AddTable { .. }))
            .expect("adds");
        let fk = set
            .iter()
            .position(|c| matches!(c, Change::AddForeignKey { .. }))
            .expect("fk");
        assert!(fk > last_add);
    }

    #[test]
    fn diff_then_apply_then_diff_is_empty() {
        let desired = Schema::new().table(users()).table(pets()).table(
            Table::new("groups")
                .column(Column::new("id", FieldType::I64).increment())
                .column(Column::new("name", FieldType::String).size(64))
                .primary_key(["id"])
                .index(Index::new("groups_name", ["name"]).unique()),
        );
        let live = Schema::new().table(
            Table::new("users")
                .column(Column::new("id", FieldType::I64).increment())
                .primary_key(["id"]),
        );
        let opts = DiffOptions::force();
        let set = diff(&desired, &live, &opts).expect("diff");
        assert!(!set.is_empty());

        let applied = apply_to_model(&live, &set);
        let second = diff(&desired, &applied, &opts).expect("second diff");
        assert!(second.is_empty(), "second diff not empty: {second:?}");
    }

    #[test]
    fn not_null_add_column_carries_a_backfill() {
        let mut with_age = users();
        with_age = with_age.column(Column::new("age", FieldType::I64));
        let desired = Schema::new().table(with_age);
        let live = Schema::new().table(users());
        let set = diff(&desired, &live, &DiffOptions::default()).expect("diff");

        let [Change::AddColumn { backfill, .. }] = &set[..] else {
            panic!("expected one AddColumn, got {set:?}");
        };
        assert_eq!(backfill.as_ref(), Some(&Value::Int(0)));
    }

    #[test]
    fn nullable_add_column_needs_no_backfill() {
        let desired =
            Schema::new().table(users().column(Column::new("bio", FieldType::String).nullable()));
        let live = Schema::new().table(users());
        let set = diff(&desired, &live, &DiffOptions::default()).expect("diff");
        let [Change::AddColumn { backfill, .. }] = &set[..] else {
            panic!("expected one AddColumn, got {set:?}");
        };
        assert!(backfill.is_none());
    }

    #[test]
    fn int_to_string_is_exactly_one_alter() {
        let mut live_users = Table::new("users")
            .column(Column::new("id", FieldType::I64).increment())
            .primary_key(["id"]);
        live_users = live_users.column(Column::new("code", FieldType::I8));
        let mut desired_users = Table::new("users")
            .column(Column::new("id", FieldType::I64).increment())
            .primary_key(["id"]);
        desired_users = desired_users.column(Column::new("code", FieldType::String));

        let set = diff(
            &Schema::new().table(desired_users),
            &Schema::new().table(live_users),
            &DiffOptions::default(),
        )
        .expect("diff");
        let [Change::AlterColumnType { from, to, .. }] = &set[..] else {
            panic!("expected one AlterColumnType, got {set:?}");
        };
        assert_eq!(from.ty, FieldType::I8);
        assert_eq!(to.ty, FieldType::String);
    }

    #[test]
    fn narrowing_requires_the_opt_in() {
        let live = Schema::new().table(users().column(Column::new("n", FieldType::I64)));
        let desired = Schema::new().table(users().column(Column::new("n", FieldType::I16)));
        let err = diff(&desired, &live, &DiffOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::Narrowing { .. }));

        let opts = DiffOptions {
            allow_narrowing: true,
            ..DiffOptions::default()
        };
        let set = diff(&desired, &live, &opts).expect("forced diff");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn fk_drops_precede_the_referenced_table_drop() {
        let live = Schema::new().table(users()).table(pets());
        // Dropping users forces pets_owner (on pets) to drop first.
        let desired = {
            let mut p = pets();
            p.foreign_keys.clear();
            Schema::new().table(p)
        };
        let set = diff(&desired, &live, &DiffOptions::force()).expect("diff");

        let fk_drop = set
            .iter()
            .position(|c| matches!(c, Change::DropForeignKey { symbol, .. } if symbol == "pets_owner"))
            .expect("fk drop present");
        let table_drop = set
            .iter()
            .position(|c| matches!(c, Change::DropTable { table } if table == "users"))
            .expect("table drop present");
        assert!(fk_drop < table_drop);
    }

    #[test]
    fn destructive_changes_are_gated() {
        let live = Schema::new().table(users()).table(pets());
        let desired = Schema::new().table(users());
        let additive = diff(&desired, &live, &DiffOptions::default()).expect("diff");
        assert!(additive.is_empty());

        let destructive = diff(&desired, &live, &DiffOptions::force()).expect("diff");
        assert_eq!(destructive.destructive_count(), 1);
    }

    #[test]
    fn changed_index_is_dropped_and_readded() {
        let live = Schema::new().table(users().index(Index::new("users_name", ["name"])));
        let desired =
            Schema::new().table(users().index(Index::new("users_name", ["name"]).unique()));
        let set = diff(&desired, &live, &DiffOptions::default()).expect("diff");
        assert!(matches!(set[0], Change::DropIndex { .. }));
        assert!(matches!(set[1], Change::AddIndex { .. }));
        assert_eq!(set.len(), 2);
    }

    proptest! {
        // Idempotence over single-table column layouts: whatever subset of
        // columns the live side has, one diff+apply converges.
        #[test]
        fn diff_apply_converges(live_cols in proptest::sample::subsequence(
            vec!["name", "age", "bio", "score"], 0..=4,
        )) {
            let mut live_table = Table::new("users")
                .column(Column::new("id", FieldType::I64).increment())
                .primary_key(["id"]);
            for name in &live_cols {
                live_table = live_table.column(Column::new(*name, FieldType::String).nullable());
            }
            let desired = Schema::new().table(
                Table::new("users")
                    .column(Column::new("id", FieldType::I64).increment())
                    .column(Column::new("name", FieldType::String).nullable())
                    .column(Column::new("score", FieldType::String).nullable())
                    .primary_key(["id"]),
            );
            let live = Schema::new().table(live_table);
            let opts = DiffOptions::force();
            let set = diff(&desired, &live, &opts).expect("diff");
            let applied = apply_to_model(&live, &set);
            let second = diff(&desired, &applied, &opts).expect("second diff");
            prop_assert!(second.is_empty());
        }
    }
}

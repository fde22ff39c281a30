use crate::{
    diff::Change,
    error::MigrateError,
    model::{Column, ForeignKey, Index, ReferenceAction, Table},
};
use std::collections::BTreeSet;
use strata_core::{
    dialect::{Dialect, DialectAdapter},
    sql::Statement,
    value::FieldType,
};

/// Render one change as executable DDL.
///
/// Most changes are a single statement; Postgres column alterations may
/// need a type change and a nullability change. SQLite cannot rewrite
/// columns or constraints in place, so those changes are refused before
/// anything executes.
pub(crate) fn render(
    adapter: &dyn DialectAdapter,
    change: &Change,
) -> Result<Vec<Statement>, MigrateError> {
    let dialect = adapter.dialect();
    match change {
        Change::AddTable { table } => Ok(vec![create_table(adapter, table)]),
        Change::DropTable { table } => Ok(vec![Statement::ddl(format!(
            "DROP TABLE {}",
            adapter.quote_ident(table)
        ))]),
        Change::AddColumn {
            table,
            column,
            backfill,
        } => {
            let mut sql = format!(
                "ALTER TABLE {} ADD COLUMN {}",
                adapter.quote_ident(table),
                column_def(adapter, column, false)
            );
            // Existing rows need a value for a NOT NULL column with no
            // declared default.
            if column.default.is_none()
                && let Some(value) = backfill
            {
                sql.push_str(" DEFAULT ");
                sql.push_str(&adapter.literal(value));
            }
            Ok(vec![Statement::ddl(sql)])
        }
        Change::DropColumn { table, column } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported(dialect, change));
            }
            Ok(vec![Statement::ddl(format!(
                "ALTER TABLE {} DROP COLUMN {}",
                adapter.quote_ident(table),
                adapter.quote_ident(column)
            ))])
        }
        Change::AlterColumnType { table, from, to } => match dialect {
            Dialect::Sqlite => Err(unsupported(dialect, change)),
            Dialect::MySql => Ok(vec![Statement::ddl(format!(
                "ALTER TABLE {} MODIFY COLUMN {}",
                adapter.quote_ident(table),
                column_def(adapter, to, false)
            ))]),
            Dialect::Postgres => {
                let t = adapter.quote_ident(table);
                let c = adapter.quote_ident(&to.name);
                let mut stmts = vec![Statement::ddl(format!(
                    "ALTER TABLE {t} ALTER COLUMN {c} TYPE {}",
                    to.type_for(adapter)
                ))];
                if from.nullable != to.nullable {
                    let verb = if to.nullable { "DROP" } else { "SET" };
                    stmts.push(Statement::ddl(format!(
                        "ALTER TABLE {t} ALTER COLUMN {c} {verb} NOT NULL"
                    )));
                }
                Ok(stmts)
            }
        },
        Change::AddIndex { table, index } => Ok(vec![create_index(adapter, table, index)]),
        Change::DropIndex { table, index } => {
            let sql = if dialect == Dialect::MySql {
                format!(
                    "DROP INDEX {} ON {}",
                    adapter.quote_ident(index),
                    adapter.quote_ident(table)
                )
            } else {
                format!("DROP INDEX {}", adapter.quote_ident(index))
            };
            Ok(vec![Statement::ddl(sql)])
        }
        Change::AddForeignKey { table, fk } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported(dialect, change));
            }
            Ok(vec![Statement::ddl(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} {}",
                adapter.quote_ident(table),
                adapter.quote_ident(&fk.symbol),
                fk_clause(adapter, fk)
            ))])
        }
        Change::DropForeignKey { table, symbol } => match dialect {
            Dialect::Sqlite => Err(unsupported(dialect, change)),
            Dialect::MySql => Ok(vec![Statement::ddl(format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                adapter.quote_ident(table),
                adapter.quote_ident(symbol)
            ))]),
            Dialect::Postgres => Ok(vec![Statement::ddl(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                adapter.quote_ident(table),
                adapter.quote_ident(symbol)
            ))]),
        },
    }
}

/// Changes whose effect is already carried by another statement in the
/// same set. SQLite inlines foreign keys into CREATE TABLE and drops them
/// with DROP TABLE, so the separate constraint changes render as nothing
/// for tables the set itself creates or removes.
pub(crate) fn subsumed(
    dialect: Dialect,
    change: &Change,
    added: &BTreeSet<&str>,
    dropped: &BTreeSet<&str>,
) -> bool {
    if dialect != Dialect::Sqlite {
        return false;
    }
    match change {
        Change::AddForeignKey { table, .. } => added.contains(table.as_str()),
        Change::DropForeignKey { table, .. } => dropped.contains(table.as_str()),
        _ => false,
    }
}

fn unsupported(dialect: Dialect, change: &Change) -> MigrateError {
    MigrateError::Unsupported {
        dialect,
        change: change.describe(),
    }
}

fn create_table(adapter: &dyn DialectAdapter, table: &Table) -> Statement {
    let dialect = adapter.dialect();
    let mut parts: Vec<String> =
        Vec::with_capacity(table.columns.len() + table.foreign_keys.len() + 1);

    // SQLite expresses an auto-increment key inline and forbids a second
    // table-level PRIMARY KEY clause for it.
    let sqlite_rowid = dialect == Dialect::Sqlite
        && table.primary_key.len() == 1
        && table
            .find_column(&table.primary_key[0])
            .is_some_and(|c| c.increment);

    for column in &table.columns {
        let inline_pk = sqlite_rowid && table.primary_key[0] == column.name;
        parts.push(column_def(adapter, column, inline_pk));
    }
    if !table.primary_key.is_empty() && !sqlite_rowid {
        let cols: Vec<String> = table
            .primary_key
            .iter()
            .map(|c| adapter.quote_ident(c))
            .collect();
        parts.push(format!("PRIMARY KEY ({})", cols.join(", ")));
    }
    // SQLite has no post-creation constraint DDL; its foreign keys go
    // inline here. The other dialects add them as trailing changes.
    if dialect == Dialect::Sqlite {
        for fk in &table.foreign_keys {
            parts.push(format!(
                "CONSTRAINT {} {}",
                adapter.quote_ident(&fk.symbol),
                fk_clause(adapter, fk)
            ));
        }
    }
    Statement::ddl(format!(
        "CREATE TABLE {} ({})",
        adapter.quote_ident(&table.name),
        parts.join(", ")
    ))
}

/// One column definition, shared by CREATE TABLE and column DDL.
fn column_def(adapter: &dyn DialectAdapter, column: &Column, inline_pk: bool) -> String {
    let dialect = adapter.dialect();
    let mut def = adapter.quote_ident(&column.name);
    def.push(' ');
    if inline_pk {
        // SQLite rowid alias: must be exactly INTEGER PRIMARY KEY.
        def.push_str("integer PRIMARY KEY AUTOINCREMENT");
        return def;
    }
    // Postgres auto-increment is a type, not a modifier.
    if column.increment && dialect == Dialect::Postgres {
        def.push_str(match column.ty {
            FieldType::I64 | FieldType::U64 => "bigserial",
            _ => "serial",
        });
    } else {
        def.push_str(&column.type_for(adapter));
    }
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if column.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(&adapter.literal(default));
    }
    if column.increment && dialect == Dialect::MySql {
        def.push_str(" AUTO_INCREMENT");
    }
    def
}

fn create_index(adapter: &dyn DialectAdapter, table: &str, index: &Index) -> Statement {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let cols: Vec<String> = index
        .columns
        .iter()
        .map(|c| {
            let quoted = adapter.quote_ident(c);
            // Prefix lengths are a MySQL notion; the other dialects index
            // the whole column.
            match index.prefixes.get(c) {
                Some(len) if adapter.dialect() == Dialect::MySql => format!("{quoted}({len})"),
                _ => quoted,
            }
        })
        .collect();
    Statement::ddl(format!(
        "CREATE {unique}INDEX {} ON {} ({})",
        adapter.quote_ident(&index.name),
        adapter.quote_ident(table),
        cols.join(", ")
    ))
}

fn fk_clause(adapter: &dyn DialectAdapter, fk: &ForeignKey) -> String {
    let cols: Vec<String> = fk.columns.iter().map(|c| adapter.quote_ident(c)).collect();
    let refs: Vec<String> = fk
        .ref_columns
        .iter()
        .map(|c| adapter.quote_ident(c))
        .collect();
    let mut clause = format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        cols.join(", "),
        adapter.quote_ident(&fk.ref_table),
        refs.join(", ")
    );
    if fk.on_delete != ReferenceAction::NoAction {
        clause.push_str(" ON DELETE ");
        clause.push_str(fk.on_delete.as_sql());
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::value::Value;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", FieldType::I64).increment())
            .column(Column::new("email", FieldType::String).size(120).unique())
            .column(Column::new("active", FieldType::Bool).default_value(true))
            .primary_key(["id"])
    }

    fn render_one(dialect: Dialect, change: &Change) -> String {
        let stmts = render(dialect.adapter(), change).expect("render");
        assert_eq!(stmts.len(), 1, "expected one statement");
        stmts[0].sql.clone()
    }

    #[test]
    fn create_table_per_dialect() {
        let change = Change::AddTable { table: users() };
        assert_eq!(
            render_one(Dialect::MySql, &change),
            "CREATE TABLE `users` (`id` bigint NOT NULL AUTO_INCREMENT, \
             `email` varchar(120) NOT NULL UNIQUE, \
             `active` boolean NOT NULL DEFAULT 1, PRIMARY KEY (`id`))"
        );
        assert_eq!(
            render_one(Dialect::Postgres, &change),
            "CREATE TABLE \"users\" (\"id\" bigserial NOT NULL, \
             \"email\" varchar(120) NOT NULL UNIQUE, \
             \"active\" boolean NOT NULL DEFAULT true, PRIMARY KEY (\"id\"))"
        );
        assert_eq!(
            render_one(Dialect::Sqlite, &change),
            "CREATE TABLE `users` (`id` integer PRIMARY KEY AUTOINCREMENT, \
             `email` varchar(120) NOT NULL UNIQUE, \
             `active` bool NOT NULL DEFAULT 1)"
        );
    }

    #[test]
    fn sqlite_inlines_foreign_keys_into_create_table() {
        let pets = Table::new("pets")
            .column(Column::new("id", FieldType::I64).increment())
            .column(Column::new("owner_id", FieldType::I64).nullable())
            .primary_key(["id"])
            .foreign_key(
                ForeignKey::new("pets_owner", vec!["owner_id".into()], "users", vec!["id".into()])
                    .on_delete(ReferenceAction::Cascade),
            );
        let change = Change::AddTable { table: pets };
        assert_eq!(
            render_one(Dialect::Sqlite, &change),
            "CREATE TABLE `pets` (`id` integer PRIMARY KEY AUTOINCREMENT, \
             `owner_id` bigint, \
             CONSTRAINT `pets_owner` FOREIGN KEY (`owner_id`) REFERENCES `users` (`id`) \
             ON DELETE CASCADE)"
        );
        // The other dialects constrain after creation instead.
        assert!(!render_one(Dialect::Postgres, &change).contains("FOREIGN KEY"));
    }

    #[test]
    fn constraint_changes_on_freshly_created_tables_are_subsumed_on_sqlite() {
        let added = BTreeSet::from(["pets"]);
        let dropped = BTreeSet::from(["users"]);
        let add_fk = Change::AddForeignKey {
            table: "pets".into(),
            fk: ForeignKey::new("pets_owner", vec!["owner_id".into()], "users", vec!["id".into()]),
        };
        let drop_fk = Change::DropForeignKey {
            table: "users".into(),
            symbol: "users_group".into(),
        };
        assert!(subsumed(Dialect::Sqlite, &add_fk, &added, &dropped));
        assert!(subsumed(Dialect::Sqlite, &drop_fk, &added, &dropped));
        assert!(!subsumed(Dialect::Postgres, &add_fk, &added, &dropped));

        // A constraint on a pre-existing table is still refused.
        let stale = Change::AddForeignKey {
            table: "orders".into(),
            fk: ForeignKey::new("orders_user", vec!["user_id".into()], "users", vec!["id".into()]),
        };
        assert!(!subsumed(Dialect::Sqlite, &stale, &added, &dropped));
        assert!(matches!(
            render(Dialect::Sqlite.adapter(), &stale),
            Err(MigrateError::Unsupported { .. })
        ));
    }

    #[test]
    fn add_column_backfills_not_null() {
        let change = Change::AddColumn {
            table: "users".into(),
            column: Column::new("age", FieldType::I64),
            backfill: Some(Value::Int(0)),
        };
        assert_eq!(
            render_one(Dialect::Postgres, &change),
            "ALTER TABLE \"users\" ADD COLUMN \"age\" bigint NOT NULL DEFAULT 0"
        );
    }

    #[test]
    fn alter_column_differs_per_dialect() {
        let change = Change::AlterColumnType {
            table: "users".into(),
            from: Column::new("code", FieldType::I8),
            to: Column::new("code", FieldType::String).nullable(),
        };
        assert_eq!(
            render_one(Dialect::MySql, &change),
            "ALTER TABLE `users` MODIFY COLUMN `code` varchar(255)"
        );
        let pg = render(Dialect::Postgres.adapter(), &change).expect("render");
        assert_eq!(
            pg[0].sql,
            "ALTER TABLE \"users\" ALTER COLUMN \"code\" TYPE varchar"
        );
        assert_eq!(
            pg[1].sql,
            "ALTER TABLE \"users\" ALTER COLUMN \"code\" DROP NOT NULL"
        );
        assert!(matches!(
            render(Dialect::Sqlite.adapter(), &change),
            Err(MigrateError::Unsupported { .. })
        ));
    }

    #[test]
    fn index_ddl_handles_prefixes_and_dialect_drop_forms() {
        let index = Index::new("users_email", ["email"]).unique().prefix("email", 16);
        let add = Change::AddIndex {
            table: "users".into(),
            index,
        };
        assert_eq!(
            render_one(Dialect::MySql, &add),
            "CREATE UNIQUE INDEX `users_email` ON `users` (`email`(16))"
        );
        assert_eq!(
            render_one(Dialect::Postgres, &add),
            "CREATE UNIQUE INDEX \"users_email\" ON \"users\" (\"email\")"
        );

        let drop = Change::DropIndex {
            table: "users".into(),
            index: "users_email".into(),
        };
        assert_eq!(
            render_one(Dialect::MySql, &drop),
            "DROP INDEX `users_email` ON `users`"
        );
        assert_eq!(
            render_one(Dialect::Sqlite, &drop),
            "DROP INDEX `users_email`"
        );
    }

    #[test]
    fn fk_ddl_renders_action_and_dialect_drop_forms() {
        let fk = ForeignKey::new(
            "pets_owner",
            vec!["owner_id".into()],
            "users",
            vec!["id".into()],
        )
        .on_delete(ReferenceAction::Cascade);
        let add = Change::AddForeignKey {
            table: "pets".into(),
            fk,
        };
        assert_eq!(
            render_one(Dialect::Postgres, &add),
            "ALTER TABLE \"pets\" ADD CONSTRAINT \"pets_owner\" \
             FOREIGN KEY (\"owner_id\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE"
        );

        let drop = Change::DropForeignKey {
            table: "pets".into(),
            symbol: "pets_owner".into(),
        };
        assert_eq!(
            render_one(Dialect::MySql, &drop),
            "ALTER TABLE `pets` DROP FOREIGN KEY `pets_owner`"
        );
        assert_eq!(
            render_one(Dialect::Postgres, &drop),
            "ALTER TABLE \"pets\" DROP CONSTRAINT \"pets_owner\""
        );
        assert!(matches!(
            render(Dialect::Sqlite.adapter(), &drop),
            Err(MigrateError::Unsupported { .. })
        ));
    }
}

use crate::model::Schema;
use strata_core::{
    driver::{Context, Driver},
    error::DriverError,
};

///
/// Inspector
///
/// Reads the live schema out of a database. Introspection queries are
/// dialect- and deployment-specific (information_schema, pg_catalog,
/// sqlite_master, or an application-side registry), so the capability
/// lives behind a trait and [`Migrator::sync`](crate::migrate::Migrator::sync)
/// consumes whatever implementation the embedding application provides.
///

pub trait Inspector {
    /// Describe the schema the database currently holds.
    fn describe(&mut self, ctx: &Context, driver: &mut dyn Driver) -> Result<Schema, DriverError>;
}

/// A fixed snapshot, useful when the live schema is tracked out of band.
impl Inspector for Schema {
    fn describe(
        &mut self,
        _ctx: &Context,
        _driver: &mut dyn Driver,
    ) -> Result<Schema, DriverError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diff::DiffOptions,
        migrate::Migrator,
        model::{Column, Table},
    };
    use strata_core::{dialect::Dialect, testing::ScriptedDriver, value::FieldType};

    #[test]
    fn sync_inspects_diffs_and_applies() {
        let mut live = Schema::new();
        let desired = Schema::new().table(
            Table::new("users")
                .column(Column::new("id", FieldType::I64).increment())
                .primary_key(["id"]),
        );

        let mut driver = ScriptedDriver::new(Dialect::Postgres).reply_exec(0);
        let set = Migrator::new(DiffOptions::default())
            .sync(&Context::background(), &mut driver, &mut live, &desired)
            .expect("sync");

        assert_eq!(set.len(), 1);
        assert!(driver.committed());
    }

    #[test]
    fn sync_with_matching_schemas_is_a_noop() {
        let desired = Schema::new().table(
            Table::new("users")
                .column(Column::new("id", FieldType::I64).increment())
                .primary_key(["id"]),
        );
        let mut live = desired.clone();

        let mut driver = ScriptedDriver::new(Dialect::Postgres);
        let set = Migrator::default()
            .sync(&Context::background(), &mut driver, &mut live, &desired)
            .expect("sync");

        assert!(set.is_empty());
        assert_eq!(driver.statements(), 0);
    }
}

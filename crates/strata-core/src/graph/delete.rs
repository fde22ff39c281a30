use crate::{
    dialect::DialectAdapter,
    driver::{Context, Driver},
    error::Error,
    graph::{check_columns, predicate_columns, run_exec},
    spec::DeleteSpec,
    sql::{DeleteBuilder, Statement},
};

/// Compile a delete spec into one DELETE.
pub fn compile_delete(
    adapter: &dyn DialectAdapter,
    spec: &DeleteSpec,
) -> Result<Statement, Error> {
    let mut builder = DeleteBuilder::new(spec.node.table.clone());
    if let Some(pred) = &spec.predicate {
        let mut used = Vec::new();
        predicate_columns(pred, &mut used);
        check_columns(&spec.node.table, &spec.node.columns, used)?;
        builder = builder.filter(pred.clone());
    }
    Ok(builder.build(adapter))
}

/// Delete every matching row, returning the affected count.
///
/// Dependent rows are the schema's concern: a RESTRICT foreign key makes
/// the driver fail here, and that failure classifies as a constraint
/// error.
pub fn delete_nodes(ctx: &Context, driver: &mut dyn Driver, spec: &DeleteSpec) -> Result<u64, Error> {
    let stmt = compile_delete(driver.dialect().adapter(), spec)?;
    let result = run_exec(ctx, driver, &stmt)?;
    Ok(result.rows_affected)
}

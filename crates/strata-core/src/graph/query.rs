use crate::{
    dialect::DialectAdapter,
    driver::{Context, Driver, Rows},
    error::{Error, ValidationError},
    graph::{check_columns, predicate_columns, run_query},
    spec::{Predicate, QuerySpec, Rel, Step, StepSource},
    sql::{ColumnRef, FromItem, SelectBuilder, Statement},
    value::Value,
};

// Alias for the single traversal join a compiled query can carry.
const JOIN_ALIAS: &str = "t1";

/// Compile a query spec into one SELECT.
pub fn compile_query(adapter: &dyn DialectAdapter, spec: &QuerySpec) -> Result<Statement, Error> {
    Ok(selector(adapter, spec)?.build(adapter))
}

/// Compile the COUNT form of a query. Ordering is dropped, and traversals
/// that fan out count distinct identifiers instead of joined rows.
pub fn compile_count(adapter: &dyn DialectAdapter, spec: &QuerySpec) -> Result<Statement, Error> {
    let distinct = is_unique(spec);
    let mut sel = selector(adapter, spec)?.clear_order().distinct(false);
    if distinct {
        sel = sel.count(
            true,
            vec![ColumnRef::qualified(
                spec.node.table.clone(),
                spec.node.id.column.clone(),
            )],
        );
    } else {
        sel = sel.count(false, Vec::new());
    }
    Ok(sel.build(adapter))
}

/// Compile the existence probe for a query.
pub fn compile_exists(adapter: &dyn DialectAdapter, spec: &QuerySpec) -> Result<Statement, Error> {
    let sel = selector(adapter, spec)?
        .clear_order()
        .select_refs(vec![ColumnRef::qualified(
            spec.node.table.clone(),
            spec.node.id.column.clone(),
        )])
        .limit(1);
    Ok(sel.build_exists(adapter))
}

/// Run a query and materialize every matching row.
pub fn query_nodes(
    ctx: &Context,
    driver: &mut dyn Driver,
    spec: &QuerySpec,
) -> Result<Rows, Error> {
    let stmt = compile_query(driver.dialect().adapter(), spec)?;
    let mut rows = run_query(ctx, driver, &stmt)?;
    if rows.columns.is_empty() {
        rows.columns.clone_from(&spec.node.columns);
    }
    Ok(rows)
}

/// Run a query expected to match exactly one row.
///
/// Zero rows is [`Error::NotFound`]; more than one is
/// [`Error::NotSingular`]. A `LIMIT 2` keeps the violation check cheap.
pub fn query_node(
    ctx: &Context,
    driver: &mut dyn Driver,
    spec: &QuerySpec,
) -> Result<Vec<Value>, Error> {
    let mut probe = spec.clone();
    probe.limit = Some(2);
    let rows = query_nodes(ctx, driver, &probe)?;
    match rows.len() {
        1 => Ok(rows.values.into_iter().next().unwrap_or_default()),
        0 => Err(Error::NotFound {
            table: spec.node.table.clone(),
            id: spec.node.id.value.clone().unwrap_or(Value::Null),
        }),
        count => Err(Error::NotSingular {
            table: spec.node.table.clone(),
            count,
        }),
    }
}

/// Run the COUNT form and scan the scalar.
pub fn count_nodes(ctx: &Context, driver: &mut dyn Driver, spec: &QuerySpec) -> Result<u64, Error> {
    let stmt = compile_count(driver.dialect().adapter(), spec)?;
    let rows = run_query(ctx, driver, &stmt)?;
    match rows.scalar() {
        Some(Value::Int(n)) => Ok(u64::try_from(*n).unwrap_or(0)),
        Some(Value::Uint(n)) => Ok(*n),
        _ => Err(Error::Driver("count query returned no scalar".into())),
    }
}

/// Run the existence probe and scan the boolean.
pub fn exists_nodes(
    ctx: &Context,
    driver: &mut dyn Driver,
    spec: &QuerySpec,
) -> Result<bool, Error> {
    let stmt = compile_exists(driver.dialect().adapter(), spec)?;
    let rows = run_query(ctx, driver, &stmt)?;
    match rows.scalar() {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Int(n)) => Ok(*n != 0),
        Some(Value::Uint(n)) => Ok(*n != 0),
        _ => Err(Error::Driver("exists query returned no scalar".into())),
    }
}

/// True when the result set must deduplicate: explicit request, or a
/// traversal through a to-many edge with no explicit opt-out.
fn is_unique(spec: &QuerySpec) -> bool {
    spec.unique
        .unwrap_or_else(|| spec.step.as_ref().is_some_and(Step::through_to_many))
}

/// The shared selector behind query, count, and exists compilation.
fn selector(adapter: &dyn DialectAdapter, spec: &QuerySpec) -> Result<SelectBuilder, Error> {
    if !spec.node.id_in_columns() {
        return Err(ValidationError::UnknownColumn {
            table: spec.node.table.clone(),
            column: spec.node.id.column.clone(),
        }
        .into());
    }
    let mut used = Vec::new();
    if let Some(pred) = &spec.predicate {
        predicate_columns(pred, &mut used);
    }
    used.extend(spec.order.iter().map(|o| o.column.as_str()));
    check_columns(&spec.node.table, &spec.node.columns, used)?;

    let mut sel = SelectBuilder::from_table(spec.node.table.clone())
        .columns(spec.node.columns.iter().cloned());
    if let Some(step) = &spec.step {
        sel = traverse(sel, step)?;
    }
    if let Some(pred) = &spec.predicate {
        sel = sel.filter(pred.clone());
    }
    if is_unique(spec) {
        sel = sel.distinct(true);
    }
    for order in &spec.order {
        sel = sel.order_by(order.clone());
    }
    if let Some(limit) = spec.limit {
        sel = sel.limit(limit);
    }
    if let Some(offset) = spec.offset {
        sel = sel.offset(offset);
        // OFFSET needs a LIMIT on every supported dialect; an unbounded
        // page gets the dialect's maximum.
        if !sel.has_limit() {
            sel = sel.limit(adapter.max_limit());
        }
    }
    Ok(sel)
}

/// Narrow the selector to the neighbors reached through `step`.
fn traverse(sel: SelectBuilder, step: &Step) -> Result<SelectBuilder, Error> {
    check_edge_columns(step)?;
    let sel = match step.edge.rel {
        Rel::M2M => {
            // Land on the join-table column pointing at the destination,
            // filter the join table by the column pointing at the source.
            let (land, from) = if step.edge.inverse {
                (&step.edge.columns[0], &step.edge.columns[1])
            } else {
                (&step.edge.columns[1], &step.edge.columns[0])
            };
            let mut join = SelectBuilder::from_table(step.edge.table.clone())
                .select_refs(vec![ColumnRef::qualified(
                    step.edge.table.clone(),
                    land.clone(),
                )]);
            join = match &step.from.source {
                StepSource::Node(id) => join.filter(Predicate::eq(from.clone(), id.clone())),
                StepSource::Selector(source) => {
                    let matches = source
                        .clone()
                        .select_refs(vec![ColumnRef::qualified(
                            step.from.table.clone(),
                            step.from.column.clone(),
                        )])
                        .clear_order();
                    join.filter(Predicate::in_select(from.clone(), matches))
                }
            };
            sel.join(
                FromItem::Select {
                    query: Box::new(join),
                    alias: JOIN_ALIAS.to_string(),
                },
                ColumnRef::qualified(step.to.table.clone(), step.to.column.clone()),
                ColumnRef::qualified(JOIN_ALIAS, land.clone()),
            )
        }
        // The foreign key lives on the source table: follow it.
        Rel::M2O | Rel::O2O if fk_on_source(step) => {
            let fk = step.edge.columns[0].clone();
            let hop = SelectBuilder::from_table(step.from.table.clone()).select_refs(vec![
                ColumnRef::qualified(step.from.table.clone(), fk.clone()),
            ]);
            let hop = match &step.from.source {
                StepSource::Node(id) => {
                    hop.filter(Predicate::eq(step.from.column.clone(), id.clone()))
                }
                StepSource::Selector(source) => {
                    let matches = source
                        .clone()
                        .select_refs(vec![ColumnRef::qualified(
                            step.from.table.clone(),
                            step.from.column.clone(),
                        )])
                        .clear_order();
                    hop.filter(Predicate::in_select(step.from.column.clone(), matches))
                }
            };
            sel.filter(Predicate::in_select(step.to.column.clone(), hop))
        }
        // The foreign key lives on the destination table: match it.
        _ => {
            let fk = step.edge.columns[0].clone();
            match &step.from.source {
                StepSource::Node(id) => sel.filter(Predicate::eq(fk, id.clone())),
                StepSource::Selector(source) => {
                    let matches = source
                        .clone()
                        .select_refs(vec![ColumnRef::qualified(
                            step.from.table.clone(),
                            step.from.column.clone(),
                        )])
                        .clear_order();
                    sel.filter(Predicate::in_select(fk, matches))
                }
            }
        }
    };
    Ok(sel)
}

/// For O2O the owning side depends on the edge's direction; for M2O the
/// source always owns the foreign key.
fn fk_on_source(step: &Step) -> bool {
    match step.edge.rel {
        Rel::M2O => true,
        Rel::O2O => step.edge.inverse,
        Rel::O2M | Rel::M2M => false,
    }
}

fn check_edge_columns(step: &Step) -> Result<(), ValidationError> {
    let expected = if step.edge.rel == Rel::M2M { 2 } else { 1 };
    if step.edge.columns.len() == expected {
        Ok(())
    } else {
        Err(ValidationError::EdgeColumns {
            table: step.edge.table.clone(),
            expected,
            got: step.edge.columns.len(),
        })
    }
}

use crate::{
    dialect::DialectAdapter,
    driver::{Context, Driver},
    error::{Error, ValidationError},
    graph::{check_columns, edge_constraint, run_exec, run_query, with_txn},
    spec::{BatchCreateSpec, CreateSpec, EdgeSpec, FieldSpec, Predicate, Rel},
    sql::{DeleteBuilder, InsertBuilder, Statement, UpdateBuilder},
    value::{FieldType, Value},
};
use std::collections::BTreeSet;

/// Compile the node-row INSERT for a create spec. Owning-side edges fold
/// into the row as foreign-key columns; external edges are execution-plan
/// statements and do not appear here.
pub fn compile_create(
    adapter: &dyn DialectAdapter,
    spec: &CreateSpec,
) -> Result<Statement, Error> {
    validate_create(spec)?;
    let (columns, values) = row_values(spec)?;
    let mut insert = InsertBuilder::new(spec.node.table.clone());
    if !columns.is_empty() {
        insert = insert.columns(columns).values(values);
    }
    if spec.id_value().is_none() {
        insert = insert.returning(spec.node.id.column.clone());
    }
    Ok(insert.build(adapter))
}

/// Insert one node and connect its edges, returning the node's identifier.
///
/// External edges run in the same transaction as the insert; a failure on
/// any statement rolls the whole creation back.
pub fn create_node(
    ctx: &Context,
    driver: &mut dyn Driver,
    spec: &CreateSpec,
) -> Result<Value, Error> {
    let stmt = compile_create(driver.dialect().adapter(), spec)?;
    let external: Vec<EdgeSpec> = spec.external_edges().cloned().collect();
    if external.is_empty() {
        return insert_row(ctx, driver, spec, &stmt);
    }
    with_txn(ctx, driver, |driver| {
        let id = insert_row(ctx, driver, spec, &stmt)?;
        add_external_edges(ctx, driver, &id, &external)?;
        Ok(id)
    })
}

/// Compile the multi-row INSERT for a batch. Rows may populate different
/// column subsets; the sorted union is taken and gaps insert as NULL.
pub fn compile_batch_create(
    adapter: &dyn DialectAdapter,
    batch: &BatchCreateSpec,
) -> Result<Option<Statement>, Error> {
    batch.validate()?;
    let Some(first) = batch.nodes.first() else {
        return Ok(None);
    };
    for spec in &batch.nodes {
        validate_create(spec)?;
    }

    let mut union = BTreeSet::new();
    let mut per_row = Vec::with_capacity(batch.nodes.len());
    for spec in &batch.nodes {
        let (columns, values) = row_values(spec)?;
        for col in &columns {
            union.insert(col.clone());
        }
        per_row.push((columns, values));
    }
    let columns: Vec<String> = union.into_iter().collect();

    let mut insert = InsertBuilder::new(first.node.table.clone()).columns(columns.clone());
    for (row_columns, row_values) in &per_row {
        let row = columns
            .iter()
            .map(|col| {
                row_columns
                    .iter()
                    .position(|c| c == col)
                    .map_or(Value::Null, |i| row_values[i].clone())
            })
            .collect();
        insert = insert.values(row);
    }
    if first.id_value().is_none() {
        insert = insert.returning(first.node.id.column.clone());
    }
    Ok(Some(insert.build(adapter)))
}

/// Insert several nodes of one type with a single statement, returning
/// their identifiers in row order.
///
/// Identifier retrieval follows the dialect: `RETURNING` rows map to input
/// rows positionally, and auto-increment dialects assign consecutive
/// identifiers from the first insert id.
pub fn batch_create(
    ctx: &Context,
    driver: &mut dyn Driver,
    batch: &BatchCreateSpec,
) -> Result<Vec<Value>, Error> {
    let Some(stmt) = compile_batch_create(driver.dialect().adapter(), batch)? else {
        return Ok(Vec::new());
    };

    let has_external = batch.nodes.iter().any(|s| s.external_edges().count() > 0);
    if has_external {
        with_txn(ctx, driver, |driver| {
            let ids = insert_batch(ctx, driver, batch, &stmt)?;
            for (spec, id) in batch.nodes.iter().zip(&ids) {
                let external: Vec<EdgeSpec> = spec.external_edges().cloned().collect();
                add_external_edges(ctx, driver, id, &external)?;
            }
            Ok(ids)
        })
    } else {
        insert_batch(ctx, driver, batch, &stmt)
    }
}

fn insert_row(
    ctx: &Context,
    driver: &mut dyn Driver,
    spec: &CreateSpec,
    stmt: &Statement,
) -> Result<Value, Error> {
    if let Some(id) = spec.id_value() {
        run_exec(ctx, driver, stmt)?;
        return Ok(id.clone());
    }
    if driver.dialect().adapter().supports_returning() {
        let rows = run_query(ctx, driver, stmt)?;
        return rows
            .scalar()
            .cloned()
            .ok_or_else(|| Error::Driver("insert returned no identifier".into()));
    }
    let result = run_exec(ctx, driver, stmt)?;
    result
        .last_insert_id
        .map(Value::Int)
        .ok_or_else(|| Error::Driver("driver reported no last insert id".into()))
}

fn insert_batch(
    ctx: &Context,
    driver: &mut dyn Driver,
    batch: &BatchCreateSpec,
    stmt: &Statement,
) -> Result<Vec<Value>, Error> {
    let ids_provided = batch
        .nodes
        .first()
        .is_some_and(|spec| spec.id_value().is_some());
    if ids_provided {
        run_exec(ctx, driver, stmt)?;
        return Ok(batch
            .nodes
            .iter()
            .filter_map(|spec| spec.id_value().cloned())
            .collect());
    }
    if driver.dialect().adapter().supports_returning() {
        let rows = run_query(ctx, driver, stmt)?;
        if rows.len() != batch.nodes.len() {
            return Err(Error::Driver(
                format!(
                    "batch insert returned {} ids for {} rows",
                    rows.len(),
                    batch.nodes.len()
                )
                .into(),
            ));
        }
        return Ok(rows
            .values
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect());
    }
    // Auto-increment dialects hand back the first id of the batch; rows
    // get consecutive identifiers in insertion order.
    let result = run_exec(ctx, driver, stmt)?;
    let base = result
        .last_insert_id
        .ok_or_else(|| Error::Driver("driver reported no last insert id".into()))?;
    let count = i64::try_from(batch.nodes.len())
        .map_err(|_| Error::Driver("batch too large for id assignment".into()))?;
    Ok((0..count).map(|i| Value::Int(base + i)).collect())
}

/// Connect a node's external edges: foreign keys on other tables are
/// claimed with a guarded UPDATE, join-table rows are inserted with
/// duplicate links ignored.
pub(super) fn add_external_edges(
    ctx: &Context,
    driver: &mut dyn Driver,
    id: &Value,
    edges: &[EdgeSpec],
) -> Result<(), Error> {
    let adapter = driver.dialect().adapter();
    for edge in edges {
        match edge.rel {
            Rel::O2M | Rel::O2O => {
                if edge.target.nodes.is_empty() {
                    continue;
                }
                let fk = edge.fk_column().map_err(Error::from)?.to_string();
                // Claim only unlinked rows; a smaller affected count means
                // some target is connected elsewhere.
                let stmt = UpdateBuilder::new(edge.table.clone())
                    .set(fk.clone(), id.clone())
                    .filter(Predicate::is_in(
                        edge.target.id_column.clone(),
                        edge.target.nodes.clone(),
                    ))
                    .filter(Predicate::is_null(fk))
                    .build(adapter);
                let result = run_exec(ctx, driver, &stmt)?;
                let expected = edge.target.nodes.len() as u64;
                if result.rows_affected != expected {
                    return Err(edge_constraint(
                        adapter,
                        format!(
                            "one of the {:?} rows is missing or already connected",
                            edge.table
                        ),
                    ));
                }
            }
            Rel::M2M => {
                if edge.target.nodes.is_empty() {
                    continue;
                }
                let (out_col, in_col) = edge.join_columns().map_err(Error::from)?;
                let mut columns = vec![out_col.to_string(), in_col.to_string()];
                let extra: Vec<FieldSpec> = edge.target.fields.clone();
                columns.extend(extra.iter().map(|f| f.column.clone()));

                let mut insert =
                    InsertBuilder::new(edge.table.clone()).columns(columns).ignore_conflicts();
                for other in &edge.target.nodes {
                    let (a, b) = if edge.inverse {
                        (other.clone(), id.clone())
                    } else {
                        (id.clone(), other.clone())
                    };
                    let mut row = vec![a, b];
                    row.extend(
                        extra
                            .iter()
                            .map(|f| f.value.clone().unwrap_or(Value::Null)),
                    );
                    insert = insert.values(row);
                    if edge.bidi {
                        let mut mirror = vec![other.clone(), id.clone()];
                        if edge.inverse {
                            mirror = vec![id.clone(), other.clone()];
                        }
                        mirror.extend(
                            extra
                                .iter()
                                .map(|f| f.value.clone().unwrap_or(Value::Null)),
                        );
                        insert = insert.values(mirror);
                    }
                }
                let stmt = insert.build(adapter);
                run_exec(ctx, driver, &stmt)?;
            }
            Rel::M2O => {}
        }
    }
    Ok(())
}

/// Disconnect a node's external edges. An empty target set clears every
/// link; a populated one clears only the listed neighbors.
pub(super) fn clear_external_edges(
    ctx: &Context,
    driver: &mut dyn Driver,
    id: &Value,
    edges: &[EdgeSpec],
) -> Result<(), Error> {
    let adapter = driver.dialect().adapter();
    for edge in edges {
        match edge.rel {
            Rel::O2M | Rel::O2O => {
                let fk = edge.fk_column().map_err(Error::from)?.to_string();
                let mut update = UpdateBuilder::new(edge.table.clone())
                    .set_null(fk.clone())
                    .filter(Predicate::eq(fk, id.clone()));
                if !edge.target.nodes.is_empty() {
                    update = update.filter(Predicate::is_in(
                        edge.target.id_column.clone(),
                        edge.target.nodes.clone(),
                    ));
                }
                let stmt = update.build(adapter);
                run_exec(ctx, driver, &stmt)?;
            }
            Rel::M2M => {
                let (out_col, in_col) = edge.join_columns().map_err(Error::from)?;
                let (self_col, other_col) = if edge.inverse {
                    (in_col, out_col)
                } else {
                    (out_col, in_col)
                };
                let forward = direction_pred(self_col, other_col, id, &edge.target.nodes);
                let pred = if edge.bidi {
                    forward.or(direction_pred(other_col, self_col, id, &edge.target.nodes))
                } else {
                    forward
                };
                let stmt = DeleteBuilder::new(edge.table.clone())
                    .filter(pred)
                    .build(adapter);
                run_exec(ctx, driver, &stmt)?;
            }
            Rel::M2O => {}
        }
    }
    Ok(())
}

fn direction_pred(self_col: &str, other_col: &str, id: &Value, targets: &[Value]) -> Predicate {
    let base = Predicate::eq(self_col, id.clone());
    if targets.is_empty() {
        base
    } else {
        base.and(Predicate::is_in(other_col, targets.to_vec()))
    }
}

fn validate_create(spec: &CreateSpec) -> Result<(), Error> {
    check_columns(
        &spec.node.table,
        &spec.node.columns,
        spec.fields.iter().map(|f| f.column.as_str()),
    )?;
    for field in &spec.fields {
        if field.ty == FieldType::Enum
            && let Some(value) = &field.value
            && !matches!(value, Value::Text(_) | Value::Null)
        {
            return Err(ValidationError::InvalidEnum {
                column: field.column.clone(),
                value: value.to_string(),
            }
            .into());
        }
    }
    for edge in spec.owning_edges() {
        if edge.target.nodes.len() > 1 {
            return Err(ValidationError::MultiNodeFkEdge.into());
        }
    }
    Ok(())
}

/// Ordered (column, value) pairs for the node's own row: the caller-set
/// identifier first, scalar fields in declaration order, then owning-edge
/// foreign keys.
fn row_values(spec: &CreateSpec) -> Result<(Vec<String>, Vec<Value>), Error> {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    if let Some(id) = spec.id_value() {
        columns.push(spec.node.id.column.clone());
        values.push(id.clone());
    }
    for field in &spec.fields {
        columns.push(field.column.clone());
        values.push(field.value.clone().unwrap_or(Value::Null));
    }
    for edge in spec.owning_edges() {
        let fk = edge.fk_column().map_err(Error::from)?.to_string();
        let target = edge.target.nodes.first().cloned().unwrap_or(Value::Null);
        columns.push(fk);
        values.push(target);
    }
    Ok((columns, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dialect::Dialect,
        spec::{EdgeTarget, NodeSpec},
        testing::ScriptedDriver,
    };

    fn users() -> NodeSpec {
        NodeSpec::new(
            "users",
            vec!["id".into(), "name".into(), "age".into()],
            FieldSpec::new("id", FieldType::I64),
        )
    }

    fn named(name: &str) -> CreateSpec {
        CreateSpec::new(users())
            .field(FieldSpec::new("name", FieldType::String).with_value(name))
    }

    #[test]
    fn create_folds_owning_edges_into_the_row() {
        let spec = CreateSpec::new(NodeSpec::new(
            "pets",
            vec!["id".into(), "name".into(), "owner_id".into()],
            FieldSpec::new("id", FieldType::I64),
        ))
        .field(FieldSpec::new("name", FieldType::String).with_value("rex"))
        .edge(
            EdgeSpec::new(Rel::M2O, false, "pets", vec!["owner_id".into()])
                .target(EdgeTarget::new("id", vec![Value::Int(7)])),
        );
        let stmt = compile_create(Dialect::Postgres.adapter(), &spec).expect("compile");
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"pets\" (\"name\", \"owner_id\") VALUES ($1, $2) \
             RETURNING \"id\""
        );
        assert_eq!(stmt.args, vec![Value::Text("rex".into()), Value::Int(7)]);
    }

    #[test]
    fn owning_edge_with_many_targets_is_rejected() {
        let spec = CreateSpec::new(users()).edge(
            EdgeSpec::new(Rel::M2O, false, "users", vec!["group_id".into()])
                .target(EdgeTarget::new("id", vec![Value::Int(1), Value::Int(2)])),
        );
        let err = compile_create(Dialect::Sqlite.adapter(), &spec).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn batch_unions_columns_and_fills_nulls() {
        let with_age = named("a").field(FieldSpec::new("age", FieldType::I64).with_value(30_i64));
        let batch = BatchCreateSpec::new(vec![with_age, named("b")]);

        let mut driver = ScriptedDriver::new(Dialect::Postgres)
            .reply_ids(vec![Value::Int(1), Value::Int(2)]);
        let ids = batch_create(&Context::background(), &mut driver, &batch).expect("batch");
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2)]);

        assert_eq!(
            driver.statement(0),
            "INSERT INTO \"users\" (\"age\", \"name\") VALUES ($1, $2), ($3, $4) \
             RETURNING \"id\""
        );
        assert_eq!(
            driver.args(0),
            vec![
                Value::Int(30),
                Value::Text("a".into()),
                Value::Null,
                Value::Text("b".into()),
            ]
        );
    }

    #[test]
    fn mysql_batch_assigns_consecutive_ids() {
        let batch = BatchCreateSpec::new(vec![named("a"), named("b"), named("c")]);
        let mut driver = ScriptedDriver::new(Dialect::MySql).reply_exec_with_id(3, 10);
        let ids = batch_create(&Context::background(), &mut driver, &batch).expect("batch");
        assert_eq!(ids, vec![Value::Int(10), Value::Int(11), Value::Int(12)]);
    }

    #[test]
    fn fk_edge_claim_shortfall_is_a_constraint_error() {
        let spec = named("a").edge(
            EdgeSpec::new(Rel::O2M, false, "pets", vec!["owner_id".into()])
                .target(EdgeTarget::new("id", vec![Value::Int(1), Value::Int(2)])),
        );
        // Insert succeeds, but only one of two pets rows is claimable.
        let mut driver = ScriptedDriver::new(Dialect::Sqlite)
            .reply_ids(vec![Value::Int(5)])
            .reply_exec(1);
        let err = create_node(&Context::background(), &mut driver, &spec).unwrap_err();
        assert!(err.is_constraint());
        assert!(driver.rolled_back());
    }

    #[test]
    fn m2m_edges_insert_join_rows_with_conflicts_ignored() {
        let spec = named("a").edge(
            EdgeSpec::new(
                Rel::M2M,
                false,
                "user_groups",
                vec!["user_id".into(), "group_id".into()],
            )
            .target(EdgeTarget::new("id", vec![Value::Int(2), Value::Int(3)])),
        );
        let mut driver = ScriptedDriver::new(Dialect::Sqlite)
            .reply_ids(vec![Value::Int(1)])
            .reply_exec(2);
        let id = create_node(&Context::background(), &mut driver, &spec).expect("create");
        assert_eq!(id, Value::Int(1));
        assert_eq!(
            driver.statement(1),
            "INSERT INTO `user_groups` (`user_id`, `group_id`) VALUES (?, ?), (?, ?) \
             ON CONFLICT DO NOTHING"
        );
        assert_eq!(
            driver.args(1),
            vec![Value::Int(1), Value::Int(2), Value::Int(1), Value::Int(3)]
        );
        assert!(driver.committed());
    }
}

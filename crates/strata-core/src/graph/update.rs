use crate::{
    dialect::DialectAdapter,
    driver::{Context, Driver},
    error::{Error, ValidationError},
    graph::{
        check_columns,
        create::{add_external_edges, clear_external_edges},
        predicate_columns, run_exec, run_query, with_txn,
    },
    spec::{EdgeSpec, Predicate, UpdateSpec},
    sql::{SelectBuilder, Statement, UpdateBuilder},
    value::Value,
};

/// Compile the node-row UPDATE for an update spec.
///
/// Clears render as `SET col = NULL`, adds as in-place numeric increments.
/// A column both cleared and set in one spec keeps the set. Owning-side
/// edge changes fold in as foreign-key assignments. The statement is empty
/// (and must not be sent) when only external edges change.
pub fn compile_update(
    adapter: &dyn DialectAdapter,
    spec: &UpdateSpec,
) -> Result<Statement, Error> {
    Ok(update_builder(spec)?.build(adapter))
}

/// Apply an update to one node by identifier.
///
/// External edge changes and the row update run in one transaction. When
/// the row update reports zero affected rows the node is probed: a missing
/// row is [`Error::NotFound`], an unchanged one is success.
pub fn update_node(ctx: &Context, driver: &mut dyn Driver, spec: &UpdateSpec) -> Result<(), Error> {
    let Some(id) = spec.id_value.clone() else {
        return Err(ValidationError::MissingId {
            op: "update",
            table: spec.node.table.clone(),
        }
        .into());
    };
    let builder = update_builder(spec)?;
    let clears: Vec<EdgeSpec> = external(&spec.edges.clear);
    let adds: Vec<EdgeSpec> = external(&spec.edges.add);

    if clears.is_empty() && adds.is_empty() {
        return apply_row_update(ctx, driver, spec, &id, &builder);
    }
    with_txn(ctx, driver, |driver| {
        clear_external_edges(ctx, driver, &id, &clears)?;
        apply_row_update(ctx, driver, spec, &id, &builder)?;
        add_external_edges(ctx, driver, &id, &adds)
    })
}

/// Apply an update to every node matching the predicate, returning the
/// affected-row count.
///
/// Predicate mode has no single identifier to hang join-table or remote
/// foreign-key statements on, so external edge changes are rejected here;
/// owning-side edges still work as column assignments.
pub fn update_nodes(
    ctx: &Context,
    driver: &mut dyn Driver,
    spec: &UpdateSpec,
) -> Result<u64, Error> {
    if !external(&spec.edges.add).is_empty() || !external(&spec.edges.clear).is_empty() {
        return Err(ValidationError::MissingId {
            op: "update external edges",
            table: spec.node.table.clone(),
        }
        .into());
    }
    let builder = update_builder(spec)?;
    if builder.is_empty() {
        return Ok(0);
    }
    let stmt = builder.build(driver.dialect().adapter());
    let result = run_exec(ctx, driver, &stmt)?;
    Ok(result.rows_affected)
}

fn apply_row_update(
    ctx: &Context,
    driver: &mut dyn Driver,
    spec: &UpdateSpec,
    id: &Value,
    builder: &UpdateBuilder,
) -> Result<(), Error> {
    if builder.is_empty() {
        return Ok(());
    }
    let adapter = driver.dialect().adapter();
    let result = run_exec(ctx, driver, &builder.build(adapter))?;
    if result.rows_affected > 0 {
        return Ok(());
    }
    // Zero affected rows is ambiguous: the node may be gone, or the
    // update may have matched but changed nothing. Probe to tell.
    let probe = SelectBuilder::from_table(spec.node.table.clone())
        .columns([spec.node.id.column.clone()])
        .filter(Predicate::eq(spec.node.id.column.clone(), id.clone()))
        .limit(1)
        .build_exists(adapter);
    let rows = run_query(ctx, driver, &probe)?;
    let exists = matches!(
        rows.scalar(),
        Some(Value::Bool(true) | Value::Int(1) | Value::Uint(1))
    );
    if exists {
        Ok(())
    } else {
        Err(Error::NotFound {
            table: spec.node.table.clone(),
            id: id.clone(),
        })
    }
}

fn external(edges: &[EdgeSpec]) -> Vec<EdgeSpec> {
    edges.iter().filter(|e| e.is_external()).cloned().collect()
}

fn update_builder(spec: &UpdateSpec) -> Result<UpdateBuilder, Error> {
    validate_update(spec)?;
    let mut builder = UpdateBuilder::new(spec.node.table.clone());

    // A clear overridden by a set in the same mutation is dropped.
    for field in &spec.fields.clear {
        if spec.fields.set.iter().any(|f| f.column == field.column) {
            continue;
        }
        builder = builder.set_null(field.column.clone());
    }
    for field in &spec.fields.set {
        builder = builder.set(
            field.column.clone(),
            field.value.clone().unwrap_or(Value::Null),
        );
    }
    for field in &spec.fields.add {
        builder = builder.add(
            field.column.clone(),
            field.value.clone().unwrap_or(Value::Null),
        );
    }
    for edge in &spec.edges.clear {
        if edge.is_owning() {
            builder = builder.set_null(edge.fk_column().map_err(Error::from)?.to_string());
        }
    }
    for edge in &spec.edges.add {
        if edge.is_owning() {
            let fk = edge.fk_column().map_err(Error::from)?.to_string();
            let target = edge.target.nodes.first().cloned().unwrap_or(Value::Null);
            builder = builder.set(fk, target);
        }
    }

    if let Some(id) = &spec.id_value {
        builder = builder.filter(Predicate::eq(spec.node.id.column.clone(), id.clone()));
    }
    if let Some(pred) = &spec.predicate {
        builder = builder.filter(pred.clone());
    }
    Ok(builder)
}

fn validate_update(spec: &UpdateSpec) -> Result<(), Error> {
    let fields = spec
        .fields
        .set
        .iter()
        .chain(&spec.fields.add)
        .chain(&spec.fields.clear);
    check_columns(
        &spec.node.table,
        &spec.node.columns,
        fields.map(|f| f.column.as_str()),
    )?;
    if let Some(pred) = &spec.predicate {
        let mut used = Vec::new();
        predicate_columns(pred, &mut used);
        check_columns(&spec.node.table, &spec.node.columns, used)?;
    }
    for field in &spec.fields.add {
        if !field.ty.is_numeric() {
            return Err(ValidationError::NonNumericAdd {
                column: field.column.clone(),
                ty: field.ty,
            }
            .into());
        }
    }
    for edge in spec.edges.add.iter().filter(|e| e.is_owning()) {
        if edge.target.nodes.len() > 1 {
            return Err(ValidationError::MultiNodeFkEdge.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dialect::Dialect,
        spec::{EdgeTarget, FieldSpec, NodeSpec, Rel},
        testing::ScriptedDriver,
        value::FieldType,
    };

    fn users() -> NodeSpec {
        NodeSpec::new(
            "users",
            vec!["id".into(), "name".into(), "age".into(), "nickname".into()],
            FieldSpec::new("id", FieldType::I64),
        )
    }

    #[test]
    fn set_add_and_clear_compile_together() {
        let spec = UpdateSpec::new(users())
            .by_id(3_i64)
            .set(FieldSpec::new("name", FieldType::String).with_value("a"))
            .add(FieldSpec::new("age", FieldType::I64).with_value(1_i64))
            .clear(FieldSpec::new("nickname", FieldType::String));
        let stmt = compile_update(Dialect::MySql.adapter(), &spec).expect("compile");
        assert_eq!(
            stmt.sql,
            "UPDATE `users` SET `nickname` = NULL, `name` = ?, \
             `age` = COALESCE(`age`, 0) + ? WHERE `id` = ?"
        );
        assert_eq!(
            stmt.args,
            vec![Value::Text("a".into()), Value::Int(1), Value::Int(3)]
        );
    }

    #[test]
    fn set_wins_over_clear_on_the_same_column() {
        let spec = UpdateSpec::new(users())
            .by_id(1_i64)
            .clear(FieldSpec::new("name", FieldType::String))
            .set(FieldSpec::new("name", FieldType::String).with_value("kept"));
        let stmt = compile_update(Dialect::Sqlite.adapter(), &spec).expect("compile");
        assert_eq!(stmt.sql, "UPDATE `users` SET `name` = ? WHERE `id` = ?");
    }

    #[test]
    fn add_on_text_column_is_rejected() {
        let spec = UpdateSpec::new(users())
            .by_id(1_i64)
            .add(FieldSpec::new("name", FieldType::String).with_value("x"));
        let err = compile_update(Dialect::Sqlite.adapter(), &spec).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn missing_node_surfaces_not_found() {
        let spec = UpdateSpec::new(users())
            .by_id(9_i64)
            .set(FieldSpec::new("name", FieldType::String).with_value("x"));
        // Update touches nothing, probe says the row is gone.
        let mut driver = ScriptedDriver::new(Dialect::Sqlite)
            .reply_exec(0)
            .reply_scalar(false);
        let err = update_node(&Context::background(), &mut driver, &spec).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unchanged_node_is_not_an_error() {
        let spec = UpdateSpec::new(users())
            .by_id(9_i64)
            .set(FieldSpec::new("name", FieldType::String).with_value("same"));
        let mut driver = ScriptedDriver::new(Dialect::Sqlite)
            .reply_exec(0)
            .reply_scalar(true);
        update_node(&Context::background(), &mut driver, &spec).expect("noop update");
    }

    #[test]
    fn external_edge_changes_wrap_in_a_transaction() {
        let m2m = EdgeSpec::new(
            Rel::M2M,
            false,
            "user_groups",
            vec!["user_id".into(), "group_id".into()],
        );
        let spec = UpdateSpec::new(users())
            .by_id(1_i64)
            .clear_edge(m2m.clone())
            .add_edge(m2m.target(EdgeTarget::new("id", vec![Value::Int(5)])));
        let mut driver = ScriptedDriver::new(Dialect::Sqlite)
            .reply_exec(1)
            .reply_exec(1);
        update_node(&Context::background(), &mut driver, &spec).expect("update");
        assert!(driver.committed());
        assert!(driver.statement(0).starts_with("DELETE FROM `user_groups`"));
        assert!(driver.statement(1).starts_with("INSERT INTO `user_groups`"));
    }

    #[test]
    fn predicate_mode_rejects_external_edges() {
        let spec = UpdateSpec::new(users())
            .filter(Predicate::eq("name", "x"))
            .clear_edge(EdgeSpec::new(
                Rel::O2M,
                false,
                "pets",
                vec!["owner_id".into()],
            ));
        let mut driver = ScriptedDriver::new(Dialect::Sqlite);
        let err = update_nodes(&Context::background(), &mut driver, &spec).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn predicate_mode_returns_the_affected_count() {
        let spec = UpdateSpec::new(users())
            .filter(Predicate::gt("age", 90_i64))
            .set(FieldSpec::new("nickname", FieldType::String).with_value("senior"));
        let mut driver = ScriptedDriver::new(Dialect::Postgres).reply_exec(12);
        let affected = update_nodes(&Context::background(), &mut driver, &spec).expect("update");
        assert_eq!(affected, 12);
        assert_eq!(
            driver.statement(0),
            "UPDATE \"users\" SET \"nickname\" = $1 WHERE \"age\" > $2"
        );
    }
}

use crate::{
    error::ValidationError,
    spec::FieldSpec,
    value::Value,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Rel
///
/// Edge relation kinds. M2O is the inverse perspective of O2M.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Rel {
    O2O,
    O2M,
    M2O,
    M2M,
}

///
/// EdgeTarget
///
/// The target nodes of an edge mutation, plus any additional fields set on
/// an M2M join table row.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EdgeTarget {
    pub nodes: Vec<Value>,
    pub id_column: String,
    pub fields: Vec<FieldSpec>,
}

impl EdgeTarget {
    #[must_use]
    pub fn new(id_column: impl Into<String>, nodes: Vec<Value>) -> Self {
        Self {
            nodes,
            id_column: id_column.into(),
            fields: Vec::new(),
        }
    }
}

///
/// EdgeSpec
///
/// One edge to mutate or traverse. In O2O and M2O, `columns` holds the one
/// foreign-key column; in M2M it holds the two join-table columns.
/// Exactly one side of an O2O/O2M edge owns the foreign key.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EdgeSpec {
    pub rel: Rel,
    pub inverse: bool,
    /// Symmetric one-to-one edge stored twice in the join table.
    pub bidi: bool,
    /// Table where the edge columns reside.
    pub table: String,
    pub columns: Vec<String>,
    pub target: EdgeTarget,
}

impl EdgeSpec {
    #[must_use]
    pub fn new(rel: Rel, inverse: bool, table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            rel,
            inverse,
            bidi: false,
            table: table.into(),
            columns,
            target: EdgeTarget::default(),
        }
    }

    #[must_use]
    pub const fn bidi(mut self) -> Self {
        self.bidi = true;
        self
    }

    #[must_use]
    pub fn target(mut self, target: EdgeTarget) -> Self {
        self.target = target;
        self
    }

    /// M2M edges live in join tables; O2M and non-inverse O2O edges live in
    /// the other entity's table. All of them require statements beyond the
    /// node's own row.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        match self.rel {
            Rel::M2M | Rel::O2M => true,
            Rel::O2O => !self.inverse,
            Rel::M2O => false,
        }
    }

    /// Owning-side edges fold into the node's own row as a column set.
    #[must_use]
    pub const fn is_owning(&self) -> bool {
        match self.rel {
            Rel::M2O => true,
            Rel::O2O => self.inverse || self.bidi,
            Rel::O2M | Rel::M2M => false,
        }
    }

    /// The foreign-key column, for non-M2M edges.
    pub fn fk_column(&self) -> Result<&str, ValidationError> {
        self.expect_columns(1)?;
        Ok(&self.columns[0])
    }

    /// The (out, in) join-table column pair, for M2M edges.
    pub fn join_columns(&self) -> Result<(&str, &str), ValidationError> {
        self.expect_columns(2)?;
        Ok((&self.columns[0], &self.columns[1]))
    }

    fn expect_columns(&self, expected: usize) -> Result<(), ValidationError> {
        if self.columns.len() == expected {
            Ok(())
        } else {
            Err(ValidationError::EdgeColumns {
                table: self.table.clone(),
                expected,
                got: self.columns.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(rel: Rel, inverse: bool) -> EdgeSpec {
        EdgeSpec::new(rel, inverse, "t", vec!["fk".into()])
    }

    #[test]
    fn external_edges_are_the_other_tables() {
        assert!(edge(Rel::M2M, false).is_external());
        assert!(edge(Rel::O2M, false).is_external());
        assert!(edge(Rel::O2O, false).is_external());
        assert!(!edge(Rel::O2O, true).is_external());
        assert!(!edge(Rel::M2O, false).is_external());
    }

    #[test]
    fn owning_edges_fold_into_the_row() {
        assert!(edge(Rel::M2O, false).is_owning());
        assert!(edge(Rel::O2O, true).is_owning());
        assert!(edge(Rel::O2O, false).bidi().is_owning());
        assert!(!edge(Rel::O2M, false).is_owning());
    }

    #[test]
    fn join_columns_require_exactly_two() {
        let m2m = EdgeSpec::new(Rel::M2M, false, "user_groups", vec!["user_id".into()]);
        assert!(m2m.join_columns().is_err());
    }
}

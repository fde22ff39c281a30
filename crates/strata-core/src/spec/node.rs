use crate::value::{FieldType, Value};
use serde::{Deserialize, Serialize};

///
/// FieldSpec
///
/// Describes one column for an insert or update, or the identifier column
/// of a node. The semantic type drives literal encoding; the value is
/// present only when the spec carries data.
///

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FieldSpec {
    pub column: String,
    pub ty: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldSpec {
    #[must_use]
    pub fn new(column: impl Into<String>, ty: FieldType) -> Self {
        Self {
            column: column.into(),
            ty,
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

///
/// NodeSpec
///
/// Identifies one logical table: its ordered column set and identifier
/// column. Invariant: the identifier column is always a member of
/// `columns`.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NodeSpec {
    pub table: String,
    pub columns: Vec<String>,
    pub id: FieldSpec,
}

impl NodeSpec {
    #[must_use]
    pub fn new(table: impl Into<String>, columns: Vec<String>, id: FieldSpec) -> Self {
        Self {
            table: table.into(),
            columns,
            id,
        }
    }

    /// The identifier column must be selectable.
    #[must_use]
    pub fn id_in_columns(&self) -> bool {
        self.columns.iter().any(|c| c == &self.id.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_membership_is_checked_by_name() {
        let node = NodeSpec::new(
            "users",
            vec!["id".into(), "name".into()],
            FieldSpec::new("id", FieldType::I64),
        );
        assert!(node.id_in_columns());

        let broken = NodeSpec::new(
            "users",
            vec!["name".into()],
            FieldSpec::new("id", FieldType::I64),
        );
        assert!(!broken.id_in_columns());
    }
}

use crate::{
    error::ValidationError,
    spec::{EdgeSpec, FieldSpec, NodeSpec},
    value::Value,
};

///
/// CreateSpec
///
/// One node to insert, with its scalar fields and the edges to connect.
/// Owning-side edges fold into the inserted row; external edges become
/// follow-up statements in the same transaction.
///

#[derive(Clone, Debug)]
pub struct CreateSpec {
    pub node: NodeSpec,
    pub fields: Vec<FieldSpec>,
    pub edges: Vec<EdgeSpec>,
}

impl CreateSpec {
    #[must_use]
    pub const fn new(node: NodeSpec) -> Self {
        Self {
            node,
            fields: Vec::new(),
            edges: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn edge(mut self, edge: EdgeSpec) -> Self {
        self.edges.push(edge);
        self
    }

    /// Caller-provided identifier value, when the schema does not
    /// auto-increment.
    #[must_use]
    pub fn id_value(&self) -> Option<&Value> {
        self.node.id.value.as_ref()
    }

    pub(crate) fn owning_edges(&self) -> impl Iterator<Item = &EdgeSpec> {
        self.edges.iter().filter(|e| e.is_owning())
    }

    pub(crate) fn external_edges(&self) -> impl Iterator<Item = &EdgeSpec> {
        self.edges.iter().filter(|e| e.is_external())
    }
}

///
/// BatchCreateSpec
///
/// Several nodes of the same type inserted in one statement. Rows may set
/// different column subsets; the compiler unions them and fills gaps with
/// NULL.
///

#[derive(Clone, Debug)]
pub struct BatchCreateSpec {
    pub nodes: Vec<CreateSpec>,
}

impl BatchCreateSpec {
    #[must_use]
    pub const fn new(nodes: Vec<CreateSpec>) -> Self {
        Self { nodes }
    }

    /// All rows of a batch must target the same table and agree on whether
    /// identifiers are caller-provided.
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let Some(first) = self.nodes.first() else {
            return Ok(());
        };
        let table = &first.node.table;
        let has_ids = first.id_value().is_some();
        for spec in &self.nodes[1..] {
            if &spec.node.table != table {
                return Err(ValidationError::MixedTables {
                    first: table.clone(),
                    other: spec.node.table.clone(),
                });
            }
            if spec.id_value().is_some() != has_ids {
                return Err(ValidationError::InconsistentIds);
            }
        }
        Ok(())
    }
}

use crate::{
    spec::{EdgeSpec, FieldSpec, NodeSpec, Predicate},
    value::Value,
};

///
/// FieldMut
///
/// Scalar mutations on one node type. `add` applies an in-place numeric
/// increment; `clear` sets columns back to NULL. A column cleared and set
/// in the same mutation keeps the set.
///

#[derive(Clone, Debug, Default)]
pub struct FieldMut {
    pub set: Vec<FieldSpec>,
    pub add: Vec<FieldSpec>,
    pub clear: Vec<FieldSpec>,
}

impl FieldMut {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add.is_empty() && self.clear.is_empty()
    }
}

///
/// EdgeMut
///
/// Edges to connect and disconnect. Clearing an edge removes every link;
/// adding connects the listed target nodes.
///

#[derive(Clone, Debug, Default)]
pub struct EdgeMut {
    pub add: Vec<EdgeSpec>,
    pub clear: Vec<EdgeSpec>,
}

impl EdgeMut {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.clear.is_empty()
    }
}

///
/// UpdateSpec
///
/// A mutation over one node (by id) or many (by predicate). With an id,
/// zero affected rows distinguishes "gone" from "unchanged" through an
/// existence probe.
///

#[derive(Clone, Debug)]
pub struct UpdateSpec {
    pub node: NodeSpec,
    /// Single-node mode when set; predicate mode otherwise.
    pub id_value: Option<Value>,
    pub predicate: Option<Predicate>,
    pub fields: FieldMut,
    pub edges: EdgeMut,
}

impl UpdateSpec {
    #[must_use]
    pub fn new(node: NodeSpec) -> Self {
        Self {
            node,
            id_value: None,
            predicate: None,
            fields: FieldMut::default(),
            edges: EdgeMut::default(),
        }
    }

    #[must_use]
    pub fn by_id(mut self, id: impl Into<Value>) -> Self {
        self.id_value = Some(id.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, pred: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(pred),
            None => pred,
        });
        self
    }

    #[must_use]
    pub fn set(mut self, field: FieldSpec) -> Self {
        self.fields.set.push(field);
        self
    }

    #[must_use]
    pub fn add(mut self, field: FieldSpec) -> Self {
        self.fields.add.push(field);
        self
    }

    #[must_use]
    pub fn clear(mut self, field: FieldSpec) -> Self {
        self.fields.clear.push(field);
        self
    }

    #[must_use]
    pub fn add_edge(mut self, edge: EdgeSpec) -> Self {
        self.edges.add.push(edge);
        self
    }

    #[must_use]
    pub fn clear_edge(mut self, edge: EdgeSpec) -> Self {
        self.edges.clear.push(edge);
        self
    }

    /// True when nothing would change any row.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.fields.is_empty() && self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldType;

    #[test]
    fn empty_update_is_a_noop() {
        let node = NodeSpec::new(
            "users",
            vec!["id".into()],
            FieldSpec::new("id", FieldType::I64),
        );
        let spec = UpdateSpec::new(node.clone()).by_id(1_i64);
        assert!(spec.is_noop());

        let spec = UpdateSpec::new(node).set(FieldSpec::new("name", FieldType::String).with_value("x"));
        assert!(!spec.is_noop());
    }
}

use crate::spec::{NodeSpec, Predicate};

///
/// DeleteSpec
///
/// Rows to delete from one table. Edge cleanup is the schema's job: the
/// foreign keys decide whether dependents cascade or block.
///

#[derive(Clone, Debug)]
pub struct DeleteSpec {
    pub node: NodeSpec,
    pub predicate: Option<Predicate>,
}

impl DeleteSpec {
    #[must_use]
    pub const fn new(node: NodeSpec) -> Self {
        Self {
            node,
            predicate: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, pred: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(pred),
            None => pred,
        });
        self
    }
}

use crate::spec::{NodeSpec, OrderBy, Predicate, Step};

///
/// QuerySpec
///
/// A declarative read over one node type, optionally reached through a
/// graph traversal step. Compiled into a single SELECT.
///

#[derive(Clone, Debug)]
pub struct QuerySpec {
    pub node: NodeSpec,
    pub step: Option<Step>,
    pub predicate: Option<Predicate>,
    pub order: Vec<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// None lets the compiler decide: traversals through to-many edges
    /// deduplicate, plain scans do not.
    pub unique: Option<bool>,
}

impl QuerySpec {
    #[must_use]
    pub const fn new(node: NodeSpec) -> Self {
        Self {
            node,
            step: None,
            predicate: None,
            order: Vec::new(),
            limit: None,
            offset: None,
            unique: None,
        }
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.step = Some(step);
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
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }
}

use crate::{spec::Rel, sql::SelectBuilder, value::Value};

///
/// StepSource
///
/// Where a traversal starts: one known vertex id ("neighbors of"
/// semantics), or a selector computing a set of vertices ("set neighbors"
/// semantics).
///

#[derive(Clone, Debug)]
pub enum StepSource {
    Node(Value),
    Selector(Box<SelectBuilder>),
}

///
/// StepFrom
///

#[derive(Clone, Debug)]
pub struct StepFrom {
    pub table: String,
    pub column: String,
    pub source: StepSource,
}

///
/// StepTo
///

#[derive(Clone, Debug)]
pub struct StepTo {
    pub table: String,
    pub column: String,
}

///
/// StepEdge
///

#[derive(Clone, Debug)]
pub struct StepEdge {
    pub rel: Rel,
    pub inverse: bool,
    /// Table where the edge columns reside: the join table for M2M, the
    /// foreign-key owner otherwise.
    pub table: String,
    pub columns: Vec<String>,
}

///
/// Step
///
/// A path step for traversal queries: evaluate the edge from `from` and
/// land on the neighbors in `to`.
///

#[derive(Clone, Debug)]
pub struct Step {
    pub from: StepFrom,
    pub to: StepTo,
    pub edge: StepEdge,
}

impl Step {
    #[must_use]
    pub const fn new(from: StepFrom, to: StepTo, edge: StepEdge) -> Self {
        Self { from, to, edge }
    }

    /// Traversals through a to-many edge can fan out and need DISTINCT
    /// unless the caller disables it.
    #[must_use]
    pub const fn through_to_many(&self) -> bool {
        match self.edge.rel {
            Rel::M2M | Rel::O2M => true,
            Rel::O2O | Rel::M2O => false,
        }
    }
}

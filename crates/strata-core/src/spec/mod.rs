//! The declarative spec model: plain data objects constructed by generated
//! callers and consumed exactly once by the compiler.

mod create;
mod delete;
mod edge;
mod node;
mod predicate;
mod query;
mod step;
mod update;

pub use create::{BatchCreateSpec, CreateSpec};
pub use delete::DeleteSpec;
pub use edge::{EdgeSpec, EdgeTarget, Rel};
pub use node::{FieldSpec, NodeSpec};
pub use predicate::{Direction, OrderBy, Predicate};
pub use query::QuerySpec;
pub use step::{Step, StepEdge, StepFrom, StepSource, StepTo};
pub use update::{EdgeMut, FieldMut, UpdateSpec};

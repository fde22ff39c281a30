//! Strata: a graph-aware SQL compiler and schema migration engine.
//!
//! Applications describe their data as nodes connected by typed edges and
//! their storage as a declarative [`schema::model::Schema`]. Strata turns
//! graph queries and mutations into dialect-specific SQL
//! ([`core::graph`]), and turns schema differences into ordered,
//! executable DDL ([`schema::migrate`]).
//!
//! ## Crate layout
//! - `core`: dialect adapters, value model, SQL builders, the graph
//!   query/mutation compiler, and its execution layer.
//! - `schema`: the declarative schema model, the structural differ, and
//!   the migration executor.
//!
//! Strata never owns a connection. Both halves drive any
//! [`core::driver::Driver`] the embedding application provides, and all
//! compilation is pure and synchronous.

pub use strata_core as core;
pub use strata_schema as schema;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// the combined domain vocabulary of both halves
///

pub mod prelude {
    pub use strata_core::prelude::*;
    pub use strata_schema::prelude::*;
}

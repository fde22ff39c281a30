//! Core runtime for Strata: dialect adapters, the declarative spec model,
//! SQL statement builders, and the graph query/mutation compiler.
//!
//! Everything here is a pure, synchronous transformation over immutable
//! specs. Concurrency is the caller's responsibility; independent specs may
//! be compiled from multiple threads without shared state.

pub mod dialect;
pub mod driver;
pub mod error;
pub mod graph;
pub mod spec;
pub mod sql;
pub mod testing;
pub mod value;

///
/// CONSTANTS
///

/// Default length for string/varchar columns when no size is declared.
pub const DEFAULT_STRING_LEN: u64 = 255;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors, builders, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        dialect::Dialect,
        error::Error,
        spec::{
            CreateSpec, DeleteSpec, EdgeSpec, FieldSpec, NodeSpec, Predicate, QuerySpec, Rel,
            UpdateSpec,
        },
        value::{FieldType, Value},
    };
}

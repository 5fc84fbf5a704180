//! # Kildall Dataflow Instantiation
//!
//! Specializes the fixed-point engine for the classical IN/OUT/edge-variable
//! dataflow pattern over a client-supplied flow graph: one IN variable per
//! node, optionally one OUT variable per node and one variable per edge,
//! meet equations at confluence points, transfer equations everywhere else.
//! Identity transfers and single-predecessor no-op meets are short-circuited
//! away with a union-find pass before any statement is materialized.
//!
//! ## References
//! - Kildall, G. "A Unified Approach to Global Program Optimization" (POPL 1973)
//! - Kam & Ullman "Monotone Data Flow Analysis Frameworks" (Acta Inf. 1977)

pub mod domain;
pub mod infrastructure;

pub use domain::ports::{DataflowProblem, TransferFunctions};
pub use infrastructure::solver::DataflowSolver;
pub use infrastructure::union_find::IntegerUnionFind;

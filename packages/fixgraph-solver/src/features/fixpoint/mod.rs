//! # Generic Fixed-Point Equation System
//!
//! Kildall-style iterative solver core: a bipartite graph of lattice
//! variables and monotone equations ("statements"), driven to a least fixed
//! point by a priority worklist that approximates topological order.
//!
//! ## Key Components
//! - **Variable arena**: lattice values behind stable `u32` handles, each
//!   carrying a mutable order number used for scheduling
//! - **Operator**: pure nullary/unary/general function from operand values
//!   to a fresh left-hand value
//! - **Equation graph**: dependency structure driving re-evaluation
//! - **Worklist**: min-heap over pending statements by lhs order number
//! - **Solver driver**: fixed-point loop with amortized topological
//!   re-ordering
//!
//! ## References
//! - Kildall, G. "A Unified Approach to Global Program Optimization" (POPL 1973)
//! - Kam & Ullman "Monotone Data Flow Analysis Frameworks" (Acta Inf. 1977)
//! - Tarjan, R. "Depth-First Search and Linear Graph Algorithms" (1972)

pub mod domain;
pub mod infrastructure;

pub use domain::cancel::CancelToken;
pub use domain::operator::{EvalResult, Operator, OperatorKind};
pub use domain::statement::{Statement, StmtId};
pub use domain::variable::{VarId, VariableArena};
pub use infrastructure::equation_graph::EquationGraph;
pub use infrastructure::solver::{FixpointSolver, SolverConfig, SolverStats};
pub use infrastructure::worklist::Worklist;

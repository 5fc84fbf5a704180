/*
 * fixgraph-solver - Iterative Fixed-Point Equation Solver
 *
 * Feature-First Architecture:
 * - features/fixpoint/  : Generic equation system (variables, operators,
 *                         statements, equation graph, worklist, driver)
 * - features/dataflow/  : Kildall-style dataflow instantiation over a
 *                         client-supplied flow graph
 * - features/bitvector/ : Concrete bit-vector lattice family used by most
 *                         client analyses
 *
 * The solver computes, for a graph of abstract values related by monotone
 * equations, the least fixed point consistent with those equations. Clients
 * assemble a problem (flow graph + transfer functions); the solver owns
 * scheduling, convergence, and short-circuit simplification.
 */

/// Feature modules
pub mod features;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use errors::{Result, SolverError};

pub use features::fixpoint::{
    CancelToken, EvalResult, FixpointSolver, Operator, OperatorKind, SolverConfig, SolverStats,
    Statement, StmtId, VarId,
};

pub use features::dataflow::{DataflowProblem, DataflowSolver, TransferFunctions};

pub use features::bitvector::{
    BitVector, BitVectorOp, BitVectorRepository, BooleanOp, OrdinalDomain,
};

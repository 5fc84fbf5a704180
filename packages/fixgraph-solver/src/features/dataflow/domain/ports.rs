//! Ports (interfaces) between client analyses and the dataflow solver
//!
//! A client supplies a *problem definition*: a directed flow graph over its
//! own node type plus a provider of per-node and per-edge transfer functions
//! and a meet operator. The solver consumes nothing else, and exposes its
//! results only through the IN/OUT/edge accessors on `DataflowSolver`.

use std::fmt;

use petgraph::graph::DiGraph;

use crate::features::fixpoint::domain::operator::Operator;

/// Provider of the transfer functions and meet operator for one analysis.
///
/// `has_node_transfer_functions` / `has_edge_transfer_functions` decide
/// which result variables get materialized; the corresponding getters are
/// invoked only when the matching flag returns true.
pub trait TransferFunctions<N> {
    /// Lattice value at each program point. `Default` is the lattice bottom
    /// used to seed fresh variables.
    type Value: Clone + PartialEq + Default + fmt::Debug;

    /// Operator family for this lattice.
    type Op: Operator<Self::Value>;

    /// The meet combining values at confluence points.
    fn meet_operator(&self) -> Self::Op;

    fn has_node_transfer_functions(&self) -> bool;

    fn has_edge_transfer_functions(&self) -> bool;

    /// Transfer function of one node; called only when
    /// `has_node_transfer_functions()` is true.
    fn node_transfer_function(&self, node: &N) -> Self::Op;

    /// Transfer function of one edge; called only when
    /// `has_edge_transfer_functions()` is true.
    fn edge_transfer_function(&self, src: &N, dst: &N) -> Self::Op;

    /// Initial value for a node's IN (`is_in`) or OUT variable.
    fn make_node_variable(&self, _node: &N, _is_in: bool) -> Self::Value {
        Self::Value::default()
    }

    /// Initial value for an edge variable.
    fn make_edge_variable(&self, _src: &N, _dst: &N) -> Self::Value {
        Self::Value::default()
    }
}

/// A complete dataflow problem: the flow graph being analyzed plus the
/// transfer functions over it.
pub trait DataflowProblem<N> {
    type Functions: TransferFunctions<N>;

    fn flow_graph(&self) -> &DiGraph<N, ()>;

    fn transfer_functions(&self) -> &Self::Functions;
}

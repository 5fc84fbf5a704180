//! Iterative solver for a Kildall dataflow problem
//!
//! Creates one IN variable per flow-graph node, one OUT variable per node
//! when node transfer functions are provided, and one variable per edge when
//! edge transfer functions are provided, then builds the equation system:
//!
//! - `IN(n)   = meet(flow into n from each predecessor)`
//! - `OUT(n)  = f_n(IN(n))` for non-identity node transfers
//! - `EDGE(s,d) = f_sd(OUT(s) or IN(s))` for non-identity edge transfers
//!
//! Before any statement is materialized, a union-find pass collapses slots
//! that are mathematically equal: a single-predecessor IN under a unary
//! no-op meet is the predecessor's outflow, and the target of an identity
//! transfer is its source. Collapsed slots are redirected to the surviving
//! representative's variable, shrinking both statement count and evaluation
//! count with no change in solved values.

use std::fmt;
use std::marker::PhantomData;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::errors::{Result, SolverError};
use crate::features::fixpoint::domain::cancel::CancelToken;
use crate::features::fixpoint::domain::operator::Operator;
use crate::features::fixpoint::domain::variable::VarId;
use crate::features::fixpoint::infrastructure::solver::{FixpointSolver, SolverConfig};

use super::super::domain::ports::{DataflowProblem, TransferFunctions};
use super::union_find::IntegerUnionFind;

type ValueOf<N, P> = <<P as DataflowProblem<N>>::Functions as TransferFunctions<N>>::Value;
type OpOf<N, P> = <<P as DataflowProblem<N>>::Functions as TransferFunctions<N>>::Op;

/// Fixed-point solver specialized for the IN/OUT/edge dataflow pattern.
pub struct DataflowSolver<N, P: DataflowProblem<N>> {
    problem: P,
    engine: FixpointSolver<ValueOf<N, P>, OpOf<N, P>>,
    node_in: FxHashMap<NodeIndex, VarId>,
    node_out: FxHashMap<NodeIndex, VarId>,
    edge_var: FxHashMap<(NodeIndex, NodeIndex), VarId>,
    short_circuit: bool,
    first_solve: bool,
    _node: PhantomData<N>,
}

impl<N, P: DataflowProblem<N>> DataflowSolver<N, P> {
    pub fn new(problem: P) -> Self {
        Self::with_config(problem, SolverConfig::default())
    }

    pub fn with_config(problem: P, config: SolverConfig) -> Self {
        DataflowSolver {
            problem,
            engine: FixpointSolver::with_config(config),
            node_in: FxHashMap::default(),
            node_out: FxHashMap::default(),
            edge_var: FxHashMap::default(),
            short_circuit: true,
            first_solve: true,
            _node: PhantomData,
        }
    }

    /// Enable or disable the identity/no-op short-circuit optimization.
    /// Defaults to enabled; solved values are identical either way.
    pub fn with_short_circuiting(mut self, enabled: bool) -> Self {
        self.short_circuit = enabled;
        self
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn engine(&self) -> &FixpointSolver<ValueOf<N, P>, OpOf<N, P>> {
        &self.engine
    }

    pub fn empty_worklist(&self) -> bool {
        self.engine.empty_worklist()
    }

    /// Run to a fixed point (or until `cancel` fires). The first call builds
    /// variables and equations; later calls resume iteration on whatever is
    /// still pending. Returns whether any variable changed during this call.
    pub fn solve(&mut self, cancel: &CancelToken) -> Result<bool> {
        if self.first_solve {
            self.init_for_first_solve()?;
            self.first_solve = false;
        }
        self.engine.solve(cancel)
    }

    /// Solved value flowing into `node`
    pub fn get_in(&self, node: NodeIndex) -> Result<&ValueOf<N, P>> {
        Ok(self.engine.value(self.in_variable(node)?))
    }

    /// Solved value flowing out of `node`; fails when the provider declared
    /// no node transfer functions.
    pub fn get_out(&self, node: NodeIndex) -> Result<&ValueOf<N, P>> {
        Ok(self.engine.value(self.out_variable(node)?))
    }

    /// Solved value on the edge `src -> dst`; fails when the provider
    /// declared no edge transfer functions.
    pub fn get_edge(&self, src: NodeIndex, dst: NodeIndex) -> Result<&ValueOf<N, P>> {
        Ok(self.engine.value(self.edge_variable(src, dst)?))
    }

    pub fn in_variable(&self, node: NodeIndex) -> Result<VarId> {
        self.node_in.get(&node).copied().ok_or_else(|| {
            SolverError::missing_variable(format!("no IN variable for node {:?}", node))
        })
    }

    pub fn out_variable(&self, node: NodeIndex) -> Result<VarId> {
        self.node_out.get(&node).copied().ok_or_else(|| {
            SolverError::missing_variable(format!(
                "no OUT variable for node {:?}; node transfer functions were not requested",
                node
            ))
        })
    }

    pub fn edge_variable(&self, src: NodeIndex, dst: NodeIndex) -> Result<VarId> {
        self.edge_var.get(&(src, dst)).copied().ok_or_else(|| {
            SolverError::missing_variable(format!(
                "no variable for edge {:?} -> {:?}; edge transfer functions were not requested",
                src, dst
            ))
        })
    }

    fn init_for_first_solve(&mut self) -> Result<()> {
        self.initialize_variables();
        self.build_equations(true)?;
        // number everything topologically before iteration starts
        self.engine.reorder_statements();
        Ok(())
    }

    /// Create the variable slots the problem definition calls for.
    fn initialize_variables(&mut self) {
        let g = self.problem.flow_graph();
        let f = self.problem.transfer_functions();
        for n in g.node_indices() {
            let var = self.engine.make_variable(f.make_node_variable(&g[n], true));
            self.node_in.insert(n, var);
            if f.has_node_transfer_functions() {
                let var = self.engine.make_variable(f.make_node_variable(&g[n], false));
                self.node_out.insert(n, var);
            }
        }
        if f.has_edge_transfer_functions() {
            for e in g.edge_references() {
                let key = (e.source(), e.target());
                let var = self
                    .engine
                    .make_variable(f.make_edge_variable(&g[key.0], &g[key.1]));
                self.edge_var.insert(key, var);
            }
        }
    }

    /// Materialize the equation system, applying the short-circuit pass
    /// first so redundant identity/no-op equations are never created.
    fn build_equations(&mut self, to_worklist: bool) -> Result<()> {
        let meet = self.problem.transfer_functions().meet_operator();

        if self.short_circuit {
            let mut uf = SlotUnionFind::new(&self.node_in, &self.node_out, &self.edge_var);
            if meet.is_unary_noop() {
                self.short_circuit_unary_meets(&mut uf)?;
            }
            self.short_circuit_identities(&mut uf)?;
            self.fix_short_circuits(&mut uf)?;
        }

        // a unary-no-op meet over one collapsed predecessor is redundant
        let meet_threshold = if self.short_circuit && meet.is_unary_noop() {
            2
        } else {
            1
        };

        let g = self.problem.flow_graph();
        let f = self.problem.transfer_functions();

        for n in g.node_indices() {
            let preds: Vec<NodeIndex> = g.neighbors_directed(n, Direction::Incoming).collect();
            if preds.len() >= meet_threshold {
                let mut rhs = Vec::with_capacity(preds.len());
                for &p in &preds {
                    rhs.push(self.flow_source_variable(p, n)?);
                }
                let lhs = self.in_variable(n)?;
                self.engine
                    .new_general_statement(Some(lhs), meet.clone(), rhs, to_worklist)?;
            }
        }

        if f.has_node_transfer_functions() {
            for n in g.node_indices() {
                let tf = f.node_transfer_function(&g[n]);
                if self.short_circuit && tf.is_identity() {
                    continue;
                }
                let lhs = self.out_variable(n)?;
                let rhs = self.in_variable(n)?;
                self.engine.new_unary_statement(lhs, tf, rhs, to_worklist)?;
            }
        }

        if f.has_edge_transfer_functions() {
            for e in g.edge_references() {
                let (s, d) = (e.source(), e.target());
                let tf = f.edge_transfer_function(&g[s], &g[d]);
                if self.short_circuit && tf.is_identity() {
                    continue;
                }
                let lhs = self.edge_variable(s, d)?;
                let rhs = if f.has_node_transfer_functions() {
                    self.out_variable(s)?
                } else {
                    self.in_variable(s)?
                };
                self.engine.new_unary_statement(lhs, tf, rhs, to_worklist)?;
            }
        }

        debug!(
            statements = self.engine.graph().statement_count(),
            variables = self.engine.variables().len(),
            "equation system built"
        );
        Ok(())
    }

    /// The variable carrying flow from `pred` into `node`: the edge variable
    /// when edge transfers exist, else `pred`'s OUT, else `pred`'s IN.
    fn flow_source_variable(&self, pred: NodeIndex, node: NodeIndex) -> Result<VarId> {
        let f = self.problem.transfer_functions();
        if f.has_edge_transfer_functions() {
            self.edge_variable(pred, node)
        } else if f.has_node_transfer_functions() {
            self.out_variable(pred)
        } else {
            self.in_variable(pred)
        }
    }

    /// Union a single-predecessor node's IN with the predecessor's outflow:
    /// a unary-no-op meet over one operand is the operand.
    fn short_circuit_unary_meets(&self, uf: &mut SlotUnionFind) -> Result<()> {
        let g = self.problem.flow_graph();
        let f = self.problem.transfer_functions();
        for n in g.node_indices() {
            let mut preds = g.neighbors_directed(n, Direction::Incoming);
            let first = preds.next();
            if let (Some(p), None) = (first, preds.next()) {
                let a = uf.in_slot(n)?;
                let b = if f.has_edge_transfer_functions() {
                    uf.edge_slot(p, n)?
                } else if f.has_node_transfer_functions() {
                    uf.out_slot(p)?
                } else {
                    uf.in_slot(p)?
                };
                uf.union(a, b);
            }
        }
        Ok(())
    }

    /// Union the target of every identity transfer with its source.
    fn short_circuit_identities(&self, uf: &mut SlotUnionFind) -> Result<()> {
        let g = self.problem.flow_graph();
        let f = self.problem.transfer_functions();

        if f.has_node_transfer_functions() {
            for n in g.node_indices() {
                if f.node_transfer_function(&g[n]).is_identity() {
                    let a = uf.in_slot(n)?;
                    let b = uf.out_slot(n)?;
                    uf.union(a, b);
                }
            }
        }

        if f.has_edge_transfer_functions() {
            for e in g.edge_references() {
                let (s, d) = (e.source(), e.target());
                if f.edge_transfer_function(&g[s], &g[d]).is_identity() {
                    let a = uf.edge_slot(s, d)?;
                    let b = if f.has_node_transfer_functions() {
                        uf.out_slot(s)?
                    } else {
                        uf.in_slot(s)?
                    };
                    uf.union(a, b);
                }
            }
        }
        Ok(())
    }

    /// Redirect every collapsed slot to its representative's variable.
    fn fix_short_circuits(&mut self, uf: &mut SlotUnionFind) -> Result<()> {
        if !uf.changed {
            return Ok(());
        }
        let mut redirected = 0usize;
        for i in 0..uf.total() {
            let rep = uf.find(i);
            if rep == i {
                continue;
            }
            let rep_var = self.slot_variable(uf, rep)?;
            match uf.slot_key(i) {
                SlotKey::In(n) => {
                    self.node_in.insert(n, rep_var);
                }
                SlotKey::Out(n) => {
                    self.node_out.insert(n, rep_var);
                }
                SlotKey::Edge(key) => {
                    self.edge_var.insert(key, rep_var);
                }
            }
            redirected += 1;
        }
        debug!(redirected, "short-circuited variable slots");
        Ok(())
    }

    fn slot_variable(&self, uf: &SlotUnionFind, slot: usize) -> Result<VarId> {
        match uf.slot_key(slot) {
            SlotKey::In(n) => self.in_variable(n),
            SlotKey::Out(n) => self.out_variable(n),
            SlotKey::Edge((s, d)) => self.edge_variable(s, d),
        }
    }
}

impl<N, P: DataflowProblem<N>> fmt::Debug for DataflowSolver<N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataflowSolver")
            .field("nodes", &self.node_in.len())
            .field("outs", &self.node_out.len())
            .field("edges", &self.edge_var.len())
            .field("short_circuit", &self.short_circuit)
            .field("first_solve", &self.first_solve)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKey {
    In(NodeIndex),
    Out(NodeIndex),
    Edge((NodeIndex, NodeIndex)),
}

/// Union-find over the variable slots (all IN slots, then all OUT slots,
/// then all edge slots), identifying slots whose variables must be one.
struct SlotUnionFind {
    uf: IntegerUnionFind,
    in_nodes: Vec<NodeIndex>,
    out_nodes: Vec<NodeIndex>,
    edge_keys: Vec<(NodeIndex, NodeIndex)>,
    in_pos: FxHashMap<NodeIndex, usize>,
    out_pos: FxHashMap<NodeIndex, usize>,
    edge_pos: FxHashMap<(NodeIndex, NodeIndex), usize>,
    changed: bool,
}

impl SlotUnionFind {
    fn new(
        node_in: &FxHashMap<NodeIndex, VarId>,
        node_out: &FxHashMap<NodeIndex, VarId>,
        edge_var: &FxHashMap<(NodeIndex, NodeIndex), VarId>,
    ) -> Self {
        let in_nodes: Vec<NodeIndex> = node_in.keys().copied().collect();
        let out_nodes: Vec<NodeIndex> = node_out.keys().copied().collect();
        let edge_keys: Vec<(NodeIndex, NodeIndex)> = edge_var.keys().copied().collect();

        let in_pos = in_nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let out_pos = out_nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let edge_pos = edge_keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();

        let total = in_nodes.len() + out_nodes.len() + edge_keys.len();
        SlotUnionFind {
            uf: IntegerUnionFind::new(total),
            in_nodes,
            out_nodes,
            edge_keys,
            in_pos,
            out_pos,
            edge_pos,
            changed: false,
        }
    }

    fn total(&self) -> usize {
        self.uf.len()
    }

    fn in_slot(&self, n: NodeIndex) -> Result<usize> {
        self.in_pos
            .get(&n)
            .copied()
            .ok_or_else(|| SolverError::internal(format!("node {:?} has no IN slot", n)))
    }

    fn out_slot(&self, n: NodeIndex) -> Result<usize> {
        self.out_pos
            .get(&n)
            .map(|&p| self.in_nodes.len() + p)
            .ok_or_else(|| SolverError::internal(format!("node {:?} has no OUT slot", n)))
    }

    fn edge_slot(&self, src: NodeIndex, dst: NodeIndex) -> Result<usize> {
        self.edge_pos
            .get(&(src, dst))
            .map(|&p| self.in_nodes.len() + self.out_nodes.len() + p)
            .ok_or_else(|| {
                SolverError::internal(format!("edge {:?} -> {:?} has no slot", src, dst))
            })
    }

    fn slot_key(&self, slot: usize) -> SlotKey {
        if slot < self.in_nodes.len() {
            SlotKey::In(self.in_nodes[slot])
        } else if slot < self.in_nodes.len() + self.out_nodes.len() {
            SlotKey::Out(self.out_nodes[slot - self.in_nodes.len()])
        } else {
            SlotKey::Edge(self.edge_keys[slot - self.in_nodes.len() - self.out_nodes.len()])
        }
    }

    fn union(&mut self, a: usize, b: usize) {
        self.uf.union(a, b);
        self.changed = true;
    }

    fn find(&mut self, slot: usize) -> usize {
        self.uf.find(slot)
    }
}

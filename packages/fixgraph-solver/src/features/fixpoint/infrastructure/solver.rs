//! Fixed-point solver driver
//!
//! Owns the equation graph, variable arena, and worklist, and iterates to a
//! fixed point. Statements are popped in (approximate) topological order;
//! when an evaluation changes a variable, every statement using that
//! variable is re-scheduled. The ordering is refreshed by a full topological
//! renumbering whenever the equation system has grown enough, or enough
//! evaluations have happened, since the last one — a full reorder is O(graph
//! size) and must be amortized against the evaluations it saves.

use std::fmt;
use std::hash::Hash;

use serde::Serialize;
use tracing::{debug, trace};

use crate::errors::{Result, SolverError};
use crate::features::fixpoint::domain::cancel::CancelToken;
use crate::features::fixpoint::domain::operator::{EvalResult, Operator, OperatorKind};
use crate::features::fixpoint::domain::statement::{Statement, StmtId};
use crate::features::fixpoint::domain::variable::{VarId, VariableArena};

use super::equation_graph::EquationGraph;
use super::topo_order::{self, TopoNode};
use super::worklist::Worklist;

/// Driver tunables.
///
/// The reorder heuristics are tuning constants with no closed-form optimum;
/// they are parameters rather than hard-coded values.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Minimum statement count before growth-triggered reorders kick in.
    pub min_size_for_topsort: usize,

    /// Reorder when new statements since the last reorder, divided by the
    /// live statement count, exceed this fraction.
    pub topological_growth_factor: f64,

    /// Reorder after this many evaluations regardless of growth; many
    /// evaluations can be a sign of a bad ordering even when few new
    /// statements are being added.
    pub max_eval_between_topo: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_size_for_topsort: 0,
            topological_growth_factor: 0.1,
            max_eval_between_topo: 500_000,
        }
    }
}

/// Counters accumulated across `solve()` calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolverStats {
    pub evaluations: usize,
    pub changed_evaluations: usize,
    pub statements_created: usize,
    pub statements_removed: usize,
    pub reorders: usize,
}

/// Iterative fixed-point solver over a generic lattice `V` and operator
/// family `O`.
///
/// Convergence requires the client to install only monotone operators over a
/// finite-height lattice; the solver does not verify this.
#[derive(Debug)]
pub struct FixpointSolver<V, O> {
    graph: EquationGraph<O>,
    variables: VariableArena<V>,
    worklist: Worklist,
    config: SolverConfig,
    stats: SolverStats,
    /// Next order number handed to the lhs of a newly created statement.
    next_order_number: u32,
    /// Statements added since the last topological reorder.
    topological_counter: usize,
    evaluations_at_last_ordering: usize,
}

impl<V, O> Default for FixpointSolver<V, O>
where
    V: Clone + PartialEq + fmt::Debug,
    O: Operator<V>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, O> FixpointSolver<V, O>
where
    V: Clone + PartialEq + fmt::Debug,
    O: Operator<V>,
{
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        FixpointSolver {
            graph: EquationGraph::new(),
            variables: VariableArena::new(),
            worklist: Worklist::new(),
            config,
            stats: SolverStats::default(),
            next_order_number: 1,
            topological_counter: 0,
            evaluations_at_last_ordering: 0,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn graph(&self) -> &EquationGraph<O> {
        &self.graph
    }

    pub fn variables(&self) -> &VariableArena<V> {
        &self.variables
    }

    /// Allocate a fresh lattice variable seeded with `initial`.
    pub fn make_variable(&mut self, initial: V) -> VarId {
        let v = self.variables.alloc(initial);
        self.graph.register_variable(v);
        v
    }

    /// Current value of a variable
    pub fn value(&self, v: VarId) -> &V {
        self.variables.value(v)
    }

    pub fn new_nullary_statement(&mut self, lhs: VarId, op: O, to_worklist: bool) -> Result<bool> {
        self.add_statement(Statement::nullary(lhs, op), to_worklist)
    }

    pub fn new_unary_statement(
        &mut self,
        lhs: VarId,
        op: O,
        rhs: VarId,
        to_worklist: bool,
    ) -> Result<bool> {
        self.add_statement(Statement::unary(lhs, op, rhs), to_worklist)
    }

    pub fn new_general_statement(
        &mut self,
        lhs: Option<VarId>,
        op: O,
        rhs: Vec<VarId>,
        to_worklist: bool,
    ) -> Result<bool> {
        self.add_statement(Statement::general(lhs, op, rhs), to_worklist)
    }

    /// Insert one equation. Returns `Ok(false)` without any mutation when a
    /// structurally equal statement is already in the graph.
    pub fn add_statement(&mut self, stmt: Statement<O>, to_worklist: bool) -> Result<bool> {
        self.check_shape(&stmt)?;
        let Some(sid) = self.graph.add_statement(stmt) else {
            return Ok(false);
        };
        if let Some(lhs) = self.graph.statement(sid).and_then(|s| s.lhs) {
            self.variables.set_order(lhs, self.next_order_number);
            self.next_order_number += 1;
        }
        self.stats.statements_created += 1;
        self.topological_counter += 1;
        if to_worklist {
            let key = order_key(&self.graph, &self.variables, sid);
            self.worklist.insert(sid, key);
        }
        Ok(true)
    }

    fn check_shape(&self, stmt: &Statement<O>) -> Result<()> {
        match stmt.op.kind() {
            OperatorKind::Nullary => {
                if stmt.lhs.is_none() {
                    return Err(SolverError::invalid_argument(
                        "nullary statement requires a left-hand side",
                    ));
                }
                if !stmt.rhs.is_empty() {
                    return Err(SolverError::invalid_argument(format!(
                        "nullary operator takes no operands, got {}",
                        stmt.rhs.len()
                    )));
                }
            }
            OperatorKind::Unary => {
                if stmt.lhs.is_none() {
                    return Err(SolverError::invalid_argument(
                        "unary statement requires a left-hand side",
                    ));
                }
                if stmt.rhs.len() != 1 {
                    return Err(SolverError::invalid_argument(format!(
                        "unary operator takes exactly one operand, got {}",
                        stmt.rhs.len()
                    )));
                }
            }
            OperatorKind::General => {}
        }
        Ok(())
    }

    /// Schedule one statement for (re-)evaluation.
    pub fn add_to_worklist(&mut self, sid: StmtId) {
        let key = order_key(&self.graph, &self.variables, sid);
        self.worklist.insert(sid, key);
    }

    /// Schedule every live statement.
    pub fn add_all_statements_to_worklist(&mut self) {
        let ids: Vec<StmtId> = self.graph.statement_ids().collect();
        for sid in ids {
            self.add_to_worklist(sid);
        }
    }

    /// Dependency propagation: the contents of `v` changed, so every
    /// statement using `v` must be re-evaluated.
    pub fn changed_variable(&mut self, v: VarId) {
        for &sid in self.graph.statements_that_use(v) {
            let key = order_key(&self.graph, &self.variables, sid);
            self.worklist.insert(sid, key);
        }
    }

    pub fn empty_worklist(&self) -> bool {
        self.worklist.is_empty()
    }

    /// Iterate until the worklist is empty or `cancel` fires.
    ///
    /// Returns whether the evaluation of any statement changed the value of
    /// any variable during this call. On cancellation the graph and worklist
    /// stay valid: statements not yet evaluated remain pending, and a later
    /// `solve()` resumes from them.
    pub fn solve(&mut self, cancel: &CancelToken) -> Result<bool> {
        let mut global_change = false;
        while !self.worklist.is_empty() {
            if cancel.is_cancelled() {
                debug!(pending = self.worklist.len(), "solve cancelled");
                return Err(SolverError::Cancelled);
            }
            self.reorder_if_needed();
            let Some(sid) = self.worklist.pop() else { break };
            let code = self.evaluate(sid)?;
            self.stats.evaluations += 1;
            if code.is_changed() {
                global_change = true;
                self.stats.changed_evaluations += 1;
                if let Some(lhs) = self.graph.statement(sid).and_then(|s| s.lhs) {
                    self.changed_variable(lhs);
                }
            }
            if code.is_fixed() {
                self.remove_statement(sid);
            }
        }
        debug!(
            evaluations = self.stats.evaluations,
            changed = global_change,
            "worklist drained"
        );
        Ok(global_change)
    }

    /// Evaluate one statement: apply its operator and commit the fresh value
    /// when it differs from the current one. The single side-effecting
    /// primitive of the engine.
    fn evaluate(&mut self, sid: StmtId) -> Result<EvalResult> {
        let stmt = self.graph.statement(sid).ok_or_else(|| {
            SolverError::internal(format!("scheduled statement {sid} is not in the graph"))
        })?;
        let lhs = stmt.lhs.ok_or_else(|| {
            SolverError::invalid_argument(format!(
                "statement {sid} has no left-hand side to evaluate into"
            ))
        })?;
        let mut rhs_values: Vec<&V> = Vec::with_capacity(stmt.rhs.len());
        for &r in &stmt.rhs {
            rhs_values.push(self.variables.value(r));
        }
        let fresh = stmt.op.apply(self.variables.value(lhs), &rhs_values);
        let fixed = stmt.op.fixes_after_evaluation();
        let changed = fresh != *self.variables.value(lhs);
        if changed {
            *self.variables.value_mut(lhs) = fresh;
        }
        Ok(match (changed, fixed) {
            (true, true) => EvalResult::CHANGED_AND_FIXED,
            (true, false) => EvalResult::CHANGED,
            (false, true) => EvalResult::NOT_CHANGED_AND_FIXED,
            (false, false) => EvalResult::NOT_CHANGED,
        })
    }

    /// Permanently remove a statement from the system.
    pub fn remove_statement(&mut self, sid: StmtId) {
        if self.graph.remove_statement(sid) {
            self.worklist.remove(sid);
            self.stats.statements_removed += 1;
            trace!(%sid, "removed fixed statement");
        }
    }

    fn reorder_if_needed(&mut self) {
        let total = self.graph.statement_count();
        if total > self.config.min_size_for_topsort && total > 0 {
            let growth = self.topological_counter as f64 / total as f64;
            if growth > self.config.topological_growth_factor {
                self.reorder_statements();
                return;
            }
        }
        if self.stats.evaluations - self.evaluations_at_last_ordering
            > self.config.max_eval_between_topo
        {
            self.reorder_statements();
        }
    }

    /// Renumber every variable in topological traversal order and re-key the
    /// pending worklist under the fresh numbering.
    pub fn reorder_statements(&mut self) {
        debug!(
            statements = self.graph.statement_count(),
            evaluations = self.stats.evaluations,
            "topological reorder"
        );
        let order = topo_order::scc_topological_order(&self.graph);
        let mut number = 0u32;
        for node in order {
            if let TopoNode::Variable(v) = node {
                self.variables.set_order(v, number);
                number += 1;
            }
        }
        self.next_order_number = number;
        let pending = self.worklist.drain_pending();
        for sid in pending {
            let key = order_key(&self.graph, &self.variables, sid);
            self.worklist.insert(sid, key);
        }
        self.topological_counter = 0;
        self.evaluations_at_last_ordering = self.stats.evaluations;
        self.stats.reorders += 1;
    }
}

/// Worklist priority of a statement: its lhs order number; statements with
/// no lhs sort last.
fn order_key<V, O: Clone + Eq + Hash>(
    graph: &EquationGraph<O>,
    variables: &VariableArena<V>,
    sid: StmtId,
) -> u32 {
    graph
        .statement(sid)
        .and_then(|s| s.lhs)
        .map(|lhs| variables.order(lhs))
        .unwrap_or(u32::MAX)
}

//! Bipartite equation graph
//!
//! Nodes are the union of all variables and all statements. An edge runs
//! from each right-hand variable to its statement and from the statement to
//! its left-hand variable; this is the dependency structure that drives
//! re-evaluation. Invariant after every insertion/removal: a variable's
//! successors are exactly the statements that use it, its predecessors
//! exactly the statements that define it. Debug builds re-validate the whole
//! graph after each structural mutation.
//!
//! Statements live in a tombstoned arena (`StmtId` is a dense index, slots
//! are never reused), mirrored by a hash map for duplicate detection.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::features::fixpoint::domain::statement::{Statement, StmtId};
use crate::features::fixpoint::domain::variable::VarId;

#[derive(Debug, Clone)]
pub struct EquationGraph<O> {
    /// Statement arena; `None` marks a removed statement.
    slots: Vec<Option<Statement<O>>>,
    /// Structural-equality mirror of the arena, for duplicate rejection.
    dedup: FxHashMap<Statement<O>, StmtId>,
    /// Per-variable: statements with this variable on their right-hand side.
    uses: Vec<Vec<StmtId>>,
    /// Per-variable: statements with this variable as their left-hand side.
    defs: Vec<Vec<StmtId>>,
    live: usize,
}

impl<O> Default for EquationGraph<O> {
    fn default() -> Self {
        EquationGraph {
            slots: Vec::new(),
            dedup: FxHashMap::default(),
            uses: Vec::new(),
            defs: Vec::new(),
            live: 0,
        }
    }
}

impl<O: Clone + Eq + Hash> EquationGraph<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the graph aware of a variable handle so adjacency queries on it
    /// are valid before any statement mentions it.
    pub fn register_variable(&mut self, v: VarId) {
        if v.index() >= self.uses.len() {
            self.uses.resize_with(v.index() + 1, Vec::new);
            self.defs.resize_with(v.index() + 1, Vec::new);
        }
    }

    /// Number of registered variables
    pub fn variable_count(&self) -> usize {
        self.uses.len()
    }

    /// Number of live statements
    pub fn statement_count(&self) -> usize {
        self.live
    }

    /// Number of arena slots, including tombstones
    pub(crate) fn statement_slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, stmt: &Statement<O>) -> bool {
        self.dedup.contains_key(stmt)
    }

    /// Insert a statement and its incident edges. Returns `None` without
    /// mutation when a structurally equal statement is already present.
    pub fn add_statement(&mut self, stmt: Statement<O>) -> Option<StmtId> {
        if self.dedup.contains_key(&stmt) {
            return None;
        }
        let sid = StmtId::from_index(self.slots.len());
        if let Some(lhs) = stmt.lhs {
            self.register_variable(lhs);
            self.defs[lhs.index()].push(sid);
        }
        for &r in &stmt.rhs {
            self.register_variable(r);
            self.uses[r.index()].push(sid);
        }
        self.dedup.insert(stmt.clone(), sid);
        self.slots.push(Some(stmt));
        self.live += 1;
        if cfg!(debug_assertions) {
            self.check_integrity();
        }
        Some(sid)
    }

    /// Remove a statement and all its incident edges. Returns false when the
    /// statement was already removed (or never existed).
    pub fn remove_statement(&mut self, sid: StmtId) -> bool {
        let Some(slot) = self.slots.get_mut(sid.index()) else {
            return false;
        };
        let Some(stmt) = slot.take() else {
            return false;
        };
        self.dedup.remove(&stmt);
        if let Some(lhs) = stmt.lhs {
            self.defs[lhs.index()].retain(|&s| s != sid);
        }
        for &r in &stmt.rhs {
            self.uses[r.index()].retain(|&s| s != sid);
        }
        self.live -= 1;
        if cfg!(debug_assertions) {
            self.check_integrity();
        }
        true
    }

    pub fn statement(&self, sid: StmtId) -> Option<&Statement<O>> {
        self.slots.get(sid.index()).and_then(|s| s.as_ref())
    }

    /// Live statement handles, in insertion order
    pub fn statement_ids(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| StmtId::from_index(i))
    }

    /// Statements with `v` on their right-hand side (out-edges of `v`)
    pub fn statements_that_use(&self, v: VarId) -> &[StmtId] {
        debug_assert!(v.index() < self.uses.len(), "unregistered variable {v}");
        match self.uses.get(v.index()) {
            Some(list) => list.as_slice(),
            None => &[],
        }
    }

    /// Statements with `v` as their left-hand side (in-edges of `v`)
    pub fn statements_that_define(&self, v: VarId) -> &[StmtId] {
        debug_assert!(v.index() < self.defs.len(), "unregistered variable {v}");
        match self.defs.get(v.index()) {
            Some(list) => list.as_slice(),
            None => &[],
        }
    }

    /// Full integrity validation; panics on a broken invariant. Called after
    /// every structural mutation in debug builds.
    fn check_integrity(&self) {
        assert_eq!(self.dedup.len(), self.live, "dedup set out of sync");
        for (i, slot) in self.slots.iter().enumerate() {
            let sid = StmtId::from_index(i);
            let Some(stmt) = slot else { continue };
            assert_eq!(self.dedup.get(stmt), Some(&sid), "dedup entry missing for {sid}");
            if let Some(lhs) = stmt.lhs {
                assert_eq!(
                    self.defs[lhs.index()].iter().filter(|&&s| s == sid).count(),
                    1,
                    "def edge {sid} -> {lhs} missing or duplicated"
                );
            }
            for &r in &stmt.rhs {
                assert!(
                    self.uses[r.index()].contains(&sid),
                    "use edge {r} -> {sid} missing"
                );
            }
        }
        for (vi, list) in self.uses.iter().enumerate() {
            let v = VarId::from_index(vi);
            for &sid in list {
                let stmt = self.statement(sid);
                assert!(
                    stmt.is_some_and(|s| s.rhs.contains(&v)),
                    "stale use edge {v} -> {sid}"
                );
            }
        }
        for (vi, list) in self.defs.iter().enumerate() {
            let v = VarId::from_index(vi);
            for &sid in list {
                let stmt = self.statement(sid);
                assert!(
                    stmt.is_some_and(|s| s.lhs == Some(v)),
                    "stale def edge {sid} -> {v}"
                );
            }
        }
    }
}

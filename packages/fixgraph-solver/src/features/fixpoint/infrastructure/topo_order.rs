//! Topological ordering of the equation graph
//!
//! Tarjan's SCC algorithm over the bipartite variable/statement graph.
//! Tarjan completes components in reverse topological order, so reversing
//! the completion sequence yields an order in which every SCC precedes its
//! successors; cycles (legal in equation systems) collapse into one
//! component and are numbered consecutively. The DFS uses an explicit frame
//! stack since large analyses produce graphs with millions of nodes.
//!
//! # References
//! - Tarjan, R. "Depth-First Search and Linear Graph Algorithms" (1972)

use std::hash::Hash;

use crate::features::fixpoint::domain::statement::StmtId;
use crate::features::fixpoint::domain::variable::VarId;

use super::equation_graph::EquationGraph;

#[derive(Debug, Clone, Copy)]
pub(crate) enum TopoNode {
    Variable(VarId),
    Statement(StmtId),
}

/// All live graph nodes, ordered so that each SCC appears before the SCCs
/// it feeds into.
pub(crate) fn scc_topological_order<O: Clone + Eq + Hash>(
    graph: &EquationGraph<O>,
) -> Vec<TopoNode> {
    let nv = graph.variable_count();
    let ns = graph.statement_slot_count();
    let total = nv + ns;

    // Bipartite adjacency: variable -> statements using it, statement -> its
    // lhs variable. Statement slots are offset by the variable count.
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); total];
    let mut live = vec![false; total];
    for vi in 0..nv {
        live[vi] = true;
        adj[vi] = graph
            .statements_that_use(VarId::from_index(vi))
            .iter()
            .map(|s| nv + s.index())
            .collect();
    }
    for sid in graph.statement_ids() {
        let si = nv + sid.index();
        live[si] = true;
        if let Some(stmt) = graph.statement(sid) {
            if let Some(lhs) = stmt.lhs {
                adj[si].push(lhs.index());
            }
        }
    }

    const UNVISITED: u32 = u32::MAX;
    let mut index_of = vec![UNVISITED; total];
    let mut low = vec![0u32; total];
    let mut on_stack = vec![false; total];
    let mut stack: Vec<usize> = Vec::new();
    let mut sccs: Vec<Vec<usize>> = Vec::new();
    let mut next_index: u32 = 0;

    for root in 0..total {
        if !live[root] || index_of[root] != UNVISITED {
            continue;
        }
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        index_of[root] = next_index;
        low[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        loop {
            let Some(&mut (node, ref mut cursor)) = frames.last_mut() else {
                break;
            };
            if *cursor < adj[node].len() {
                let child = adj[node][*cursor];
                *cursor += 1;
                if index_of[child] == UNVISITED {
                    index_of[child] = next_index;
                    low[child] = next_index;
                    next_index += 1;
                    stack.push(child);
                    on_stack[child] = true;
                    frames.push((child, 0));
                } else if on_stack[child] {
                    low[node] = low[node].min(index_of[child]);
                }
            } else {
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    low[parent] = low[parent].min(low[node]);
                }
                if low[node] == index_of[node] {
                    let mut scc = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        scc.push(w);
                        if w == node {
                            break;
                        }
                    }
                    sccs.push(scc);
                }
            }
        }
    }

    let mut order = Vec::with_capacity(next_index as usize);
    for scc in sccs.iter().rev() {
        for &idx in scc {
            if idx < nv {
                order.push(TopoNode::Variable(VarId::from_index(idx)));
            } else {
                order.push(TopoNode::Statement(StmtId::from_index(idx - nv)));
            }
        }
    }
    order
}

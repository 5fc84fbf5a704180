//! Engine-level tests: the generic fixed-point solver driven directly with
//! the bit-vector operator family.

use fixgraph_solver::{
    BitVector, BitVectorOp, CancelToken, FixpointSolver, SolverError,
};

fn bv(bits: &[u32]) -> BitVector {
    BitVector::from_bits(bits.iter().copied())
}

fn solver() -> FixpointSolver<BitVector, BitVectorOp> {
    FixpointSolver::new()
}

#[test]
fn nullary_constant_is_fixed_and_removed() {
    let mut s = solver();
    let x = s.make_variable(BitVector::new());
    s.new_nullary_statement(x, BitVectorOp::constant(bv(&[3])), true)
        .expect("valid statement");

    assert!(s.solve(&CancelToken::new()).expect("no cancellation"));
    assert_eq!(*s.value(x), bv(&[3]));
    assert_eq!(s.graph().statement_count(), 0);
    assert_eq!(s.stats().statements_removed, 1);
}

#[test]
fn duplicate_statement_rejected_without_mutation() {
    let mut s = solver();
    let a = s.make_variable(BitVector::new());
    let b = s.make_variable(BitVector::new());

    assert!(s
        .new_general_statement(Some(b), BitVectorOp::Union, vec![a], true)
        .expect("valid statement"));
    assert!(!s
        .new_general_statement(Some(b), BitVectorOp::Union, vec![a], true)
        .expect("valid statement"));

    assert_eq!(s.graph().statement_count(), 1);
    assert_eq!(s.stats().statements_created, 1);
    // one graph edge each way, not two
    assert_eq!(s.graph().statements_that_use(a).len(), 1);
    assert_eq!(s.graph().statements_that_define(b).len(), 1);
}

#[test]
fn propagation_reaches_transitive_users() {
    let mut s = solver();
    let a = s.make_variable(BitVector::new());
    let b = s.make_variable(BitVector::new());
    let c = s.make_variable(BitVector::new());

    s.new_nullary_statement(a, BitVectorOp::constant(bv(&[1])), true)
        .expect("valid statement");
    s.new_general_statement(Some(b), BitVectorOp::Union, vec![a], true)
        .expect("valid statement");
    s.new_general_statement(Some(c), BitVectorOp::Union, vec![b], true)
        .expect("valid statement");

    assert!(s.solve(&CancelToken::new()).expect("no cancellation"));
    assert_eq!(*s.value(c), bv(&[1]));
}

#[test]
fn resolve_after_quiescence_changes_nothing() {
    let mut s = solver();
    let a = s.make_variable(BitVector::new());
    let b = s.make_variable(BitVector::new());
    s.new_nullary_statement(a, BitVectorOp::constant(bv(&[4])), true)
        .expect("valid statement");
    s.new_general_statement(Some(b), BitVectorOp::Union, vec![a], true)
        .expect("valid statement");

    assert!(s.solve(&CancelToken::new()).expect("no cancellation"));
    let snapshot = (s.value(a).clone(), s.value(b).clone());

    assert!(!s.solve(&CancelToken::new()).expect("no cancellation"));
    assert!(!s.solve(&CancelToken::new()).expect("no cancellation"));
    assert_eq!((s.value(a).clone(), s.value(b).clone()), snapshot);
}

#[test]
fn self_dependent_cycle_converges() {
    // x and y feed each other; a constant seeds the cycle
    let mut s = solver();
    let x = s.make_variable(BitVector::new());
    let y = s.make_variable(BitVector::new());
    s.new_general_statement(Some(y), BitVectorOp::Union, vec![x], true)
        .expect("valid statement");
    s.new_general_statement(Some(x), BitVectorOp::Union, vec![y], true)
        .expect("valid statement");
    s.new_nullary_statement(x, BitVectorOp::constant(bv(&[9])), true)
        .expect("valid statement");

    assert!(s.solve(&CancelToken::new()).expect("no cancellation"));
    assert_eq!(*s.value(x), bv(&[9]));
    assert_eq!(*s.value(y), bv(&[9]));
    assert!(s.empty_worklist());
}

#[test]
fn cancellation_is_distinct_and_resumable() {
    let mut s = solver();
    let x = s.make_variable(BitVector::new());
    s.new_nullary_statement(x, BitVectorOp::constant(bv(&[2])), true)
        .expect("valid statement");

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(s.solve(&cancel), Err(SolverError::Cancelled)));

    // nothing was evaluated; pending work survives
    assert!(!s.empty_worklist());
    assert!(s.value(x).is_empty());

    assert!(s.solve(&CancelToken::new()).expect("no cancellation"));
    assert_eq!(*s.value(x), bv(&[2]));
}

#[test]
fn arity_mismatch_is_an_invalid_argument() {
    let mut s = solver();
    let a = s.make_variable(BitVector::new());
    let b = s.make_variable(BitVector::new());

    let res = s.new_unary_statement(a, BitVectorOp::Identity, b, true);
    assert!(res.expect("one operand is the correct arity"));

    let res = s.new_general_statement(
        Some(a),
        BitVectorOp::constant(bv(&[1])),
        vec![b],
        true,
    );
    assert!(matches!(res, Err(SolverError::InvalidArgument(_))));
}

#[test]
fn reorder_numbers_follow_dependencies() {
    let mut s = solver();
    let a = s.make_variable(BitVector::new());
    let b = s.make_variable(BitVector::new());
    let c = s.make_variable(BitVector::new());

    // inserted against dependency order on purpose
    s.new_general_statement(Some(c), BitVectorOp::Union, vec![b], true)
        .expect("valid statement");
    s.new_general_statement(Some(b), BitVectorOp::Union, vec![a], true)
        .expect("valid statement");

    s.reorder_statements();
    let vars = s.variables();
    assert!(vars.order(a) < vars.order(b));
    assert!(vars.order(b) < vars.order(c));
}

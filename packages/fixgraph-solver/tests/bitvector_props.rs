//! Property-based tests for the bit-vector operator family
//!
//! Invariants that should hold for ALL inputs:
//! - Monotonicity: growing an operand never shrinks the result
//! - Union: operand order is irrelevant; folding pairwise agrees
//! - Kill-gen: idempotent on its own output

use fixgraph_solver::{BitVector, BitVectorOp, Operator};
use proptest::collection::vec;
use proptest::prelude::*;

fn bits() -> impl Strategy<Value = Vec<u32>> {
    vec(0u32..64, 0..16)
}

fn small_bits() -> impl Strategy<Value = Vec<u32>> {
    vec(0u32..64, 0..8)
}

/// rhs ⊆ rhs' (coordinate-wise) must give result ⊆ result' for a fixed lhs
/// seed.
fn assert_monotone_unary(
    op: &BitVectorOp,
    lhs: &BitVector,
    small: &BitVector,
    big: &BitVector,
) -> std::result::Result<(), TestCaseError> {
    let r1 = op.apply(lhs, &[small]);
    let r2 = op.apply(lhs, &[big]);
    prop_assert!(
        r1.is_subset_of(&r2),
        "{:?} not monotone: {} vs {}",
        op,
        r1,
        r2
    );
    Ok(())
}

proptest! {
    #[test]
    fn union_is_monotone(lhs in bits(), rhs in bits(), extra in small_bits()) {
        let lhs = BitVector::from_bits(lhs);
        let small = BitVector::from_bits(rhs);
        let big = small.union(&BitVector::from_bits(extra));
        assert_monotone_unary(&BitVectorOp::Union, &lhs, &small, &big)?;
    }

    #[test]
    fn identity_is_monotone(lhs in bits(), rhs in bits(), extra in small_bits()) {
        let lhs = BitVector::from_bits(lhs);
        let small = BitVector::from_bits(rhs);
        let big = small.union(&BitVector::from_bits(extra));
        assert_monotone_unary(&BitVectorOp::Identity, &lhs, &small, &big)?;
    }

    #[test]
    fn kill_gen_is_monotone(
        lhs in bits(),
        rhs in bits(),
        extra in small_bits(),
        kill in small_bits(),
        gen in small_bits(),
    ) {
        let op = BitVectorOp::kill_gen(
            BitVector::from_bits(kill),
            BitVector::from_bits(gen),
        );
        let lhs = BitVector::from_bits(lhs);
        let small = BitVector::from_bits(rhs);
        let big = small.union(&BitVector::from_bits(extra));
        assert_monotone_unary(&op, &lhs, &small, &big)?;
    }

    #[test]
    fn minus_vector_is_monotone(lhs in bits(), rhs in bits(), extra in small_bits(), v in small_bits()) {
        let op = BitVectorOp::minus_vector(BitVector::from_bits(v));
        let lhs = BitVector::from_bits(lhs);
        let small = BitVector::from_bits(rhs);
        let big = small.union(&BitVector::from_bits(extra));
        assert_monotone_unary(&op, &lhs, &small, &big)?;
    }

    #[test]
    fn union_vector_is_monotone(lhs in bits(), rhs in bits(), extra in small_bits(), v in small_bits()) {
        let op = BitVectorOp::union_vector(BitVector::from_bits(v));
        let lhs = BitVector::from_bits(lhs);
        let small = BitVector::from_bits(rhs);
        let big = small.union(&BitVector::from_bits(extra));
        assert_monotone_unary(&op, &lhs, &small, &big)?;
    }

    #[test]
    fn union_constant_is_monotone(lhs in bits(), rhs in bits(), extra in small_bits(), c in 0u32..64) {
        let op = BitVectorOp::UnionConstant(c);
        let lhs = BitVector::from_bits(lhs);
        let small = BitVector::from_bits(rhs);
        let big = small.union(&BitVector::from_bits(extra));
        assert_monotone_unary(&op, &lhs, &small, &big)?;
    }

    #[test]
    fn intersection_is_monotone(
        lhs in bits(),
        rhs1 in bits(),
        rhs2 in bits(),
        extra1 in small_bits(),
        extra2 in small_bits(),
    ) {
        let lhs = BitVector::from_bits(lhs);
        let a_small = BitVector::from_bits(rhs1);
        let b_small = BitVector::from_bits(rhs2);
        let a_big = a_small.union(&BitVector::from_bits(extra1));
        let b_big = b_small.union(&BitVector::from_bits(extra2));
        let r1 = BitVectorOp::Intersection.apply(&lhs, &[&a_small, &b_small]);
        let r2 = BitVectorOp::Intersection.apply(&lhs, &[&a_big, &b_big]);
        prop_assert!(r1.is_subset_of(&r2));
    }

    #[test]
    fn union_order_is_irrelevant(lhs in bits(), a in bits(), b in bits()) {
        let lhs = BitVector::from_bits(lhs);
        let a = BitVector::from_bits(a);
        let b = BitVector::from_bits(b);
        let forward = BitVectorOp::Union.apply(&lhs, &[&a, &b]);
        let backward = BitVectorOp::Union.apply(&lhs, &[&b, &a]);
        let folded = BitVectorOp::Union.apply(&BitVectorOp::Union.apply(&lhs, &[&a]), &[&b]);
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(&forward, &folded);
    }

    #[test]
    fn kill_gen_is_idempotent(input in bits(), kill in small_bits(), gen in small_bits()) {
        let op = BitVectorOp::kill_gen(
            BitVector::from_bits(kill),
            BitVector::from_bits(gen),
        );
        let input = BitVector::from_bits(input);
        let once = op.apply(&BitVector::new(), &[&input]);
        let twice = op.apply(&once, &[&once]);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn union_result_contains_every_operand(lhs in bits(), a in bits(), b in bits()) {
        let lhs = BitVector::from_bits(lhs);
        let a = BitVector::from_bits(a);
        let b = BitVector::from_bits(b);
        let result = BitVectorOp::Union.apply(&lhs, &[&a, &b]);
        prop_assert!(lhs.is_subset_of(&result));
        prop_assert!(a.is_subset_of(&result));
        prop_assert!(b.is_subset_of(&result));
    }
}

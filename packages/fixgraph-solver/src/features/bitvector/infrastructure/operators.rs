//! Bit-vector operator family
//!
//! One closed enum, dispatched by a single match inside `apply`. Set
//! semantics per operator:
//!
//! | operator           | result                           | shape   |
//! |--------------------|----------------------------------|---------|
//! | `Union`            | `lhs ∪ rhs₁ ∪ … ∪ rhsₙ`          | meet    |
//! | `Intersection`     | `rhs₁ ∩ … ∩ rhsₙ` (lhs seed)     | meet    |
//! | `Identity`         | `rhs`                            | unary   |
//! | `KillGen`          | `(rhs − kill) ∪ gen`             | unary   |
//! | `MinusVector`      | `rhs − v`                        | unary   |
//! | `UnionVector`      | `lhs ∪ rhs ∪ v`                  | unary   |
//! | `UnionConstant`    | `lhs ∪ rhs ∪ {c}`                | unary   |
//! | `Constant`         | `v`                              | nullary |
//!
//! The solver compares the result against the prior lhs value and commits
//! only on change, so every operator here is a pure producer. Constant
//! vectors are `Arc`-shared through the repository: transfer-function
//! providers routinely hand out the same kill/gen sets for thousands of
//! nodes.

use std::sync::Arc;

use crate::features::bitvector::domain::bitvector::BitVector;
use crate::features::bitvector::infrastructure::repository::BitVectorRepository;
use crate::features::fixpoint::domain::operator::{Operator, OperatorKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BitVectorOp {
    /// Meet: accumulate the union of all operands into the lhs
    Union,
    /// Meet: intersect all operands, seeded with the lhs when it is
    /// non-empty
    Intersection,
    /// Pass the operand through unchanged (short-circuited away by the
    /// equation builder)
    Identity,
    /// Classic kill/gen transfer
    KillGen {
        kill: Arc<BitVector>,
        gen: Arc<BitVector>,
    },
    /// Subtract a fixed vector
    MinusVector(Arc<BitVector>),
    /// Accumulate the operand and a fixed vector
    UnionVector(Arc<BitVector>),
    /// Accumulate the operand and one fixed bit
    UnionConstant(u32),
    /// Produce a fixed vector; the statement is removed after its first
    /// evaluation
    Constant(Arc<BitVector>),
}

impl BitVectorOp {
    pub fn kill_gen(kill: BitVector, gen: BitVector) -> Self {
        let repo = BitVectorRepository::global();
        BitVectorOp::KillGen {
            kill: repo.find_or_create_shared(&kill),
            gen: repo.find_or_create_shared(&gen),
        }
    }

    pub fn minus_vector(v: BitVector) -> Self {
        BitVectorOp::MinusVector(BitVectorRepository::global().find_or_create_shared(&v))
    }

    pub fn union_vector(v: BitVector) -> Self {
        BitVectorOp::UnionVector(BitVectorRepository::global().find_or_create_shared(&v))
    }

    pub fn constant(v: BitVector) -> Self {
        BitVectorOp::Constant(BitVectorRepository::global().find_or_create_shared(&v))
    }
}

impl Operator<BitVector> for BitVectorOp {
    fn kind(&self) -> OperatorKind {
        match self {
            BitVectorOp::Union | BitVectorOp::Intersection => OperatorKind::General,
            BitVectorOp::Constant(_) => OperatorKind::Nullary,
            BitVectorOp::Identity
            | BitVectorOp::KillGen { .. }
            | BitVectorOp::MinusVector(_)
            | BitVectorOp::UnionVector(_)
            | BitVectorOp::UnionConstant(_) => OperatorKind::Unary,
        }
    }

    fn is_identity(&self) -> bool {
        matches!(self, BitVectorOp::Identity)
    }

    fn is_unary_noop(&self) -> bool {
        // a union over exactly one operand (from bottom) is that operand
        matches!(self, BitVectorOp::Union)
    }

    fn apply(&self, lhs: &BitVector, rhs: &[&BitVector]) -> BitVector {
        // unary arity was checked when the statement was created
        match self {
            BitVectorOp::Union => {
                let mut acc = lhs.clone();
                for &r in rhs {
                    acc = acc.union(r);
                }
                acc
            }
            BitVectorOp::Intersection => {
                let Some((first, rest)) = rhs.split_first() else {
                    return lhs.clone();
                };
                let mut acc = (**first).clone();
                for &r in rest {
                    acc = acc.intersection(r);
                }
                if lhs.is_empty() {
                    acc
                } else {
                    lhs.intersection(&acc)
                }
            }
            BitVectorOp::Identity => rhs[0].clone(),
            BitVectorOp::KillGen { kill, gen } => rhs[0].difference(kill).union(gen),
            BitVectorOp::MinusVector(v) => rhs[0].difference(v),
            BitVectorOp::UnionVector(v) => lhs.union(rhs[0]).union(v),
            BitVectorOp::UnionConstant(c) => {
                let mut out = lhs.union(rhs[0]);
                out.set(*c);
                out
            }
            BitVectorOp::Constant(v) => (**v).clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv(bits: &[u32]) -> BitVector {
        BitVector::from_bits(bits.iter().copied())
    }

    #[test]
    fn union_accumulates_all_operands() {
        let lhs = bv(&[0]);
        let a = bv(&[1, 2]);
        let b = bv(&[2, 3]);
        let forward = BitVectorOp::Union.apply(&lhs, &[&a, &b]);
        let backward = BitVectorOp::Union.apply(&lhs, &[&b, &a]);
        assert_eq!(forward, bv(&[0, 1, 2, 3]));
        // operand order is irrelevant
        assert_eq!(forward, backward);
        // pairwise folding agrees
        let folded = BitVectorOp::Union.apply(&BitVectorOp::Union.apply(&lhs, &[&a]), &[&b]);
        assert_eq!(folded, forward);
    }

    #[test]
    fn union_with_no_operands_keeps_lhs() {
        let lhs = bv(&[4, 9]);
        assert_eq!(BitVectorOp::Union.apply(&lhs, &[]), lhs);
    }

    #[test]
    fn intersection_seeds_from_nonempty_lhs_only() {
        let a = bv(&[1, 2, 3]);
        let b = bv(&[2, 3, 4]);
        assert_eq!(
            BitVectorOp::Intersection.apply(&BitVector::new(), &[&a, &b]),
            bv(&[2, 3])
        );
        assert_eq!(
            BitVectorOp::Intersection.apply(&bv(&[3, 9]), &[&a, &b]),
            bv(&[3])
        );
    }

    #[test]
    fn kill_gen_kills_then_gens() {
        let op = BitVectorOp::kill_gen(bv(&[2]), bv(&[5]));
        let input = bv(&[1, 2, 3]);
        let output = op.apply(&BitVector::new(), &[&input]);
        assert_eq!(output, bv(&[1, 3, 5]));
        // idempotent on its own output
        assert_eq!(op.apply(&output, &[&output]), output);
    }

    #[test]
    fn minus_vector_subtracts() {
        let op = BitVectorOp::minus_vector(bv(&[1, 4]));
        assert_eq!(op.apply(&BitVector::new(), &[&bv(&[1, 2, 4, 8])]), bv(&[2, 8]));
    }

    #[test]
    fn union_vector_and_constant_accumulate() {
        let op = BitVectorOp::union_vector(bv(&[7]));
        assert_eq!(op.apply(&bv(&[1]), &[&bv(&[2])]), bv(&[1, 2, 7]));

        let op = BitVectorOp::UnionConstant(9);
        assert_eq!(op.apply(&bv(&[1]), &[&bv(&[2])]), bv(&[1, 2, 9]));
    }

    #[test]
    fn identity_passes_through() {
        let op = BitVectorOp::Identity;
        assert!(op.is_identity());
        assert_eq!(op.apply(&bv(&[9]), &[&bv(&[1, 2])]), bv(&[1, 2]));
    }

    #[test]
    fn shapes_and_flags() {
        assert_eq!(BitVectorOp::Union.kind(), OperatorKind::General);
        assert_eq!(BitVectorOp::Identity.kind(), OperatorKind::Unary);
        assert_eq!(
            BitVectorOp::constant(bv(&[1])).kind(),
            OperatorKind::Nullary
        );
        assert!(BitVectorOp::Union.is_unary_noop());
        assert!(!BitVectorOp::Intersection.is_unary_noop());
        assert!(BitVectorOp::constant(bv(&[1])).fixes_after_evaluation());
        assert!(!BitVectorOp::Union.fixes_after_evaluation());
    }

    #[test]
    fn equal_operators_compare_equal() {
        let a = BitVectorOp::kill_gen(bv(&[2]), bv(&[5]));
        let b = BitVectorOp::kill_gen(bv(&[2]), bv(&[5]));
        assert_eq!(a, b);
    }
}

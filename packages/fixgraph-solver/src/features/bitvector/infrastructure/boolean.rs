//! Degenerate one-bit lattice
//!
//! `bool` with `false` as bottom; union is logical or. Handy for
//! reachability-style problems where a whole bit-vector would be overkill.

use crate::features::fixpoint::domain::operator::{Operator, OperatorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Identity,
    Union,
}

impl Operator<bool> for BooleanOp {
    fn kind(&self) -> OperatorKind {
        match self {
            BooleanOp::Identity => OperatorKind::Unary,
            BooleanOp::Union => OperatorKind::General,
        }
    }

    fn is_identity(&self) -> bool {
        matches!(self, BooleanOp::Identity)
    }

    fn is_unary_noop(&self) -> bool {
        matches!(self, BooleanOp::Union)
    }

    fn apply(&self, lhs: &bool, rhs: &[&bool]) -> bool {
        match self {
            BooleanOp::Identity => *rhs[0],
            BooleanOp::Union => *lhs || rhs.iter().any(|&&b| b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_or() {
        assert!(BooleanOp::Union.apply(&false, &[&false, &true]));
        assert!(!BooleanOp::Union.apply(&false, &[&false, &false]));
        assert!(BooleanOp::Union.apply(&true, &[]));
    }

    #[test]
    fn identity_copies_operand() {
        assert!(BooleanOp::Identity.apply(&false, &[&true]));
        assert!(!BooleanOp::Identity.apply(&true, &[&false]));
    }
}

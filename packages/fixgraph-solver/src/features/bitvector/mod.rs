//! # Bit-Vector Lattice Family
//!
//! Concrete lattice over a finite universe of ordinal indices (e.g.
//! exception-type ids), used by most client analyses:
//! - **BitVector**: sorted sparse set of small integers
//! - **BitVectorOp**: union / intersection / identity / kill-gen /
//!   vector-difference / vector-and-constant-union operators, plus a nullary
//!   constant
//! - **BooleanOp**: the degenerate one-bit lattice
//! - **OrdinalDomain**: interning of client facts to dense bit indices
//! - **BitVectorRepository**: process-wide weak interning of near-duplicate
//!   sets (optional memory optimization)
//!
//! ## References
//! - Briggs & Torczon "An Efficient Representation for Sparse Sets" (1993)

pub mod domain;
pub mod infrastructure;

pub use domain::bitvector::BitVector;
pub use domain::ordinal::OrdinalDomain;
pub use infrastructure::boolean::BooleanOp;
pub use infrastructure::operators::BitVectorOp;
pub use infrastructure::repository::BitVectorRepository;

//! Error types for fixgraph-solver
//!
//! Provides unified error handling across the crate. The variants mirror the
//! failure taxonomy of the solver: client contract violations, internal
//! invariant breakage, cooperative cancellation, and queries for result
//! variables that were never materialized.

use thiserror::Error;

/// Main error type for solver operations
#[derive(Debug, Error)]
pub enum SolverError {
    /// Programmer error in the client: bad arity, missing left-hand side,
    /// malformed equation. Equation construction aborts entirely; a
    /// malformed equation set has no well-defined fixed point.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A solver invariant was broken (e.g. a scheduled statement is no
    /// longer in the equation graph).
    #[error("internal solver error: {0}")]
    Internal(String),

    /// The client requested an abort mid-solve. Not a failure: the equation
    /// graph and worklist remain valid and `solve()` may be called again.
    #[error("solve was cancelled")]
    Cancelled,

    /// Query for an OUT/edge variable that was never created because the
    /// transfer-function provider declared no such transfer functions.
    #[error("missing variable: {0}")]
    MissingVariable(String),
}

impl SolverError {
    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        SolverError::InvalidArgument(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        SolverError::Internal(msg.into())
    }

    /// Create a missing-variable error
    pub fn missing_variable(msg: impl Into<String>) -> Self {
        SolverError::MissingVariable(msg.into())
    }
}

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, SolverError>;

//! The error taxonomy shared across the core (§7). Every crate boundary
//! downstream of this one maps its own errors into one of these kinds so
//! the HTTP surface and the engine can apply one propagation policy each,
//! without knowing which subsystem produced the failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("bounds violation: {0}")]
    BoundsViolation(String),

    #[error("policy rejected: {0}")]
    PolicyRejected(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

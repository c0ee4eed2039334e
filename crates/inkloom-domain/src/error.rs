//! Domain-level error taxonomy.
//!
//! These are invariant violations raised while constructing or mutating
//! domain values — not transport, validation-rule, or state-machine
//! errors, which live closer to the components that produce them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{field} must be in [0,1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("director weights must sum to 1.0 (within tolerance), got {sum}")]
    WeightsDoNotSumToOne { sum: f32 },

    #[error("narrative context capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),
}

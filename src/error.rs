//! Typed errors for flow data sets.

use thiserror::Error;

/// A data-model invariant violated by a supplied flow set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowValidationError {
    #[error("flow at position {index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate flow id '{id}'")]
    DuplicateId { id: String },

    #[error("flow '{id}': success rate {value} is outside 0-100")]
    SuccessRateOutOfRange { id: String, value: f64 },

    #[error("flow '{id}': {field} must be a finite, non-negative number (got {value})")]
    InvalidNumber {
        id: String,
        field: &'static str,
        value: f64,
    },
}

//! Core error type.
//!
//! Downstream crates keep their own error enums and wrap `CoreError` through
//! a `#[from]` variant where they surface time validation failures.

use thiserror::Error;

/// Errors produced by `sig-core` validation helpers.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },
}

/// Shorthand result type for `sig-core`.
pub type CoreResult<T> = Result<T, CoreError>;

//! Network error type.

use thiserror::Error;

/// Errors produced by `sig-network`.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("traffic light {0:?} is already registered")]
    DuplicateLight(String),

    #[error("traffic light id may not be empty")]
    EmptyId,
}

pub type NetworkResult<T> = Result<T, NetworkError>;

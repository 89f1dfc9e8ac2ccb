//! # AppError
//!
//! Centralized error handling for the Rusty-Reader engine.
//! Callers only need to tell "invalid request", "unknown entity" and
//! "store failed" apart; an empty result is never an error.

use thiserror::Error;

/// The primary error type for all rr-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., an unknown reader id on the feed path)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., negative limit, `from` after `to`)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The content store failed; no partial result was produced.
    #[error("aggregation failed: {0}")]
    AggregationFailed(String),
}

impl AppError {
    /// Wraps a store failure, logging the full cause chain once at the boundary.
    pub fn aggregation(operation: &str, err: anyhow::Error) -> Self {
        log::error!("{operation}: content store failure: {err:#}");
        AppError::AggregationFailed(format!("{operation}: {err}"))
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::AggregationFailed(_))
    }
}

/// A specialized Result type for Rusty-Reader logic.
pub type Result<T> = std::result::Result<T, AppError>;

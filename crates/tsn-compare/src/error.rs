//! Comparison error types.

use thiserror::Error;
use tsn_southbound::SouthboundError;

/// Result type alias for comparison operations.
pub type CompareResult<T> = Result<T, CompareError>;

/// Job-level comparison failures.
///
/// Per-item drift never surfaces here; it is accumulated into
/// `CompareFindings`. These errors abort the job: a requested device that
/// does not exist, or a southbound query the comparison cannot proceed
/// without.
#[derive(Debug, Clone, Error)]
pub enum CompareError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error(transparent)]
    Southbound(#[from] SouthboundError),
}

impl CompareError {
    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        CompareError::NotFound { what: what.into() }
    }
}

//! Error types for risk computations.
//!
//! Degenerate metric inputs (empty series, zero variance) are not errors:
//! those resolve to `None`. The variants here cover data-shape failures of a
//! whole sub-analysis, which callers report as a scoped warning.

use thiserror::Error;

/// Result type for risk operations.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors that can occur during risk computation.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Missing required column in input data
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// No dates shared between the regressand and the regressors
    #[error("No overlapping data between portfolio and factors")]
    NoOverlap,

    /// Not enough observations to leave positive residual degrees of freedom
    #[error(
        "Insufficient degrees of freedom: {observations} observations for {regressors} regressors"
    )]
    InsufficientDegreesOfFreedom {
        /// Number of overlapping observations
        observations: usize,
        /// Number of regressors including the intercept
        regressors: usize,
    },

    /// Design matrix is rank deficient
    #[error("Singular matrix: regressors are collinear")]
    SingularMatrix,

    /// Malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

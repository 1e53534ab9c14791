//! Error types for newsrag-vector.

use thiserror::Error;

/// Result type for newsrag-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying an index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An index over zero vectors was requested.
    #[error("Cannot build an index over zero vectors")]
    EmptyInput,

    /// Dimension mismatch between a vector and the index.
    #[error("Dimension mismatch at position {position}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Position of the offending vector (0 for queries).
        position: usize,
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Invalid vector (e.g., zero-length, contains NaN or infinity).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),
}

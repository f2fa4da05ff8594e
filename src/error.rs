//! Error types for the relie library
//!
//! This module provides the main error and result types used throughout the library.
//! All errors use the `thiserror` crate for automatic trait implementations.
//!
//! Numerically degenerate inputs (rotation angles near 0 or π) are never errors: they are
//! handled by dedicated branches in the conversion kernels. Errors only report violated
//! preconditions of the batched APIs, such as mismatched batch lengths or data shapes.

use crate::wigner::WignerError;
use thiserror::Error;

/// Main result type used throughout the relie library
pub type RelieResult<T> = Result<T, RelieError>;

/// Main error type for the relie library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelieError {
    /// A tensor-like input did not have the expected shape
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Angles and data batches disagree in length
    #[error("Batch size mismatch: {angles} angle triples but {data} data blocks")]
    BatchSizeMismatch { angles: usize, data: usize },

    /// Wigner-D transform errors
    #[error("Wigner error: {0}")]
    Wigner(String),
}

impl From<WignerError> for RelieError {
    fn from(err: WignerError) -> Self {
        match err {
            WignerError::InvalidDataShape {
                index,
                expected_rows,
                actual_rows,
            } => RelieError::ShapeMismatch {
                expected: format!("{expected_rows} harmonic rows"),
                actual: format!("{actual_rows} rows in batch element {index}"),
            },
            other => RelieError::Wigner(other.to_string()),
        }
    }
}

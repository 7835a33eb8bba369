use thiserror::Error;

/// Errors produced by the edge detection pipeline.
///
/// Every variant is fatal: the pipeline is pure computation, there is nothing to retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A construction parameter is outside of its legal range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human readable description of the violated constraint.
        reason: String,
    },

    /// Two grids do not agree on their size, or a grid is too small for an operation.
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// The `(rows, cols)` the operation required.
        expected: (usize, usize),
        /// The `(rows, cols)` it was given.
        actual: (usize, usize),
    },

    /// A raw buffer does not hold `rows * cols` samples.
    #[error("buffer length mismatch: expected {expected} samples, got {actual}")]
    BufferLength {
        /// `rows * cols`
        expected: usize,
        /// Length of the buffer that was passed in.
        actual: usize,
    },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Error {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Shorthand for results carrying the pipeline [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

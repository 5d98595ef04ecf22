//! Error types for kernel operations

use thiserror::Error;

use crate::Backend;

/// Result type for kernel operations
pub type Result<T> = std::result::Result<T, KernelError>;

/// Errors that can occur during kernel operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KernelError {
    /// Backend not supported on this CPU
    #[error("Backend not supported on this platform: {0:?}")]
    UnsupportedBackend(Backend),

    /// Vector or matrix dimension is zero or too large to allocate
    #[error("Bad size: {0}")]
    BadSize(usize),

    /// Vector lengths differ
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Matrix shapes are incompatible for the requested operation
    #[error("Dimension mismatch: {}x{} vs {}x{}", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        /// Shape of the left operand (rows, cols)
        left: (usize, usize),
        /// Shape of the right operand (rows, cols)
        right: (usize, usize),
    },

    /// Aligned allocation failed
    #[error("Out of memory: failed to allocate {bytes} bytes")]
    OutOfMemory {
        /// Requested allocation size in bytes
        bytes: usize,
    },

    /// Checked element access outside the container
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Container length
        len: usize,
    },

    /// Operand has zero norm (e.g., projecting onto the zero vector)
    #[error("Empty vector")]
    EmptyVector,

    /// Computation was cancelled through a [`crate::CancellationToken`]
    #[error("Computation cancelled")]
    Cancelled,

    /// Computation ran past its configured timeout
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Worker pool could not be constructed
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

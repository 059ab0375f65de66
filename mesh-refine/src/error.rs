//! Error types for the mesh-refine crate.
//!
//! Most data-quality problems (degenerate faces, overrunning index arrays,
//! bad subset indices) are *recovered* by the kernels and only reported
//! through the [`log`] facade. The variants below are what surfaces when a
//! caller asks for a `Result`, e.g. when validating input up front or when
//! resolving a [`Computation`](crate::computation::Computation).
use thiserror::Error;

use crate::buffer::TupleType;

/// Main error type for mesh-refine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed face-vertex-count/index arrays.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// A geom subset references a face that does not exist.
    #[error("Geom subset index {index} is larger than number of faces ({face_count})")]
    OutOfRangeSubsetIndex { index: i32, face_count: usize },

    /// The same face is claimed by more than one geom subset.
    #[error("Face index {index} is repeated between geom subsets")]
    DuplicateSubsetIndex { index: i32 },

    /// A face-varying or chained-buffer computation got an element type it
    /// has no case for.
    #[error("Unsupported element type {tuple_type} for buffer '{name}'")]
    UnsupportedElementType { name: String, tuple_type: TupleType },

    /// Invalid buffer size.
    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// A computation result was requested before it was resolved.
    #[error("Computation '{0}' is not resolved")]
    NotResolved(String),

    /// A computation failed to resolve.
    #[error("Computation '{name}' failed: {reason}")]
    ComputationFailed { name: String, reason: String },

    /// The API was used in an order it does not support, e.g. asking for
    /// refined indices before the refinement was built.
    #[error("Coding error: {0}")]
    CodingError(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` for programmer-error class failures, as opposed to
    /// problems with the scene data.
    pub fn is_coding_error(&self) -> bool {
        matches!(self, Error::CodingError(_) | Error::NotResolved(_))
    }

    /// Log this error through the diagnostic channel matching its class.
    pub(crate) fn report(&self) {
        if self.is_coding_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }
    }
}

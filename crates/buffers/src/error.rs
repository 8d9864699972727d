//! Error types for buffer and cursor operations.

use thiserror::Error;

/// Error raised when the output buffer cannot acquire memory.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("allocation failure while growing output buffer")]
    AllocationFailure,
}

/// Latched error states of a [`crate::Cursor`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    /// The input ended before a header or payload could be fully read.
    #[error("missing bytes in input")]
    Eof,
    /// The leading tag byte matched no known pattern.
    #[error("bad data format in input")]
    BadFormat,
}

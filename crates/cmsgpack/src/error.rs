//! Codec error taxonomy.

use cmsgpack_buffers::{BufferError, CursorError};
use thiserror::Error;

/// Errors surfaced by [`crate::pack`] and [`crate::unpack`].
///
/// The three decode messages are stable API surface; callers pattern-match
/// on them across the host boundary.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before a header or payload could be fully read.
    #[error("missing bytes in input")]
    Eof,
    /// The leading tag byte matched no known tag or bitmask pattern.
    #[error("bad data format in input")]
    BadFormat,
    /// The root value decoded but input bytes remain; the wire format
    /// requires the input to be exactly one value.
    #[error("extra bytes in input")]
    TrailingData,
    /// The output buffer could not acquire memory.
    #[error("allocation failure while growing output buffer")]
    AllocationFailure,
}

impl From<CursorError> for CodecError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::Eof => CodecError::Eof,
            CursorError::BadFormat => CodecError::BadFormat,
        }
    }
}

impl From<BufferError> for CodecError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::AllocationFailure => CodecError::AllocationFailure,
        }
    }
}

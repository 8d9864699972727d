//! Byte-level primitives for the cmsgpack codec: a growable output buffer
//! with a pluggable allocation strategy, and a bounded read cursor with a
//! latched error state.

mod alloc;
mod buffer;
mod cursor;
mod error;

pub use alloc::{Allocator, Heap};
pub use buffer::GrowableBuffer;
pub use cursor::Cursor;
pub use error::{BufferError, CursorError};

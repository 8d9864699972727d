//! Classic MessagePack codec over a dynamic value tree.
//!
//! [`pack`] walks a [`Value`] tree and produces the compact MessagePack
//! byte form; [`unpack`] parses a byte slice back into an equivalent tree.
//! Only the classic tag set is spoken: no `str8`, `ext`, or timestamp
//! families, with `bin8/16/32` carried for opaque binary payloads
//! ([`Blob`]).
//!
//! Two behaviors are preserved for wire compatibility and worth knowing
//! about: containers nested deeper than [`MAX_NESTING`] encode as `nil`
//! rather than failing, and binary payloads of 2^32 - 1 bytes or more
//! silently degrade to `nil` (see [`wire::write_bin`]).
//!
//! ```
//! use cmsgpack::{pack, unpack, Value};
//!
//! let value = Value::Array(vec![Value::Int(1), Value::str("two")]);
//! let bytes = pack(&value)?;
//! assert_eq!(unpack(&bytes)?, value);
//! # Ok::<(), cmsgpack::CodecError>(())
//! ```

mod decoder;
mod encoder;
mod error;
mod value;
pub mod wire;

pub use cmsgpack_buffers::{Allocator, BufferError, Cursor, CursorError, GrowableBuffer, Heap};
pub use decoder::{read_value, unpack};
pub use encoder::{pack, pack_into, MAX_NESTING};
pub use error::CodecError;
pub use value::{Blob, ReleaseFn, Value};
